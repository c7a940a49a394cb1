// ── Camera state ──
//
// `CamState` is a value type: live values as last confirmed by the
// camera, plus an optional queue of staged edits. Mutating a live state
// switches it into edit mode; nothing reaches the device until the state
// is handed to `StateStore::commit`.

mod store;

pub use store::StateStore;

use std::collections::BTreeMap;

use strum::{Display, FromRepr, IntoStaticStr, VariantNames};

use crate::error::CoreError;
use crate::registry::{ParamValue, Parameter, ParameterRegistry};

/// Camera parameters, in live or edit mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CamState {
    values: BTreeMap<Parameter, ParamValue>,
    /// `None` in live mode; `Some` (possibly empty) in edit mode.
    pending: Option<BTreeMap<Parameter, ParamValue>>,
}

impl CamState {
    /// A live-mode state holding `values`.
    pub fn from_values(values: BTreeMap<Parameter, ParamValue>) -> Self {
        Self {
            values,
            pending: None,
        }
    }

    /// Same values, with an empty edit queue. Replaces any staged edits.
    pub fn begin_edit(mut self) -> Self {
        self.pending = Some(BTreeMap::new());
        self
    }

    /// Stage `parameter = value`.
    ///
    /// The value is checked against the parameter's domain first; on
    /// failure the state is left untouched. A live state enters edit mode.
    /// Staging the same parameter again overwrites the earlier value.
    pub fn set(
        &mut self,
        parameter: Parameter,
        value: impl Into<ParamValue>,
    ) -> Result<&mut Self, CoreError> {
        let value = parameter.spec().validate(&value.into())?;
        self.pending
            .get_or_insert_with(BTreeMap::new)
            .insert(parameter, value);
        Ok(self)
    }

    /// [`set`](Self::set) by device parameter name.
    pub fn set_by_name(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<&mut Self, CoreError> {
        let parameter = ParameterRegistry::lookup(name)?;
        self.set(parameter, value)
    }

    /// Drop staged edits and return to live mode.
    pub fn discard_edits(&mut self) {
        self.pending = None;
    }

    pub fn is_editing(&self) -> bool {
        self.pending.is_some()
    }

    /// Staged edits, if in edit mode.
    pub fn pending(&self) -> Option<&BTreeMap<Parameter, ParamValue>> {
        self.pending.as_ref()
    }

    /// The live value of `parameter`. Staged edits are not visible here.
    pub fn get(&self, parameter: Parameter) -> Option<&ParamValue> {
        self.values.get(&parameter)
    }

    /// The staged value if there is one, otherwise the live value.
    pub fn effective(&self, parameter: Parameter) -> Option<&ParamValue> {
        self.pending
            .as_ref()
            .and_then(|p| p.get(&parameter))
            .or_else(|| self.get(parameter))
    }

    pub fn values(&self) -> &BTreeMap<Parameter, ParamValue> {
        &self.values
    }

    pub(crate) fn take_pending(&mut self) -> Option<BTreeMap<Parameter, ParamValue>> {
        self.pending.take()
    }

    pub(crate) fn values_mut(&mut self) -> &mut BTreeMap<Parameter, ParamValue> {
        &mut self.values
    }

    fn int(&self, parameter: Parameter) -> Option<i64> {
        self.get(parameter).and_then(ParamValue::as_int)
    }

    fn text(&self, parameter: Parameter) -> Option<&str> {
        self.get(parameter).and_then(ParamValue::as_text)
    }

    // ── Typed accessors ──────────────────────────────────────────────

    pub fn shoot_mode(&self) -> Option<ShootMode> {
        self.int(Parameter::ShootMode).and_then(ShootMode::from_index)
    }

    pub fn set_shoot_mode(&mut self, mode: ShootMode) -> Result<&mut Self, CoreError> {
        self.set(Parameter::ShootMode, mode.index())
    }

    pub fn iso(&self) -> Option<Iso> {
        self.int(Parameter::Iso).and_then(Iso::from_index)
    }

    pub fn set_iso(&mut self, iso: Iso) -> Result<&mut Self, CoreError> {
        self.set(Parameter::Iso, iso.index())
    }

    pub fn white_balance(&self) -> Option<WhiteBalance> {
        self.int(Parameter::WhiteBalance)
            .and_then(WhiteBalance::from_index)
    }

    pub fn set_white_balance(&mut self, wb: WhiteBalance) -> Result<&mut Self, CoreError> {
        self.set(Parameter::WhiteBalance, wb.index())
    }

    /// Exposure compensation step, `0` meaning automatic.
    pub fn exposure_compensation(&self) -> Option<i64> {
        self.int(Parameter::ExposureCompensation)
    }

    pub fn set_exposure_compensation(&mut self, step: i64) -> Result<&mut Self, CoreError> {
        self.set(Parameter::ExposureCompensation, step)
    }

    /// `true` when ISO/white balance/exposure are under manual control.
    pub fn manual_mode(&self) -> Option<bool> {
        self.get(Parameter::SettingMode).and_then(ParamValue::as_bool)
    }

    pub fn set_manual_mode(&mut self, manual: bool) -> Result<&mut Self, CoreError> {
        self.set(Parameter::SettingMode, manual)
    }

    /// Battery level in the camera's 0..=6 scale.
    pub fn battery(&self) -> Option<i64> {
        self.int(Parameter::BatteryLevel)
    }

    pub fn sd_card_status(&self) -> Option<SdCardStatus> {
        self.int(Parameter::SdCardStatus)
            .and_then(SdCardStatus::from_index)
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.text(Parameter::SerialNumber)
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.text(Parameter::FirmwareVersion)
    }

    pub fn wifi_ssid(&self) -> Option<&str> {
        self.text(Parameter::WifiSsid)
    }

    pub fn remaining_shots(&self) -> Option<i64> {
        self.int(Parameter::RemainingShots)
    }

    pub fn remaining_video_minutes(&self) -> Option<i64> {
        self.int(Parameter::RemainingVideoMinutes)
    }
}

// ── Typed enum values ───────────────────────────────────────────────

/// Shared conversions for device option lists. Variant order is the
/// index the camera uses on the wire.
macro_rules! option_index {
    ($($name:ident),+ $(,)?) => {$(
        impl $name {
            /// Position in the device's option list.
            #[allow(clippy::as_conversions)]
            pub fn index(self) -> i64 {
                i64::from(self as u8)
            }

            pub fn from_index(index: i64) -> Option<Self> {
                u8::try_from(index).ok().and_then(Self::from_repr)
            }

            /// The label the camera's app shows for this option.
            pub fn label(self) -> &'static str {
                self.into()
            }
        }
    )+};
}

/// Capture mode fired by the shutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, IntoStaticStr, VariantNames)]
#[repr(u8)]
pub enum ShootMode {
    Photo,
    Video3K,
    Timer,
    Continuous,
    TimeLapse,
    Video60Fps,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, IntoStaticStr, VariantNames)]
#[repr(u8)]
pub enum Iso {
    Auto,
    #[strum(serialize = "100")]
    Iso100,
    #[strum(serialize = "200")]
    Iso200,
    #[strum(serialize = "400")]
    Iso400,
    #[strum(serialize = "800")]
    Iso800,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, IntoStaticStr, VariantNames)]
#[repr(u8)]
pub enum WhiteBalance {
    Auto,
    #[strum(serialize = "2856K")]
    K2856,
    #[strum(serialize = "4000K")]
    K4000,
    #[strum(serialize = "5500K")]
    K5500,
    #[strum(serialize = "6500K")]
    K6500,
}

/// SD card slot state. Capture and listing need `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, IntoStaticStr, VariantNames)]
#[repr(u8)]
pub enum SdCardStatus {
    Absent,
    Inserted,
    Ready,
}

option_index!(ShootMode, Iso, WhiteBalance, SdCardStatus);
