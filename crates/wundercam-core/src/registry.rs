// ── Parameter registry ──
//
// Static catalogue of every value the camera reports: its device name,
// value domain, and (for writable parameters) the control command and
// query field used to change it. Validation and wire encoding live here
// and nowhere else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};
use wundercam_api::control::cmd;

use crate::error::CoreError;
use crate::state::{Iso, SdCardStatus, ShootMode, WhiteBalance};

// ── Parameter ───────────────────────────────────────────────────────

/// Every parameter the camera reports.
///
/// `Display` and `FromStr` use the device's own key names (including its
/// misspellings, e.g. `BatteryGird`). Parsing is case-insensitive so
/// `"iso"` resolves to [`Parameter::Iso`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Parameter {
    #[strum(serialize = "CurPvSMStatus")]
    PreviewStatus,
    #[strum(serialize = "CurHpSMStatus")]
    HpStatus,
    #[strum(serialize = "CurWpSMStatus")]
    WpStatus,
    #[strum(serialize = "BatteryGird")]
    BatteryLevel,
    #[strum(serialize = "ShootMode")]
    ShootMode,
    #[strum(serialize = "SettingMode")]
    SettingMode,
    #[strum(serialize = "ChargeFlag")]
    Charging,
    #[strum(serialize = "HDMIonnectFlag")]
    HdmiConnected,
    #[strum(serialize = "SdcardplugFlag")]
    SdCardStatus,
    #[strum(serialize = "ErrorCode")]
    ErrorCode,
    #[strum(serialize = "bSupport30p")]
    Supports30p,
    #[strum(serialize = "PhotoDelay")]
    PhotoDelay,
    #[strum(serialize = "PhotoNumber")]
    PhotoNumber,
    #[strum(serialize = "PhotoTime")]
    PhotoTime,
    #[strum(serialize = "VideoFrameRate")]
    VideoFrameRate,
    #[strum(serialize = "VideoFrameInterval")]
    VideoFrameInterval,
    #[strum(serialize = "LoopVideoTime")]
    LoopVideoTime,
    #[strum(serialize = "SerialNumber")]
    SerialNumber,
    #[strum(serialize = "ProductModel")]
    ProductModel,
    #[strum(serialize = "FirmwareSoftwareVersion")]
    FirmwareVersion,
    #[strum(serialize = "ISO")]
    Iso,
    #[strum(serialize = "WhiteBalanceMode")]
    WhiteBalance,
    #[strum(serialize = "ExposureCompensation")]
    ExposureCompensation,
    #[strum(serialize = "SceneMode")]
    SceneMode,
    #[strum(serialize = "capacity")]
    Capacity,
    #[strum(serialize = "remainTime")]
    RemainingVideoMinutes,
    #[strum(serialize = "remainNum")]
    RemainingShots,
    #[strum(serialize = "Mute")]
    Mute,
    #[strum(serialize = "AutoShutDown")]
    AutoShutdownMinutes,
    #[strum(serialize = "WifiPass")]
    WifiPassword,
    #[strum(serialize = "WifiSSID")]
    WifiSsid,
}

impl Parameter {
    /// The key the camera uses for this parameter in its JSON.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    /// Registry entry for this parameter.
    pub fn spec(self) -> ParameterSpec {
        ParameterRegistry::spec(self)
    }

    pub fn is_writable(self) -> bool {
        self.spec().write.is_some()
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// A typed scalar parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ── Domains ─────────────────────────────────────────────────────────

/// The set of values a parameter may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Integer index into a list of labelled options.
    Enum(&'static [&'static str]),
    /// Inclusive integer range.
    Range { min: i64, max: i64 },
    /// Encoded as `0`/`1` on the wire.
    Boolean,
    /// Free text. Only used for read-only informational values.
    Text,
}

impl Domain {
    /// Check `value` against the domain, returning its canonical form.
    ///
    /// Enum labels are accepted in place of their index, and `0`/`1` in
    /// place of booleans.
    pub fn normalize(&self, value: &ParamValue) -> Result<ParamValue, String> {
        match (self, value) {
            (Self::Enum(labels), ParamValue::Int(n)) => {
                if usize::try_from(*n).is_ok_and(|i| i < labels.len()) {
                    Ok(ParamValue::Int(*n))
                } else {
                    Err(self.describe())
                }
            }
            (Self::Enum(labels), ParamValue::Text(label)) => labels
                .iter()
                .position(|l| l.eq_ignore_ascii_case(label))
                .and_then(|i| i64::try_from(i).ok())
                .map(ParamValue::Int)
                .ok_or_else(|| self.describe()),
            (Self::Range { min, max }, ParamValue::Int(n)) if (*min..=*max).contains(n) => {
                Ok(ParamValue::Int(*n))
            }
            (Self::Boolean, ParamValue::Bool(b)) => Ok(ParamValue::Bool(*b)),
            (Self::Boolean, ParamValue::Int(0)) => Ok(ParamValue::Bool(false)),
            (Self::Boolean, ParamValue::Int(1)) => Ok(ParamValue::Bool(true)),
            (Self::Text, ParamValue::Text(s)) => Ok(ParamValue::Text(s.clone())),
            _ => Err(self.describe()),
        }
    }

    /// Human-readable description of the constraint.
    pub fn describe(&self) -> String {
        match self {
            Self::Enum(labels) => format!(
                "must be one of 0..={} ({})",
                labels.len().saturating_sub(1),
                labels.join(", ")
            ),
            Self::Range { min, max } => format!("must be within {min}..={max}"),
            Self::Boolean => "must be a boolean (0 or 1)".into(),
            Self::Text => "must be text".into(),
        }
    }

    /// Decode a value as reported by the camera.
    ///
    /// Only the type is checked; the camera is authoritative about the
    /// values it reports, even outside the documented domain.
    pub fn decode(&self, wire: &serde_json::Value) -> Result<ParamValue, String> {
        use serde_json::Value;

        match (self, wire) {
            (Self::Boolean, Value::Bool(b)) => Ok(ParamValue::Bool(*b)),
            (Self::Boolean, Value::Number(n)) => n
                .as_i64()
                .map(|flag| ParamValue::Bool(flag != 0))
                .ok_or_else(|| format!("expected an integer flag, got {n}")),
            (Self::Boolean, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(|flag| ParamValue::Bool(flag != 0))
                .map_err(|_| format!("expected an integer flag, got {s:?}")),
            (Self::Enum(_) | Self::Range { .. }, Value::Number(n)) => n
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| format!("expected an integer, got {n}")),
            (Self::Enum(_) | Self::Range { .. }, Value::String(s)) => s
                .trim()
                .parse()
                .map(ParamValue::Int)
                .map_err(|_| format!("expected an integer, got {s:?}")),
            (Self::Text, Value::String(s)) => Ok(ParamValue::Text(s.clone())),
            (Self::Text, Value::Number(n)) => Ok(ParamValue::Text(n.to_string())),
            (_, other) => Err(format!("unexpected JSON value {other}")),
        }
    }

    /// Encode a (normalized) value as a query-string field.
    pub fn encode(&self, value: &ParamValue) -> String {
        match value {
            ParamValue::Bool(b) => if *b { "1" } else { "0" }.to_owned(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

pub const SHOOT_MODES: &[&str] = ShootMode::VARIANTS;
pub const ISO_PRESETS: &[&str] = Iso::VARIANTS;
pub const WHITE_BALANCE_PRESETS: &[&str] = WhiteBalance::VARIANTS;
pub const SD_CARD_STATES: &[&str] = SdCardStatus::VARIANTS;

const COUNTER: Domain = Domain::Range {
    min: 0,
    max: i64::MAX,
};

// ── Specs ───────────────────────────────────────────────────────────

/// How a writable parameter is changed on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCommand {
    pub command: u16,
    /// Query field carrying the new value.
    pub field: &'static str,
}

/// Registry entry for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub parameter: Parameter,
    pub domain: Domain,
    /// `None` for read-only parameters.
    pub write: Option<WriteCommand>,
}

impl ParameterSpec {
    /// Validate a requested value, returning its canonical form.
    pub fn validate(&self, value: &ParamValue) -> Result<ParamValue, CoreError> {
        if self.write.is_none() {
            return Err(CoreError::validation(self.parameter, "parameter is read-only"));
        }
        self.domain
            .normalize(value)
            .map_err(|constraint| CoreError::validation(self.parameter, constraint))
    }

    pub fn decode(&self, wire: &serde_json::Value) -> Result<ParamValue, String> {
        self.domain.decode(wire)
    }

    pub fn encode(&self, value: &ParamValue) -> String {
        self.domain.encode(value)
    }
}

/// Lookup facade over the static parameter catalogue.
pub struct ParameterRegistry;

impl ParameterRegistry {
    /// Resolve a parameter by device name (case-insensitive).
    pub fn lookup(name: &str) -> Result<Parameter, CoreError> {
        Parameter::from_str(name).map_err(|_| CoreError::Validation {
            parameter: name.to_owned(),
            constraint: "unknown parameter".into(),
        })
    }

    /// All parameters, in declaration order.
    pub fn all() -> impl Iterator<Item = Parameter> {
        Parameter::iter()
    }

    /// Only the parameters that can be changed.
    pub fn writable() -> impl Iterator<Item = Parameter> {
        Parameter::iter().filter(|p| p.is_writable())
    }

    pub fn spec(parameter: Parameter) -> ParameterSpec {
        let (domain, write) = match parameter {
            Parameter::ShootMode => (
                Domain::Enum(SHOOT_MODES),
                Some(WriteCommand {
                    command: cmd::SET_SHOOT_MODE,
                    field: "ModeType",
                }),
            ),
            Parameter::SettingMode => (
                Domain::Boolean,
                Some(WriteCommand {
                    command: cmd::SET_SETTING_MODE,
                    field: "SettingMode",
                }),
            ),
            Parameter::Iso => (
                Domain::Enum(ISO_PRESETS),
                Some(WriteCommand {
                    command: cmd::SET_ISO,
                    field: "ISO",
                }),
            ),
            Parameter::WhiteBalance => (
                Domain::Enum(WHITE_BALANCE_PRESETS),
                Some(WriteCommand {
                    command: cmd::SET_WHITE_BALANCE,
                    field: "WhiteBalanceMode",
                }),
            ),
            Parameter::ExposureCompensation => (
                Domain::Range { min: 0, max: 13 },
                Some(WriteCommand {
                    command: cmd::SET_EXPOSURE_COMPENSATION,
                    field: "ExposureCompensation",
                }),
            ),
            Parameter::BatteryLevel => (Domain::Range { min: 0, max: 6 }, None),
            Parameter::SdCardStatus => (Domain::Enum(SD_CARD_STATES), None),
            Parameter::Charging
            | Parameter::HdmiConnected
            | Parameter::Supports30p
            | Parameter::Mute => (Domain::Boolean, None),
            Parameter::SerialNumber
            | Parameter::ProductModel
            | Parameter::FirmwareVersion
            | Parameter::WifiPassword
            | Parameter::WifiSsid => (Domain::Text, None),
            Parameter::PreviewStatus
            | Parameter::HpStatus
            | Parameter::WpStatus
            | Parameter::ErrorCode
            | Parameter::PhotoDelay
            | Parameter::PhotoNumber
            | Parameter::PhotoTime
            | Parameter::VideoFrameRate
            | Parameter::VideoFrameInterval
            | Parameter::LoopVideoTime
            | Parameter::SceneMode
            | Parameter::Capacity
            | Parameter::RemainingVideoMinutes
            | Parameter::RemainingShots
            | Parameter::AutoShutdownMinutes => (COUNTER, None),
        };
        ParameterSpec {
            parameter,
            domain,
            write,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn catalogue_covers_every_device_key() {
        assert_eq!(ParameterRegistry::all().count(), 31);
        assert_eq!(ParameterRegistry::writable().count(), 5);
    }

    #[test]
    fn lookup_is_case_insensitive_on_device_names() {
        assert_eq!(ParameterRegistry::lookup("ISO").unwrap(), Parameter::Iso);
        assert_eq!(ParameterRegistry::lookup("iso").unwrap(), Parameter::Iso);
        assert_eq!(
            ParameterRegistry::lookup("BatteryGird").unwrap(),
            Parameter::BatteryLevel
        );
        assert!(matches!(
            ParameterRegistry::lookup("Zoom"),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn wire_names_round_trip() {
        for p in ParameterRegistry::all() {
            assert_eq!(ParameterRegistry::lookup(p.wire_name()).unwrap(), p);
        }
    }

    #[test]
    fn enum_accepts_index_or_label() {
        let spec = Parameter::Iso.spec();
        assert_eq!(spec.validate(&3.into()).unwrap(), ParamValue::Int(3));
        assert_eq!(spec.validate(&"400".into()).unwrap(), ParamValue::Int(3));
        assert_eq!(spec.validate(&"auto".into()).unwrap(), ParamValue::Int(0));
        assert!(spec.validate(&5.into()).is_err());
        assert!(spec.validate(&(-1).into()).is_err());
    }

    #[test]
    fn boolean_accepts_zero_and_one() {
        let spec = Parameter::SettingMode.spec();
        assert_eq!(spec.validate(&1.into()).unwrap(), ParamValue::Bool(true));
        assert_eq!(spec.validate(&false.into()).unwrap(), ParamValue::Bool(false));
        assert!(spec.validate(&2.into()).is_err());
        assert_eq!(spec.encode(&ParamValue::Bool(true)), "1");
    }

    #[test]
    fn read_only_parameters_reject_writes() {
        let err = Parameter::BatteryLevel.spec().validate(&3.into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for BatteryGird: parameter is read-only"
        );
    }

    #[test]
    fn validation_error_names_constraint() {
        let err = Parameter::ExposureCompensation
            .spec()
            .validate(&14.into())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for ExposureCompensation: must be within 0..=13"
        );
    }

    #[test]
    fn decode_is_type_checked_only() {
        let battery = Parameter::BatteryLevel.spec();
        assert_eq!(battery.decode(&json!(9)).unwrap(), ParamValue::Int(9));
        assert_eq!(battery.decode(&json!("4")).unwrap(), ParamValue::Int(4));
        assert!(battery.decode(&json!("full")).is_err());

        let serial = Parameter::SerialNumber.spec();
        assert_eq!(
            serial.decode(&json!("S1A0042")).unwrap(),
            ParamValue::Text("S1A0042".into())
        );

        let charging = Parameter::Charging.spec();
        assert_eq!(charging.decode(&json!(0)).unwrap(), ParamValue::Bool(false));
        assert_eq!(charging.decode(&json!(2)).unwrap(), ParamValue::Bool(true));
        assert_eq!(charging.decode(&json!("1")).unwrap(), ParamValue::Bool(true));
        assert!(charging.decode(&json!(null)).is_err());
    }
}
