// ── Core error types ──
//
// Every failure the core can report, discriminated by kind. Validation
// and parse errors are raised locally before any network traffic;
// transport errors carry the api-level error untouched.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::MediaKind;
use crate::registry::{ParamValue, Parameter};
use crate::state::CamState;

/// A batched change the camera did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedParameter {
    pub parameter: Parameter,
    pub requested: ParamValue,
    /// Why the camera refused, when it said so.
    pub reason: Option<String>,
}

impl fmt::Display for RejectedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.parameter, self.requested)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local errors (never touch the network) ───────────────────────
    #[error("Invalid value for {parameter}: {constraint}")]
    Validation {
        parameter: String,
        constraint: String,
    },

    #[error("Cannot parse {kind} filename '{filename}': {reason}")]
    Parse {
        filename: String,
        kind: MediaKind,
        reason: String,
    },

    #[error("Operation not supported: {operation} ({reason})")]
    NotSupported { operation: String, reason: String },

    #[error("Invalid filename scheme: {message}")]
    Scheme { message: String },

    // ── Device communication ─────────────────────────────────────────
    #[error("Camera communication failed: {0}")]
    Transport(#[from] wundercam_api::Error),

    #[error("Unexpected camera response for {subject}: {message}")]
    UnexpectedResponse { subject: String, message: String },

    #[error("Camera accepted only part of the batch; rejected: {}", format_rejected(.rejected))]
    PartialCommit {
        /// Live state reflecting every change the camera did apply.
        state: Box<CamState>,
        rejected: Vec<RejectedParameter>,
    },

    #[error("Camera refused to trigger (error code {code})")]
    TriggerRejected { code: i64 },

    #[error("SD card is not usable: {status}")]
    StorageUnavailable { status: String },

    // ── Local sinks ──────────────────────────────────────────────────
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub(crate) fn validation(parameter: Parameter, constraint: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Returns `true` if the failure came from talking to the camera.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UnexpectedResponse { .. })
    }

    /// Returns `true` for errors raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Parse { .. }
                | Self::NotSupported { .. }
                | Self::Scheme { .. }
        )
    }

    /// The parameters a partial commit failed to apply, if this is one.
    pub fn rejected_parameters(&self) -> &[RejectedParameter] {
        match self {
            Self::PartialCommit { rejected, .. } => rejected,
            _ => &[],
        }
    }
}

fn format_rejected(rejected: &[RejectedParameter]) -> String {
    rejected
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
