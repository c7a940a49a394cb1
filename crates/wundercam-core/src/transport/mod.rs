// ── Transport seam ──
//
// Everything the core needs from the device, expressed per parameter
// and per file. `HttpTransport` speaks the camera's real protocol;
// tests substitute an in-memory fake.

mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpTransport;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CoreError;
use crate::registry::{ParamValue, Parameter};
use crate::resource::ResourceHandle;

/// Per-parameter result of a batched write.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    /// The camera accepted the change and reports this value.
    Applied(serde_json::Value),
    /// The camera refused the change.
    Rejected { reason: Option<String> },
}

/// A downloaded file.
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Acknowledgement of a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerAck {
    pub accepted: bool,
    /// Device error code, when one was reported.
    pub error_code: Option<i64>,
}

/// Wire exchange with one camera.
///
/// Implementations never retry; timeouts and connection failures are
/// reported as `CoreError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read one parameter as the raw JSON value the device reports.
    async fn get_parameter(&self, parameter: Parameter) -> Result<serde_json::Value, CoreError>;

    /// Read several parameters. Parameters the device did not report are
    /// absent from the result.
    async fn get_parameters(
        &self,
        parameters: &[Parameter],
    ) -> Result<BTreeMap<Parameter, serde_json::Value>, CoreError> {
        let mut values = BTreeMap::new();
        for &parameter in parameters {
            values.insert(parameter, self.get_parameter(parameter).await?);
        }
        Ok(values)
    }

    /// Apply a batch of already-validated values, reporting an outcome
    /// for every parameter in the batch.
    async fn set_parameters(
        &self,
        batch: &BTreeMap<Parameter, ParamValue>,
    ) -> Result<BTreeMap<Parameter, SetOutcome>, CoreError>;

    /// File names in a directory relative to the camera root.
    async fn list_directory(&self, path: &str) -> Result<Vec<String>, CoreError>;

    async fn fetch_bytes(&self, handle: &ResourceHandle) -> Result<FetchedBytes, CoreError>;

    /// Fire the capture action. The resulting files are only discoverable
    /// through a later listing.
    async fn trigger(&self) -> Result<TriggerAck, CoreError>;
}
