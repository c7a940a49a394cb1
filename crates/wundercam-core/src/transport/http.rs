// ── HTTP transport ──
//
// Adapts `wundercam_api::CameraClient` to the `Transport` seam. The
// camera has no batch write: a batch becomes one control command per
// parameter, and each command's outcome is reported separately.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use wundercam_api::{CameraClient, ControlData};

use super::{FetchedBytes, SetOutcome, Transport, TriggerAck};
use crate::config::CameraConfig;
use crate::error::CoreError;
use crate::registry::{ParamValue, Parameter};
use crate::resource::ResourceHandle;

/// [`Transport`] over the camera's CGI control endpoint and file server.
pub struct HttpTransport {
    client: CameraClient,
}

impl HttpTransport {
    pub fn new(config: &CameraConfig) -> Result<Self, CoreError> {
        let client = CameraClient::new(config.url.clone(), &config.transport())?;
        Ok(Self { client })
    }

    pub fn from_client(client: CameraClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CameraClient {
        &self.client
    }
}

fn lookup(data: &ControlData, parameter: Parameter) -> Option<&Value> {
    data.get(parameter.wire_name())
}

/// Errors the camera produced for this one command, as opposed to the
/// link going away.
fn is_command_failure(err: &wundercam_api::Error) -> bool {
    matches!(
        err,
        wundercam_api::Error::Http { .. } | wundercam_api::Error::Deserialization { .. }
    )
}

#[async_trait]
impl Transport for HttpTransport {
    /// Runs a full status sweep; prefer [`get_parameters`](Transport::get_parameters).
    async fn get_parameter(&self, parameter: Parameter) -> Result<Value, CoreError> {
        let status = self.client.read_status().await?;
        lookup(&status, parameter)
            .cloned()
            .ok_or_else(|| CoreError::UnexpectedResponse {
                subject: parameter.to_string(),
                message: "not reported by any status command".into(),
            })
    }

    async fn get_parameters(
        &self,
        parameters: &[Parameter],
    ) -> Result<BTreeMap<Parameter, Value>, CoreError> {
        let status = self.client.read_status().await?;
        Ok(parameters
            .iter()
            .filter_map(|&p| lookup(&status, p).map(|v| (p, v.clone())))
            .collect())
    }

    async fn set_parameters(
        &self,
        batch: &BTreeMap<Parameter, ParamValue>,
    ) -> Result<BTreeMap<Parameter, SetOutcome>, CoreError> {
        let entries: Vec<_> = batch.iter().collect();
        let mut outcomes = BTreeMap::new();
        let mut unconfirmed = Vec::new();

        for (position, &(&parameter, value)) in entries.iter().enumerate() {
            let spec = parameter.spec();
            let Some(write) = spec.write else {
                let reason = Some("parameter is read-only".to_owned());
                outcomes.insert(parameter, SetOutcome::Rejected { reason });
                continue;
            };

            let fields = [(write.field, spec.encode(value))];
            match self.client.command(write.command, &fields).await {
                Ok(ack) => {
                    let applied = lookup(&ack, parameter).or_else(|| ack.get(write.field));
                    if let Some(applied) = applied {
                        debug!(%parameter, %applied, "parameter applied");
                        outcomes.insert(parameter, SetOutcome::Applied(applied.clone()));
                    } else {
                        unconfirmed.push(parameter);
                    }
                }
                Err(err) if is_command_failure(&err) => {
                    warn!(%parameter, error = %err, "camera refused parameter");
                    let reason = Some(err.to_string());
                    outcomes.insert(parameter, SetOutcome::Rejected { reason });
                }
                Err(err) if outcomes.is_empty() && unconfirmed.is_empty() => {
                    return Err(err.into());
                }
                Err(err) => {
                    warn!(%parameter, error = %err, "link lost mid-batch");
                    let reason = format!("not sent: {err}");
                    for &(&remaining, _) in &entries[position..] {
                        outcomes.insert(
                            remaining,
                            SetOutcome::Rejected {
                                reason: Some(reason.clone()),
                            },
                        );
                    }
                    break;
                }
            }
        }

        if !unconfirmed.is_empty() {
            debug!(count = unconfirmed.len(), "reading back unconfirmed writes");
            match self.client.read_status().await {
                Ok(status) => {
                    for parameter in unconfirmed {
                        let outcome = match lookup(&status, parameter) {
                            Some(value) => SetOutcome::Applied(value.clone()),
                            None => SetOutcome::Rejected {
                                reason: Some("not reported after write".into()),
                            },
                        };
                        outcomes.insert(parameter, outcome);
                    }
                }
                Err(err) => {
                    let reason = format!("write unconfirmed: {err}");
                    for parameter in unconfirmed {
                        outcomes.insert(
                            parameter,
                            SetOutcome::Rejected {
                                reason: Some(reason.clone()),
                            },
                        );
                    }
                }
            }
        }

        Ok(outcomes)
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.client.list_directory(path).await?)
    }

    async fn fetch_bytes(&self, handle: &ResourceHandle) -> Result<FetchedBytes, CoreError> {
        let download = self.client.fetch(handle.as_str()).await?;
        Ok(FetchedBytes {
            content_type: download.content_type,
            bytes: download.bytes,
        })
    }

    async fn trigger(&self) -> Result<TriggerAck, CoreError> {
        let ack = self.client.trigger().await?;
        let error_code = ack.get("ErrorCode").and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        Ok(TriggerAck {
            accepted: error_code.is_none_or(|code| code == 0),
            error_code,
        })
    }
}
