// ── State store ──
//
// Reads the full parameter set and reconciles committed batches with
// what the camera acknowledges. The resulting live values always come
// from the device, never from the request.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::CamState;
use crate::error::{CoreError, RejectedParameter};
use crate::registry::{Parameter, ParameterRegistry};
use crate::transport::{SetOutcome, Transport};

/// Reads and commits [`CamState`] through a [`Transport`].
#[derive(Clone)]
pub struct StateStore {
    transport: Arc<dyn Transport>,
}

impl StateStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch every parameter and return a live-mode state.
    ///
    /// Fails if any parameter cannot be read or decoded; no partial
    /// state is returned.
    pub async fn read(&self) -> Result<CamState, CoreError> {
        let parameters: Vec<Parameter> = ParameterRegistry::all().collect();
        let mut raw = self.transport.get_parameters(&parameters).await?;

        let mut values = BTreeMap::new();
        for parameter in parameters {
            let wire = raw
                .remove(&parameter)
                .ok_or_else(|| CoreError::UnexpectedResponse {
                    subject: parameter.to_string(),
                    message: "not reported by the camera".into(),
                })?;
            let value = parameter.spec().decode(&wire).map_err(|message| {
                CoreError::UnexpectedResponse {
                    subject: parameter.to_string(),
                    message,
                }
            })?;
            values.insert(parameter, value);
        }

        debug!(parameters = values.len(), "camera state read");
        Ok(CamState::from_values(values))
    }

    /// Send staged edits to the camera as one batch.
    ///
    /// With no staged edits this returns `state` unchanged without
    /// contacting the camera. Otherwise the returned state is in live
    /// mode and holds the values the camera acknowledged. If some changes
    /// were refused the result is `CoreError::PartialCommit`, carrying a
    /// state with the applied values and the prior values of the refused
    /// parameters.
    pub async fn commit(&self, state: &CamState) -> Result<CamState, CoreError> {
        let mut next = state.clone();
        let pending = match next.take_pending() {
            Some(pending) if !pending.is_empty() => pending,
            _ => return Ok(state.clone()),
        };

        debug!(batch = pending.len(), "committing parameter batch");
        let mut outcomes = self.transport.set_parameters(&pending).await?;

        let mut rejected = Vec::new();
        for (parameter, requested) in pending {
            let reason = match outcomes.remove(&parameter) {
                Some(SetOutcome::Applied(wire)) => match parameter.spec().decode(&wire) {
                    Ok(value) => {
                        if value != requested {
                            debug!(
                                %parameter,
                                %requested,
                                reported = %value,
                                "camera coerced value"
                            );
                        }
                        next.values_mut().insert(parameter, value);
                        continue;
                    }
                    Err(message) => Some(format!("unreadable acknowledgement: {message}")),
                },
                Some(SetOutcome::Rejected { reason }) => reason,
                None => Some("no acknowledgement".into()),
            };
            rejected.push(RejectedParameter {
                parameter,
                requested,
                reason,
            });
        }

        if rejected.is_empty() {
            info!("parameter batch applied");
            Ok(next)
        } else {
            warn!(rejected = rejected.len(), "camera refused part of the batch");
            Err(CoreError::PartialCommit {
                state: Box::new(next),
                rejected,
            })
        }
    }
}
