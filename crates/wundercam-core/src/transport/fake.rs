// In-memory camera used by unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Value, json};

use super::{FetchedBytes, SetOutcome, Transport, TriggerAck};
use crate::error::CoreError;
use crate::registry::{Domain, ParamValue, Parameter, ParameterRegistry};
use crate::resource::ResourceHandle;

#[derive(Default)]
pub(crate) struct FakeTransport {
    pub values: Mutex<BTreeMap<Parameter, Value>>,
    /// Writes to these parameters are refused.
    pub reject: Mutex<BTreeSet<Parameter>>,
    /// Writes to these parameters land on the given value instead.
    pub coerce: Mutex<BTreeMap<Parameter, Value>>,
    /// Reads of these parameters fail with a transport error.
    pub unreadable: Mutex<BTreeSet<Parameter>>,
    pub directories: Mutex<BTreeMap<String, Vec<String>>>,
    pub blobs: Mutex<BTreeMap<String, FetchedBytes>>,
    /// Files that appear (directory, name) when the shutter fires.
    pub on_trigger: Mutex<Vec<(String, String)>>,
    pub trigger_error: Mutex<Option<i64>>,
    pub batches: Mutex<Vec<BTreeMap<Parameter, ParamValue>>>,
    pub fetches: Mutex<Vec<String>>,
}

impl FakeTransport {
    /// A camera with a plausible value for every parameter and a ready SD card.
    pub fn ready() -> Self {
        let values = ParameterRegistry::all()
            .map(|p| {
                let value = match (p, p.spec().domain) {
                    (Parameter::SdCardStatus, _) => json!(2),
                    (Parameter::BatteryLevel, _) => json!(5),
                    (_, Domain::Text) => json!(format!("{p}-value")),
                    _ => json!(0),
                };
                (p, value)
            })
            .collect();
        Self {
            values: Mutex::new(values),
            ..Self::default()
        }
    }

    pub fn with_value(self, parameter: Parameter, value: Value) -> Self {
        self.values.lock().unwrap().insert(parameter, value);
        self
    }

    pub fn rejecting(self, parameter: Parameter) -> Self {
        self.reject.lock().unwrap().insert(parameter);
        self
    }

    pub fn coercing(self, parameter: Parameter, value: Value) -> Self {
        self.coerce.lock().unwrap().insert(parameter, value);
        self
    }

    pub fn with_files(self, directory: &str, names: &[&str]) -> Self {
        self.directories.lock().unwrap().insert(
            directory.to_owned(),
            names.iter().map(|n| (*n).to_owned()).collect(),
        );
        self
    }

    pub fn with_blob(self, path: &str, content_type: &str, bytes: &'static [u8]) -> Self {
        self.blobs.lock().unwrap().insert(
            path.to_owned(),
            FetchedBytes {
                content_type: Some(content_type.to_owned()),
                bytes: Bytes::from_static(bytes),
            },
        );
        self
    }

    pub fn producing(self, directory: &str, name: &str) -> Self {
        self.on_trigger
            .lock()
            .unwrap()
            .push((directory.to_owned(), name.to_owned()));
        self
    }

    pub fn batches(&self) -> Vec<BTreeMap<Parameter, ParamValue>> {
        self.batches.lock().unwrap().clone()
    }
}

fn wire(value: &ParamValue) -> Value {
    match value {
        ParamValue::Bool(b) => json!(u8::from(*b)),
        ParamValue::Int(n) => json!(n),
        ParamValue::Text(s) => json!(s),
    }
}

fn unreachable_camera() -> CoreError {
    CoreError::Transport(wundercam_api::Error::Http {
        status: 503,
        message: "camera unreachable".into(),
    })
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_parameter(&self, parameter: Parameter) -> Result<Value, CoreError> {
        if self.unreadable.lock().unwrap().contains(&parameter) {
            return Err(unreachable_camera());
        }
        self.values
            .lock()
            .unwrap()
            .get(&parameter)
            .cloned()
            .ok_or_else(|| CoreError::UnexpectedResponse {
                subject: parameter.to_string(),
                message: "not reported".into(),
            })
    }

    async fn set_parameters(
        &self,
        batch: &BTreeMap<Parameter, ParamValue>,
    ) -> Result<BTreeMap<Parameter, SetOutcome>, CoreError> {
        self.batches.lock().unwrap().push(batch.clone());
        let reject = self.reject.lock().unwrap();
        let coerce = self.coerce.lock().unwrap();
        let mut values = self.values.lock().unwrap();

        Ok(batch
            .iter()
            .map(|(&parameter, value)| {
                if reject.contains(&parameter) {
                    let reason = Some("refused by camera".to_owned());
                    return (parameter, SetOutcome::Rejected { reason });
                }
                let applied = coerce.get(&parameter).cloned().unwrap_or_else(|| wire(value));
                values.insert(parameter, applied.clone());
                (parameter, SetOutcome::Applied(applied))
            })
            .collect())
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<String>, CoreError> {
        Ok(self
            .directories
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_bytes(&self, handle: &ResourceHandle) -> Result<FetchedBytes, CoreError> {
        self.fetches.lock().unwrap().push(handle.as_str().to_owned());
        self.blobs
            .lock()
            .unwrap()
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| {
                CoreError::Transport(wundercam_api::Error::Http {
                    status: 404,
                    message: "Not Found".into(),
                })
            })
    }

    async fn trigger(&self) -> Result<TriggerAck, CoreError> {
        if let Some(code) = *self.trigger_error.lock().unwrap() {
            return Ok(TriggerAck {
                accepted: false,
                error_code: Some(code),
            });
        }
        let produced = std::mem::take(&mut *self.on_trigger.lock().unwrap());
        let mut directories = self.directories.lock().unwrap();
        for (directory, name) in produced {
            directories.entry(directory).or_default().push(name);
        }
        Ok(TriggerAck {
            accepted: true,
            error_code: Some(0),
        })
    }
}
