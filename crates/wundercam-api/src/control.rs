// Control endpoint
//
// Every hardware operation goes through `GET /fcgi_client.cgi?cmd=N`,
// optionally with command-specific fields as extra query parameters.
// The camera answers with a flat JSON object.

use tracing::{debug, trace};

use crate::client::{CameraClient, ControlData};
use crate::error::Error;

/// Path of the control script relative to the camera root.
pub const CONTROL_PATH: &str = "fcgi_client.cgi";

/// Known command numbers.
pub mod cmd {
    /// Storage / SD card status. Also the cheapest liveness probe.
    pub const STORAGE_STATUS: u16 = 3;
    /// Fire the shutter (or start/stop recording) in the current shoot mode.
    pub const TRIGGER: u16 = 24;

    pub const SET_SHOOT_MODE: u16 = 21;
    pub const SET_ISO: u16 = 25;
    pub const SET_WHITE_BALANCE: u16 = 26;
    pub const SET_EXPOSURE_COMPENSATION: u16 = 27;
    pub const SET_SETTING_MODE: u16 = 29;

    /// Read commands that together report every known parameter.
    pub const STATUS_SWEEP: [u16; 16] = [3, 37, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17];
}

impl CameraClient {
    /// Issue a control command.
    ///
    /// `GET /fcgi_client.cgi?cmd={command}&{field}={value}...`
    pub async fn command(
        &self,
        command: u16,
        fields: &[(&str, String)],
    ) -> Result<ControlData, Error> {
        let url = self.url(CONTROL_PATH)?;
        debug!(command, fields = fields.len(), "issuing control command");

        let mut query = Vec::with_capacity(fields.len() + 1);
        query.push(("cmd", command.to_string()));
        query.extend(fields.iter().map(|(k, v)| (*k, v.clone())));

        let resp = self.get(url, &query).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(command, body = %body, "control response");

        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::Deserialization {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
                body,
            }),
            Err(e) => {
                let preview: String = body.chars().take(200).collect();
                Err(Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                })
            }
        }
    }

    /// Read every status block and merge them into one object.
    ///
    /// Issues one request per entry of [`cmd::STATUS_SWEEP`]; later
    /// blocks override earlier ones on key collisions. Slow.
    pub async fn read_status(&self) -> Result<ControlData, Error> {
        let mut merged = ControlData::new();
        for command in cmd::STATUS_SWEEP {
            merged.extend(self.command(command, &[]).await?);
        }
        debug!(keys = merged.len(), "status sweep complete");
        Ok(merged)
    }

    /// Fire the camera in its current shoot mode.
    ///
    /// The resulting files are not reported here; list the media
    /// directories before and after to discover them.
    pub async fn trigger(&self) -> Result<ControlData, Error> {
        debug!("triggering capture");
        self.command(cmd::TRIGGER, &[]).await
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
