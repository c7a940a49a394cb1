// ── Runtime connection configuration ──
//
// Describes how to reach one camera and how the session behaves.
// Callers (or `wundercam-config`) build a `CameraConfig` and hand it in;
// core never reads config files.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use url::Url;
use wundercam_api::TransportConfig;
use wundercam_api::transport::DEFAULT_TIMEOUT;

use crate::metadata::SchemeSpec;

/// Address of the camera on its own access point.
pub const DEFAULT_CAMERA_URL: &str = "http://192.168.100.1";

static DEFAULT_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_CAMERA_URL).expect("default camera URL is valid"));

/// Pause between firing the shutter and listing the card again.
pub const DEFAULT_CAPTURE_SETTLE: Duration = Duration::from_secs(1);

/// Configuration for a session with a single camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    /// Camera root URL (e.g., `http://192.168.100.1`).
    pub url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Delay between trigger and the follow-up listing in `capture`.
    pub capture_settle: Duration,
    /// Default destination for persisted resources.
    pub download_dir: Option<PathBuf>,
    /// Filename schemes replacing the built-in ones, per media kind.
    pub schemes: Vec<SchemeSpec>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.clone(),
            timeout: DEFAULT_TIMEOUT,
            capture_settle: DEFAULT_CAPTURE_SETTLE,
            download_dir: None,
            schemes: Vec::new(),
        }
    }
}

impl CameraConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    /// Transport settings for the api client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_camera_access_point() {
        let config = CameraConfig::default();
        assert_eq!(config.url.as_str(), "http://192.168.100.1/");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.capture_settle, Duration::from_secs(1));
        assert!(config.schemes.is_empty());
    }

    #[test]
    fn transport_carries_timeout() {
        let mut config = CameraConfig::default();
        config.timeout = Duration::from_secs(12);
        assert_eq!(config.transport().timeout, Duration::from_secs(12));
    }
}
