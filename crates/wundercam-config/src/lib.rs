//! Configuration for wundercam camera sessions.
//!
//! TOML profiles layered with environment overrides, and translation to
//! `wundercam_core::CameraConfig`. Core never reads files; callers load a
//! [`Config`] here and hand the resulting `CameraConfig` to
//! `CameraSession::connect`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wundercam_core::{CameraConfig, FilenameScheme, SchemeSpec};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named camera profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Pause between trigger and the follow-up listing, in milliseconds.
    #[serde(default = "default_capture_settle_ms")]
    pub capture_settle_ms: u64,

    pub download_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            capture_settle_ms: default_capture_settle_ms(),
            download_dir: None,
        }
    }
}

fn default_timeout() -> u64 {
    5
}
fn default_capture_settle_ms() -> u64 {
    1000
}

/// A named camera profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Camera URL or bare host (e.g., "192.168.100.1").
    #[serde(default = "default_camera")]
    pub camera: String,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override capture settle delay.
    pub capture_settle_ms: Option<u64>,

    /// Override download directory.
    pub download_dir: Option<PathBuf>,

    /// Filename schemes replacing the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<SchemeSpec>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            camera: default_camera(),
            timeout: None,
            capture_settle_ms: None,
            download_dir: None,
            schemes: Vec::new(),
        }
    }
}

fn default_camera() -> String {
    "192.168.100.1".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "wundercam", "wundercam").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wundercam");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment.
///
/// Environment variables use the `WUNDERCAM_` prefix with `__` as the
/// nesting separator, e.g. `WUNDERCAM_PROFILES__LAB__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WUNDERCAM_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }

    /// Build a `CameraConfig` for `name` (or the default profile).
    ///
    /// With no name given and no default profile defined, the global
    /// defaults are applied to the stock camera address.
    pub fn camera_config(&self, name: Option<&str>) -> Result<CameraConfig, ConfigError> {
        match self.profile(name) {
            Ok((_, profile)) => profile_to_camera_config(profile, &self.defaults),
            Err(ConfigError::UnknownProfile { .. }) if name.is_none() => {
                profile_to_camera_config(&Profile::default(), &self.defaults)
            }
            Err(err) => Err(err),
        }
    }
}

/// Build a `CameraConfig` from a profile and the global defaults.
pub fn profile_to_camera_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<CameraConfig, ConfigError> {
    let raw = profile.camera.trim();
    if raw.is_empty() {
        return Err(invalid("camera", "must not be empty"));
    }
    let with_scheme = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    };
    let url: url::Url = with_scheme
        .parse()
        .map_err(|_| invalid("camera", format!("invalid URL: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "camera",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(invalid("timeout", "must be at least 1 second"));
    }
    let settle = profile
        .capture_settle_ms
        .unwrap_or(defaults.capture_settle_ms);

    for spec in &profile.schemes {
        FilenameScheme::compile(spec.clone()).map_err(|e| invalid("schemes", e.to_string()))?;
    }

    Ok(CameraConfig {
        url,
        timeout: Duration::from_secs(timeout),
        capture_settle: Duration::from_millis(settle),
        download_dir: profile
            .download_dir
            .clone()
            .or_else(|| defaults.download_dir.clone()),
        schemes: profile.schemes.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use wundercam_core::MediaKind;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 8
download_dir = "/srv/captures"

[profiles.lab]
camera = "10.0.0.42"
capture_settle_ms = 2500

[profiles.proxy]
camera = "https://camera.example.net/s1"
timeout = 20
download_dir = "/tmp/s1"

[[profiles.proxy.schemes]]
media_kind = "image"
prefix = "IMG_"
timestamp_format = "%Y%m%d"
sequence_digits = 4
extension = "jpg"
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults, Defaults::default());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn default_profile_applies_defaults() {
        let camera = sample().camera_config(None).unwrap();
        assert_eq!(camera.url.as_str(), "http://10.0.0.42/");
        assert_eq!(camera.timeout, Duration::from_secs(8));
        assert_eq!(camera.capture_settle, Duration::from_millis(2500));
        assert_eq!(camera.download_dir, Some(PathBuf::from("/srv/captures")));
    }

    #[test]
    fn named_profile_overrides_defaults() {
        let camera = sample().camera_config(Some("proxy")).unwrap();
        assert_eq!(camera.url.as_str(), "https://camera.example.net/s1");
        assert_eq!(camera.timeout, Duration::from_secs(20));
        assert_eq!(camera.capture_settle, Duration::from_secs(1));
        assert_eq!(camera.download_dir, Some(PathBuf::from("/tmp/s1")));
        assert_eq!(camera.schemes.len(), 1);
        assert_eq!(camera.schemes[0].media_kind, MediaKind::Image);
        assert_eq!(camera.schemes[0].sequence_separator, "_");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let err = sample().camera_config(Some("attic")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { ref profile } if profile == "attic"));
    }

    #[test]
    fn empty_config_targets_stock_camera() {
        let camera = Config::default().camera_config(None).unwrap();
        assert_eq!(camera, CameraConfig::default());
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let defaults = Defaults::default();
        let cases = [
            (
                Profile {
                    camera: "http://[::1".into(),
                    ..Profile::default()
                },
                "camera",
            ),
            (
                Profile {
                    camera: "ftp://camera".into(),
                    ..Profile::default()
                },
                "camera",
            ),
            (
                Profile {
                    timeout: Some(0),
                    ..Profile::default()
                },
                "timeout",
            ),
            (
                Profile {
                    schemes: vec![SchemeSpec {
                        timestamp_format: "%H%M".into(),
                        ..SchemeSpec::default_image()
                    }],
                    ..Profile::default()
                },
                "schemes",
            ),
        ];
        for (profile, expected) in cases {
            match profile_to_camera_config(&profile, &defaults) {
                Err(ConfigError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected Validation error for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let config = sample();

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }
}
