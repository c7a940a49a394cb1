// ── Filename metadata ──
//
// Device filenames encode media kind, capture time, burst frame and
// format. Each media kind has exactly one `FilenameScheme`, declared as
// data (`SchemeSpec`) and compiled into an anchored named-group regex.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use wundercam_api::files::{IMAGE_DIR, VIDEO_DIR};

use crate::error::CoreError;

// ── Media kind ──────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Directory on the camera's file server holding this kind of media.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Image => IMAGE_DIR,
            Self::Video => VIDEO_DIR,
        }
    }
}

// ── Metadata ────────────────────────────────────────────────────────

/// Groups resources captured by one burst or continuous action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub media_kind: MediaKind,
    pub captured_at: NaiveDateTime,
}

/// Structured view of a device filename. Read-only after extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceMetadata {
    pub media_kind: MediaKind,
    pub captured_at: NaiveDateTime,
    pub sequence_index: Option<u32>,
    /// As written in the filename, without the dot.
    pub format_extension: String,
    pub raw_filename: String,
}

impl ResourceMetadata {
    pub fn session_key(&self) -> SessionKey {
        SessionKey {
            media_kind: self.media_kind,
            captured_at: self.captured_at,
        }
    }
}

// ── Schemes ─────────────────────────────────────────────────────────

/// Declarative description of a filename convention.
///
/// A filename is `{prefix}{timestamp}[{sequence_separator}{sequence}].{extension}`.
/// `timestamp_format` is a chrono format string restricted to `%Y %m %d
/// %H %M %S` and literal characters; year, month and day are required.
/// With `sequence_digits` unset the scheme has no sequence component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSpec {
    pub media_kind: MediaKind,
    pub prefix: String,
    pub timestamp_format: String,
    #[serde(default = "default_separator")]
    pub sequence_separator: String,
    #[serde(default)]
    pub sequence_digits: Option<usize>,
    pub extension: String,
}

fn default_separator() -> String {
    "_".into()
}

impl SchemeSpec {
    /// `Img_YYYYMMDD_HHMMSS_FFF.jpg`
    pub fn default_image() -> Self {
        Self {
            media_kind: MediaKind::Image,
            prefix: "Img_".into(),
            timestamp_format: "%Y%m%d_%H%M%S".into(),
            sequence_separator: default_separator(),
            sequence_digits: Some(3),
            extension: "jpg".into(),
        }
    }

    /// `Vid_YYYYMMDD_HHMMSS_FFF.mp4`
    pub fn default_video() -> Self {
        Self {
            media_kind: MediaKind::Video,
            prefix: "Vid_".into(),
            timestamp_format: "%Y%m%d_%H%M%S".into(),
            sequence_separator: default_separator(),
            sequence_digits: Some(3),
            extension: "mp4".into(),
        }
    }
}

/// A compiled [`SchemeSpec`].
#[derive(Debug, Clone)]
pub struct FilenameScheme {
    spec: SchemeSpec,
    pattern: Regex,
}

impl FilenameScheme {
    pub fn compile(spec: SchemeSpec) -> Result<Self, CoreError> {
        if spec.extension.is_empty() {
            return Err(scheme_error("extension must not be empty"));
        }
        if spec.sequence_digits == Some(0) {
            return Err(scheme_error("sequence_digits must be at least 1"));
        }

        let mut pattern = String::from("^");
        pattern.push_str(&regex::escape(&spec.prefix));
        pattern.push_str(&timestamp_pattern(&spec.timestamp_format)?);
        if let Some(digits) = spec.sequence_digits {
            let _ = write!(
                pattern,
                "(?:{}(?P<sequence>[0-9]{{{digits}}}))?",
                regex::escape(&spec.sequence_separator)
            );
        }
        let _ = write!(
            pattern,
            r"\.(?P<extension>(?i:{}))$",
            regex::escape(&spec.extension)
        );

        let pattern = Regex::new(&pattern).map_err(|e| scheme_error(e.to_string()))?;
        Ok(Self { spec, pattern })
    }

    pub fn spec(&self) -> &SchemeSpec {
        &self.spec
    }

    pub fn media_kind(&self) -> MediaKind {
        self.spec.media_kind
    }

    /// Parse a bare filename (no directory) against this scheme.
    pub fn parse(&self, filename: &str) -> Result<ResourceMetadata, CoreError> {
        let kind = self.spec.media_kind;
        let fail = |reason: &str| CoreError::Parse {
            filename: filename.to_owned(),
            kind,
            reason: reason.to_owned(),
        };

        let caps = self
            .pattern
            .captures(filename)
            .ok_or_else(|| fail("does not match the filename scheme"))?;

        let field = |name: &str| -> Result<u32, CoreError> {
            caps.name(name)
                .map_or(Ok(0), |m| m.as_str().parse())
                .map_err(|_| fail("numeric field out of range"))
        };
        let year = caps
            .name("year")
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .ok_or_else(|| fail("missing year"))?;

        let date = NaiveDate::from_ymd_opt(year, field("month")?, field("day")?)
            .ok_or_else(|| fail("invalid calendar date"))?;
        let time = NaiveTime::from_hms_opt(field("hour")?, field("minute")?, field("second")?)
            .ok_or_else(|| fail("invalid time of day"))?;

        let sequence_index = caps
            .name("sequence")
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| fail("sequence index out of range"))?;

        let format_extension = caps
            .name("extension")
            .map(|m| m.as_str().to_owned())
            .ok_or_else(|| fail("missing extension"))?;

        Ok(ResourceMetadata {
            media_kind: kind,
            captured_at: NaiveDateTime::new(date, time),
            sequence_index,
            format_extension,
            raw_filename: filename.to_owned(),
        })
    }

    /// Re-derive the filename the device would use for `metadata`.
    pub fn render(&self, metadata: &ResourceMetadata) -> String {
        let mut name = self.spec.prefix.clone();
        let _ = write!(
            name,
            "{}",
            metadata.captured_at.format(&self.spec.timestamp_format)
        );
        if let (Some(seq), Some(width)) = (metadata.sequence_index, self.spec.sequence_digits) {
            let _ = write!(name, "{}{seq:0width$}", self.spec.sequence_separator);
        }
        name.push('.');
        name.push_str(&metadata.format_extension);
        name
    }
}

fn scheme_error(message: impl Into<String>) -> CoreError {
    CoreError::Scheme {
        message: message.into(),
    }
}

/// Translate a chrono-style format into regex fragments with named groups.
fn timestamp_pattern(format: &str) -> Result<String, CoreError> {
    let mut out = String::new();
    let mut seen = Vec::new();
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            continue;
        }
        let directive = chars
            .next()
            .ok_or_else(|| scheme_error("timestamp format ends with '%'"))?;
        let (group, digits) = match directive {
            'Y' => ("year", 4),
            'm' => ("month", 2),
            'd' => ("day", 2),
            'H' => ("hour", 2),
            'M' => ("minute", 2),
            'S' => ("second", 2),
            '%' => {
                out.push('%');
                continue;
            }
            other => {
                return Err(scheme_error(format!(
                    "unsupported timestamp directive '%{other}'"
                )));
            }
        };
        if seen.contains(&group) {
            return Err(scheme_error(format!("'%{directive}' appears twice")));
        }
        seen.push(group);
        let _ = write!(out, "(?P<{group}>[0-9]{{{digits}}})");
    }

    for required in ["year", "month", "day"] {
        if !seen.contains(&required) {
            return Err(scheme_error(format!(
                "timestamp format must contain the {required}"
            )));
        }
    }
    Ok(out)
}

// ── Extractor ───────────────────────────────────────────────────────

static DEFAULT_EXTRACTOR: LazyLock<MetadataExtractor> = LazyLock::new(|| {
    MetadataExtractor::from_specs([SchemeSpec::default_image(), SchemeSpec::default_video()])
        .expect("built-in filename schemes are valid")
});

/// Parses device filenames using one scheme per media kind.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    schemes: BTreeMap<MediaKind, FilenameScheme>,
}

impl Default for MetadataExtractor {
    /// The S1 conventions (`Img_…jpg`, `Vid_…mp4`).
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}

impl MetadataExtractor {
    /// Build an extractor from scheme declarations. A later declaration for the
    /// same media kind replaces an earlier one.
    pub fn from_specs(specs: impl IntoIterator<Item = SchemeSpec>) -> Result<Self, CoreError> {
        let mut schemes = BTreeMap::new();
        for spec in specs {
            let scheme = FilenameScheme::compile(spec)?;
            schemes.insert(scheme.media_kind(), scheme);
        }
        Ok(Self { schemes })
    }

    /// Replace the scheme for `spec.media_kind`.
    pub fn with_scheme(mut self, spec: SchemeSpec) -> Result<Self, CoreError> {
        let scheme = FilenameScheme::compile(spec)?;
        self.schemes.insert(scheme.media_kind(), scheme);
        Ok(self)
    }

    pub fn scheme(&self, kind: MediaKind) -> Option<&FilenameScheme> {
        self.schemes.get(&kind)
    }

    pub fn extract(&self, filename: &str, kind: MediaKind) -> Result<ResourceMetadata, CoreError> {
        self.scheme(kind)
            .ok_or_else(|| CoreError::Parse {
                filename: filename.to_owned(),
                kind,
                reason: "no filename scheme registered".into(),
            })?
            .parse(filename)
    }
}
