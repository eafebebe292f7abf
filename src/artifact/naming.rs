//! Artifact file names are the pipeline protocol.
//!
//! - raw: `<slide>_<unix-seconds>.png`, written by capture
//! - processed: `O_<slide>_<unix-seconds>.png`, derived 1:1 from a raw artifact by overlay
//!
//! Names starting with `.` are in-flight temp files and never artifacts.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

/// Prefix that marks a processed artifact.
pub const PROCESSED_PREFIX: &str = "O_";
/// Extension shared by all artifacts.
pub const ARTIFACT_EXTENSION: &str = "png";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Pipeline state encoded in an artifact name.
pub enum ArtifactKind {
    /// Captured and transformed, not yet overlaid.
    Raw,
    /// Overlaid; never modified again.
    Processed,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Parsed artifact identity: kind, slide key and capture timestamp.
pub struct ArtifactName {
    kind: ArtifactKind,
    slide: String,
    timestamp: u64,
}

impl ArtifactName {
    /// Raw artifact name for `slide` captured at `timestamp` (unix seconds).
    pub fn raw(slide: impl Into<String>, timestamp: u64) -> Self {
        Self {
            kind: ArtifactKind::Raw,
            slide: slide.into(),
            timestamp,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn slide(&self) -> &str {
        &self.slide
    }

    /// Capture time in unix seconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn is_processed(&self) -> bool {
        self.kind == ArtifactKind::Processed
    }

    /// The processed name derived from this identity.
    pub fn processed(&self) -> Self {
        Self {
            kind: ArtifactKind::Processed,
            ..self.clone()
        }
    }

    /// The raw name this identity was (or will be) derived from.
    pub fn raw_source(&self) -> Self {
        Self {
            kind: ArtifactKind::Raw,
            ..self.clone()
        }
    }

    /// Same slide and kind, different timestamp.
    pub fn with_timestamp(&self, timestamp: u64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    pub fn file_name(&self) -> String {
        let prefix = match self.kind {
            ArtifactKind::Raw => "",
            ArtifactKind::Processed => PROCESSED_PREFIX,
        };
        format!(
            "{prefix}{}_{}.{ARTIFACT_EXTENSION}",
            self.slide, self.timestamp
        )
    }

    /// Parse a directory entry name. Anything that does not follow the scheme is `None`.
    pub fn parse(file_name: &str) -> Option<Self> {
        if is_temp_name(file_name) {
            return None;
        }
        let stem = file_name.strip_suffix(&format!(".{ARTIFACT_EXTENSION}"))?;
        let (kind, rest) = match stem.strip_prefix(PROCESSED_PREFIX) {
            Some(rest) => (ArtifactKind::Processed, rest),
            None => (ArtifactKind::Raw, stem),
        };
        let (slide, ts) = rest.rsplit_once('_')?;
        if slide.is_empty() || ts.is_empty() || !ts.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            kind,
            slide: slide.to_string(),
            timestamp: ts.parse().ok()?,
        })
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// In-flight temp files are hidden names.
pub fn is_temp_name(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Turn a configured slide name into a key that is safe inside an artifact file name.
///
/// Characters other than alphanumerics, `-`, `_` and `.` become `-`. A key whose file names
/// would read as a temp file or a processed artifact (including the bare key `O`) is escaped
/// with a leading `_`.
pub fn artifact_key(name: &str) -> String {
    let mut key: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if key.is_empty() {
        key.push_str("slide");
    }
    if key.starts_with('.') || format!("{key}_").starts_with(PROCESSED_PREFIX) {
        key.insert(0, '_');
    }
    key
}

/// Whole unix seconds of `t`; times before the epoch clamp to 0.
pub fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/artifact/naming.rs"]
mod tests;
