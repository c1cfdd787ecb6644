use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Target states that mark a unit as reviewed/approved by the producing tool.
pub const APPROVED_STATES: &[&str] = &["final", "translated", "signed-off", "reviewed"];

/// Default value of `Segment::internal_state` when the target has no `state`.
pub const DEFAULT_STATE: &str = "new";

/// Markup dialect of an asset. Only XLIFF-family documents carry translation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Xliff,
    Sdlxliff,
    Mqxliff,
    Other,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_tag)
            .unwrap_or(Self::Other)
    }

    /// Map an extension or dialect tag (`xlf`, `xliff`, `sdlxliff`, ...) to a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "xlf" | "xliff" => Self::Xliff,
            "sdlxliff" => Self::Sdlxliff,
            "mqxliff" => Self::Mqxliff,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xliff => "xliff",
            Self::Sdlxliff => "sdlxliff",
            Self::Mqxliff => "mqxliff",
            Self::Other => "other",
        }
    }

    pub fn is_translation_dialect(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One loaded document. `content` is the system of record; segments are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    content: String,
    size: usize,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: DocumentKind,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            size: content.len(),
            content,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Size of `content` in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Swap in a complete new content string. Returns `false` when nothing changed.
    pub fn replace_content(&mut self, content: String) -> bool {
        if content == self.content {
            return false;
        }
        self.size = content.len();
        self.content = content;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentStatus {
    Untranslated,
    Translated,
    Approved,
    Locked,
}

impl SegmentStatus {
    pub fn derive(is_translatable: bool, internal_state: &str, target: &str) -> Self {
        if !is_translatable {
            Self::Locked
        } else if is_approved_state(internal_state) {
            Self::Approved
        } else if !target.is_empty() {
            Self::Translated
        } else {
            Self::Untranslated
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Untranslated => "untranslated",
            Self::Translated => "translated",
            Self::Approved => "approved",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_approved_state(state: &str) -> bool {
    let state = state.trim();
    APPROVED_STATES.iter().any(|s| s.eq_ignore_ascii_case(state))
}

/// A single translation unit projected out of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Unit identifier; unique within its asset only.
    pub id: String,
    pub source: String,
    pub target: String,
    pub status: SegmentStatus,
    /// Raw `state` attribute of the target element.
    pub internal_state: String,
    pub is_tm_match: bool,
    pub is_translatable: bool,
    /// Name of the owning asset.
    pub file_name: String,
}

impl Segment {
    /// Build a segment, deriving `status` and `is_tm_match` from the raw unit data.
    pub fn from_unit(
        id: String,
        source: String,
        target: String,
        internal_state: String,
        match_quality: Option<&str>,
        is_translatable: bool,
        file_name: String,
    ) -> Self {
        let status = SegmentStatus::derive(is_translatable, &internal_state, &target);
        let is_tm_match = is_full_match(match_quality) || status == SegmentStatus::Approved;
        Self {
            id,
            source,
            target,
            status,
            internal_state,
            is_tm_match,
            is_translatable,
            file_name,
        }
    }

    /// Record a manual override: fresh value, no longer protected.
    pub fn apply_override(&mut self, text: &str) {
        self.target = text.to_string();
        self.status = SegmentStatus::Translated;
        self.is_tm_match = false;
    }
}

/// `match-quality="100"` marks a full translation-memory match.
pub fn is_full_match(match_quality: Option<&str>) -> bool {
    match_quality
        .map(str::trim)
        .and_then(|q| q.trim_end_matches('%').parse::<f64>().ok())
        .is_some_and(|q| q == 100.0)
}

#[derive(Debug, Error)]
pub enum LocSyncError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("no inconsistency group for `{0}`")]
    UnknownGroup(String),
    #[error("no asset named `{0}`")]
    UnknownAsset(String),
    #[error("variation {index} out of range ({len} available)")]
    VariationOutOfRange { index: usize, len: usize },
    #[error("no suggestion available for `{0}`")]
    NoSuggestion(String),
    #[error("recommendation: {0}")]
    Recommend(String),
    #[error("{0}")]
    Other(String),
}
