//! Data model for the reorder engine
//!
//! All values are created fresh per run from collaborator-supplied input.
//! Nothing here persists or holds shared state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One item of the externally supplied ranked reference list
///
/// Rank 1 is the most prominent (most recently liked) entry. Ranks are
/// unique and ascending but may contain gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// 1-based position in the reference list
    pub rank: u32,
    /// Identifier assigned by the reference source
    pub external_id: String,
    /// Display title used for matching
    pub title: String,
    /// Link back to the reference item (may be empty)
    pub url: String,
}

impl ReferenceEntry {
    pub fn new(
        rank: u32,
        external_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            rank,
            external_id: external_id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// One catalog row subject to reordering
///
/// Owned by the storage collaborator; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRecord {
    /// Catalog file path
    pub path: String,
    /// Stored title, if any
    pub title: Option<String>,
    /// Current "date added" value, if any
    pub existing_timestamp: Option<NaiveDateTime>,
    /// Opaque catalog row identifier, when the catalog has one
    #[serde(default)]
    pub row_id: Option<String>,
}

impl LocalRecord {
    pub fn new(
        path: impl Into<String>,
        title: Option<String>,
        existing_timestamp: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            path: path.into(),
            title,
            existing_timestamp,
            row_id: None,
        }
    }

    pub fn with_row_id(mut self, row_id: impl Into<String>) -> Self {
        self.row_id = Some(row_id.into());
        self
    }

    /// Key identifying the catalog row: the row id, else the path
    pub fn row_key(&self) -> &str {
        self.row_id.as_deref().unwrap_or(&self.path)
    }

    /// Filename without extension, derived from `path` alone
    ///
    /// Both `/` and `\` are treated as separators so catalogs written on
    /// Windows resolve the same stem. Only the last extension is removed and
    /// a leading dot does not start an extension (`.hidden` stays `.hidden`).
    /// Never touches the filesystem.
    pub fn path_stem(&self) -> &str {
        derive_stem_title(&self.path)
    }

    /// Title shown in reports: the stored title, else the path stem
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => self.path_stem(),
        }
    }
}

/// Filename without extension for a catalog path string
pub fn derive_stem_title(path: &str) -> &str {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    }
}

/// How a record was resolved against the reference list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Literal title equality
    Exact,
    /// Equality after [`normalize`](crate::reorder::normalize)
    Normalized,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Normalized => "normalized",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnmatchedReason {
    /// No candidate title matched in either lookup pass
    NotFound,
}

impl UnmatchedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnmatchedReason::NotFound => "not-found-in-likes",
        }
    }
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record resolved to a reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRecord {
    pub record: LocalRecord,
    pub entry: ReferenceEntry,
    pub mode: MatchMode,
}

/// A record with no reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedRecord {
    pub record: LocalRecord,
    pub reason: UnmatchedReason,
}

/// Result of matching one local record
///
/// Exactly one outcome is produced per input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Matched(MatchedRecord),
    Unmatched(UnmatchedRecord),
}

impl MatchOutcome {
    /// The local record this outcome was produced for
    pub fn record(&self) -> &LocalRecord {
        match self {
            MatchOutcome::Matched(m) => &m.record,
            MatchOutcome::Unmatched(u) => &u.record,
        }
    }

    pub fn as_matched(&self) -> Option<&MatchedRecord> {
        match self {
            MatchOutcome::Matched(m) => Some(m),
            MatchOutcome::Unmatched(_) => None,
        }
    }

    pub fn as_unmatched(&self) -> Option<&UnmatchedRecord> {
        match self {
            MatchOutcome::Matched(_) => None,
            MatchOutcome::Unmatched(u) => Some(u),
        }
    }
}

/// Offset policy used when deriving timestamps from rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetMode {
    /// Consecutive matched records get consecutive offsets
    #[default]
    Dense,
    /// Offset is the absolute rank distance from rank 1
    RankGap,
}

impl OffsetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetMode::Dense => "dense",
            OffsetMode::RankGap => "rank-gap",
        }
    }
}

/// Proposed new "date added" value for a matched record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub record: LocalRecord,
    /// Rank of the reference entry the record matched
    pub rank: u32,
    pub mode: MatchMode,
    pub new_timestamp: NaiveDateTime,
}

/// Matched/unmatched counts for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReorderSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub exact: usize,
    pub normalized: usize,
    /// Matched records whose reference entry was already claimed by an
    /// earlier matched record. Under rank-gap offsets they share a timestamp.
    pub collisions: usize,
}

impl ReorderSummary {
    /// True when matching finished without a single match
    pub fn is_noop(&self) -> bool {
        self.matched == 0
    }
}
