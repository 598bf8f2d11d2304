//! Record matching
//!
//! Resolves each local record to at most one reference entry. Every record
//! is resolved independently: candidate titles are tried against the exact
//! map first, then (normalized) against the normalized map.

use super::index::ReferenceIndex;
use super::normalize::normalize;
use super::types::{
    LocalRecord, MatchMode, MatchOutcome, MatchedRecord, ReferenceEntry, ReorderSummary,
    UnmatchedReason, UnmatchedRecord,
};
use crate::{Error, Result};
use std::collections::HashSet;

/// Ordered candidate titles for a record
///
/// The stored title (when present and non-empty) comes first, then the
/// filename stem derived from the path.
pub fn candidate_titles(record: &LocalRecord) -> Vec<&str> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(title) = record.title.as_deref() {
        if !title.is_empty() {
            candidates.push(title);
        }
    }
    candidates.push(record.path_stem());
    candidates
}

/// Resolve a single record against the index
pub fn match_record(record: &LocalRecord, index: &ReferenceIndex<'_>) -> MatchOutcome {
    let candidates = candidate_titles(record);

    let exact_hit = candidates
        .iter()
        .find_map(|candidate| index.get_exact(candidate));
    if let Some(entry) = exact_hit {
        return matched(record, entry.clone(), MatchMode::Exact);
    }

    let normalized_hit = candidates
        .iter()
        .find_map(|candidate| index.get_normalized(&normalize(candidate)));
    if let Some(entry) = normalized_hit {
        return matched(record, entry.clone(), MatchMode::Normalized);
    }

    MatchOutcome::Unmatched(UnmatchedRecord {
        record: record.clone(),
        reason: UnmatchedReason::NotFound,
    })
}

fn matched(record: &LocalRecord, entry: ReferenceEntry, mode: MatchMode) -> MatchOutcome {
    MatchOutcome::Matched(MatchedRecord {
        record: record.clone(),
        entry,
        mode,
    })
}

/// Resolve every record, preserving input order
///
/// Produces exactly one outcome per input record. Records that resolve to
/// the same reference entry are all reported as matched; see
/// [`summarize`] for the collision count.
///
/// # Errors
/// `Error::Precondition` if `records` is empty.
pub fn match_records(
    records: &[LocalRecord],
    index: &ReferenceIndex<'_>,
) -> Result<Vec<MatchOutcome>> {
    if records.is_empty() {
        return Err(Error::Precondition(
            "local record set is empty; nothing to match".to_string(),
        ));
    }

    Ok(records
        .iter()
        .map(|record| match_record(record, index))
        .collect())
}

/// Split outcomes into matched and unmatched, keeping relative order
pub fn partition(outcomes: Vec<MatchOutcome>) -> (Vec<MatchedRecord>, Vec<UnmatchedRecord>) {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for outcome in outcomes {
        match outcome {
            MatchOutcome::Matched(m) => matched.push(m),
            MatchOutcome::Unmatched(u) => unmatched.push(u),
        }
    }
    (matched, unmatched)
}

/// Count matched/unmatched outcomes and reference-entry collisions
pub fn summarize(outcomes: &[MatchOutcome]) -> ReorderSummary {
    let mut summary = ReorderSummary {
        total: outcomes.len(),
        ..Default::default()
    };
    let mut claimed = HashSet::new();

    for outcome in outcomes {
        match outcome {
            MatchOutcome::Matched(m) => {
                summary.matched += 1;
                match m.mode {
                    MatchMode::Exact => summary.exact += 1,
                    MatchMode::Normalized => summary.normalized += 1,
                }
                if !claimed.insert(m.entry.rank) {
                    summary.collisions += 1;
                }
            }
            MatchOutcome::Unmatched(_) => summary.unmatched += 1,
        }
    }

    summary
}
