//! One-call reconciliation: index, match, resolve anchor, assign

use super::assigner::{assign, resolve_anchor};
use super::index::ReferenceIndex;
use super::matcher::{match_records, summarize};
use super::types::{
    Assignment, LocalRecord, MatchOutcome, MatchedRecord, OffsetMode, ReferenceEntry,
    ReorderSummary,
};
use crate::time::{ensure_sub_second, parse_anchor};
use crate::{Error, Result};
use chrono::{Duration, NaiveDateTime};

/// Validated reorder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderConfig {
    /// Distance between consecutive offsets (at least one second)
    pub step: Duration,
    /// Explicit anchor, already parsed
    pub anchor_override: Option<NaiveDateTime>,
    pub offset_mode: OffsetMode,
}

impl ReorderConfig {
    /// Validate raw settings at the configuration boundary
    ///
    /// # Errors
    /// `Error::Config` for a step below 1 second or an unparsable anchor.
    pub fn from_raw(
        step_seconds: i64,
        anchor_override: Option<&str>,
        offset_mode: OffsetMode,
    ) -> Result<Self> {
        if step_seconds < 1 {
            return Err(Error::Config(format!(
                "step seconds must be >= 1 (got {})",
                step_seconds
            )));
        }
        let step = Duration::try_seconds(step_seconds).ok_or_else(|| {
            Error::Config(format!("step seconds out of range: {}", step_seconds))
        })?;

        let anchor_override = match anchor_override.map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_anchor(raw)?),
            _ => None,
        };

        Ok(Self {
            step,
            anchor_override,
            offset_mode,
        })
    }
}

/// Matching results for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    /// One outcome per local record, in input order
    pub outcomes: Vec<MatchOutcome>,
    pub summary: ReorderSummary,
}

impl MatchReport {
    /// Matched records sorted by ascending rank (stable)
    pub fn matched_by_rank(&self) -> Vec<MatchedRecord> {
        let mut matched: Vec<MatchedRecord> = self
            .outcomes
            .iter()
            .filter_map(|o| o.as_matched().cloned())
            .collect();
        matched.sort_by_key(|m| m.entry.rank);
        matched
    }
}

/// A complete set of proposed timestamp changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    pub report: MatchReport,
    /// Anchor after sub-second fill; the rank-1 match receives exactly this
    pub anchor: NaiveDateTime,
    /// Ordered by ascending rank
    pub assignments: Vec<Assignment>,
}

/// Terminal state of a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// At least one record matched; assignments are ready to apply
    Planned(ReorderPlan),
    /// Matching finished without a single match; nothing to assign
    NothingMatched(MatchReport),
}

impl Reconciliation {
    pub fn report(&self) -> &MatchReport {
        match self {
            Reconciliation::Planned(plan) => &plan.report,
            Reconciliation::NothingMatched(report) => report,
        }
    }
}

/// Run the whole engine over materialized inputs
///
/// `now` is only consulted when there is no override and no matched record
/// carries an existing timestamp. Identical arguments always yield an
/// identical result.
///
/// # Errors
/// `Error::Precondition` for an empty reference list or record set; the
/// assignment errors documented on [`assign`].
pub fn reconcile(
    entries: &[ReferenceEntry],
    records: &[LocalRecord],
    config: &ReorderConfig,
    now: NaiveDateTime,
) -> Result<Reconciliation> {
    let index = ReferenceIndex::build(entries)?;
    let outcomes = match_records(records, &index)?;
    let summary = summarize(&outcomes);
    let report = MatchReport { outcomes, summary };

    if summary.is_noop() {
        return Ok(Reconciliation::NothingMatched(report));
    }

    let matched = report.matched_by_rank();
    let anchor = ensure_sub_second(resolve_anchor(config.anchor_override, &matched, now));
    let assignments = assign(&matched, anchor, config.step, config.offset_mode)?;

    Ok(Reconciliation::Planned(ReorderPlan {
        report,
        anchor,
        assignments,
    }))
}
