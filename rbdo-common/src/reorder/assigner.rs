//! Timestamp assignment
//!
//! Derives a new "date added" for every matched record from its reference
//! rank. Rank 1 receives the anchor; each later record steps further back in
//! time, so sorting the catalog by date added reproduces the reference order.

use super::types::{Assignment, MatchedRecord, OffsetMode};
use crate::time::ensure_sub_second;
use crate::{Error, Result};
use chrono::{Duration, NaiveDateTime};

/// Pick the anchor for a batch
///
/// Priority: explicit override, then the latest existing timestamp among
/// matched records, then `now`. Override parsing happens at the
/// configuration boundary; this only chooses between resolved values.
pub fn resolve_anchor(
    override_anchor: Option<NaiveDateTime>,
    matched: &[MatchedRecord],
    now: NaiveDateTime,
) -> NaiveDateTime {
    override_anchor
        .or_else(|| {
            matched
                .iter()
                .filter_map(|m| m.record.existing_timestamp)
                .max()
        })
        .unwrap_or(now)
}

/// Offset (in steps) for the record at sorted position `position`
fn offset_steps(mode: OffsetMode, position: usize, rank: u32) -> Result<i32> {
    let steps = match mode {
        OffsetMode::Dense => i64::try_from(position).unwrap_or(i64::MAX),
        OffsetMode::RankGap => {
            if rank == 0 {
                return Err(Error::InvalidInput(
                    "reference ranks start at 1; got rank 0".to_string(),
                ));
            }
            i64::from(rank) - 1
        }
    };
    i32::try_from(steps)
        .map_err(|_| Error::InvalidInput(format!("offset of {} steps is out of range", steps)))
}

/// Compute new timestamps for all matched records
///
/// Records are ordered by ascending reference rank (stable, so duplicates
/// keep their input order). For sorted position `p` and rank `r`:
///
/// - `Dense`: offset = `p`
/// - `RankGap`: offset = `r - 1`
///
/// and `new = ensure_sub_second(anchor) - offset * step`. The rank-1 match
/// receives exactly `ensure_sub_second(anchor)`.
///
/// # Errors
/// - `Error::Config` if `step` is shorter than one second
/// - `Error::InvalidInput` if an offset leaves the representable range
pub fn assign(
    matched: &[MatchedRecord],
    anchor: NaiveDateTime,
    step: Duration,
    mode: OffsetMode,
) -> Result<Vec<Assignment>> {
    if step < Duration::seconds(1) {
        return Err(Error::Config(format!(
            "step must be at least 1 second (got {} ms)",
            step.num_milliseconds()
        )));
    }

    let mut ordered: Vec<&MatchedRecord> = matched.iter().collect();
    ordered.sort_by_key(|m| m.entry.rank);

    let top = ensure_sub_second(anchor);

    ordered
        .into_iter()
        .enumerate()
        .map(|(position, m)| {
            let steps = offset_steps(mode, position, m.entry.rank)?;
            let back = step
                .checked_mul(steps)
                .ok_or_else(|| Error::InvalidInput("timestamp offset overflow".to_string()))?;
            let new_timestamp = top
                .checked_sub_signed(back)
                .map(ensure_sub_second)
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "assigned timestamp for rank {} is out of range",
                        m.entry.rank
                    ))
                })?;

            Ok(Assignment {
                record: m.record.clone(),
                rank: m.entry.rank,
                mode: m.mode,
                new_timestamp,
            })
        })
        .collect()
}
