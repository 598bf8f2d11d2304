//! Reorder engine
//!
//! Reconciles catalog records with a ranked reference list and derives new
//! "date added" timestamps from rank order. Components, leaves first:
//!
//! - [`normalize`]: canonical title key
//! - [`ReferenceIndex`]: exact and normalized title lookups
//! - [`matcher`]: per-record resolution (exact pass, then normalized pass)
//! - [`assigner`]: rank-ordered timestamp derivation
//! - [`plan`]: all of the above in one call
//!
//! Everything here is synchronous and deterministic; nothing performs I/O.

pub mod assigner;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod plan;
pub mod types;

pub use assigner::{assign, resolve_anchor};
pub use index::ReferenceIndex;
pub use matcher::{candidate_titles, match_record, match_records, partition, summarize};
pub use normalize::normalize;
pub use plan::{reconcile, MatchReport, Reconciliation, ReorderConfig, ReorderPlan};
pub use types::{
    derive_stem_title, Assignment, LocalRecord, MatchMode, MatchOutcome, MatchedRecord,
    OffsetMode, ReferenceEntry, ReorderSummary, UnmatchedReason, UnmatchedRecord,
};
