//! # RBDO Common Library
//!
//! Shared code for the Rekordbox date-order tools including:
//! - The reorder engine (title normalization, reference index, record
//!   matching, timestamp assignment)
//! - Timestamp parsing and formatting helpers
//! - Configuration file loading
//! - Common error types
//!
//! The `reorder` module is pure: it performs no I/O and never logs. Callers
//! hand it materialized data and report on the structured results.

pub mod config;
pub mod error;
pub mod reorder;
pub mod time;

pub use error::{Error, Result};
pub use reorder::{
    Assignment, LocalRecord, MatchMode, MatchOutcome, MatchedRecord, OffsetMode, ReferenceEntry,
    ReferenceIndex, ReorderSummary, UnmatchedReason, UnmatchedRecord,
};
