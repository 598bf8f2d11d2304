//! Error types for rbdo-sync
//!
//! Every failure maps to a process exit code so scripted callers can tell a
//! bad invocation from a no-op run or a blocked commit.

use thiserror::Error;

/// Process exit codes
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const RUNTIME_FAILURE: i32 = 1;
    pub const INVALID_CONFIG: i32 = 2;
    pub const NOTHING_TO_DO: i32 = 3;
    pub const COMMIT_BLOCKED: i32 = 4;
}

/// Main error type for rbdo-sync
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required external command is not installed
    #[error("Missing required command: {0}")]
    MissingDependency(String),

    /// Reference list could not be fetched or parsed
    #[error("Likes fetch failed: {0}")]
    Fetch(String),

    /// No catalog rows under the target prefix
    #[error("No djmdContent rows found under target-dir prefix: {0}")]
    NoRecords(String),

    /// Matching produced zero matches
    #[error("No tracks matched SoundCloud likes titles; nothing to do")]
    NothingMatched,

    /// Catalog write lock unavailable, or Rekordbox is running
    #[error("Commit blocked. Close Rekordbox and retry with --apply. Reason: {0}")]
    CommitBlocked(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// rbdo-common error
    #[error(transparent)]
    Common(#[from] rbdo_common::Error),
}

impl SyncError {
    /// Exit code reported by the binary for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::Common(rbdo_common::Error::Config(_)) => exit_code::INVALID_CONFIG,
            SyncError::Common(rbdo_common::Error::Precondition(_)) => exit_code::NOTHING_TO_DO,
            SyncError::NoRecords(_) | SyncError::NothingMatched => exit_code::NOTHING_TO_DO,
            SyncError::CommitBlocked(_) => exit_code::COMMIT_BLOCKED,
            SyncError::MissingDependency(_)
            | SyncError::Fetch(_)
            | SyncError::Database(_)
            | SyncError::Io(_)
            | SyncError::Common(_) => exit_code::RUNTIME_FAILURE,
        }
    }
}

/// Convenience Result type using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;
