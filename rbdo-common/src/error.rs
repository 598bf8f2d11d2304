//! Common error types for RBDO

use thiserror::Error;

/// Common result type for RBDO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across RBDO crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    ///
    /// Raised at the configuration boundary, before any matching or
    /// assignment runs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input collection violates an operation precondition (e.g. empty)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True for errors detected at the configuration boundary
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
