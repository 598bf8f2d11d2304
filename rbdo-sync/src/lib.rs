//! rbdo-sync library interface
//!
//! Exposes the workflow and its collaborators for the binary and for
//! integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod manifest;
pub mod services;
pub mod workflow;

pub use crate::config::{Args, LikesOrigin, SyncConfig};
pub use crate::error::{exit_code, Result, SyncError};
pub use crate::workflow::{run, RunReport};
