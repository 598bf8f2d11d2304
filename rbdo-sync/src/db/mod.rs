//! Catalog database access
//!
//! The catalog is a Rekordbox-style SQLite database whose `djmdContent`
//! table holds one row per track. Rows are read by `FolderPath` prefix and
//! written by `ID`; only `created_at`, `updated_at` and `rb_local_usn` (when
//! present) are changed.

pub mod content;

pub use content::{
    apply_assignments, count_present, load_records, load_timestamps_by_row, ApplyOutcome,
};

use crate::error::Result;
use rbdo_common::Error;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Catalog file name inside the Rekordbox database directory
pub const CATALOG_FILE: &str = "master.db";

/// How long a statement waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open an existing catalog for reading and writing
///
/// Never creates the file: a missing catalog is a configuration error.
/// A single connection keeps the apply transaction and the read-back on
/// the same handle.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::Config(format!("master.db not found at: {}", db_path.display())).into());
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(false)
        .busy_timeout(BUSY_TIMEOUT);

    tracing::debug!(path = %db_path.display(), "Connecting to catalog database");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// True when `err` means another process holds the database lock
pub fn is_lock_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            // SQLITE_BUSY (5) / SQLITE_LOCKED (6) and their extended codes
            let code_is_lock = db_err
                .code()
                .and_then(|code| code.parse::<i64>().ok())
                .map(|code| matches!(code & 0xff, 5 | 6))
                .unwrap_or(false);
            let message = db_err.message().to_ascii_lowercase();
            code_is_lock || message.contains("locked") || message.contains("busy")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_missing_catalog_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = connect(&temp_dir.path().join(CATALOG_FILE)).await.unwrap_err();

        assert!(matches!(err, SyncError::Common(Error::Config(_))));
        assert!(!temp_dir.path().join(CATALOG_FILE).exists());
    }

    #[tokio::test]
    async fn test_connect_existing_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CATALOG_FILE);
        std::fs::File::create(&path).unwrap();

        let pool = connect(&path).await.unwrap();
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_non_database_errors_are_not_lock_errors() {
        assert!(!is_lock_error(&sqlx::Error::RowNotFound));
    }
}
