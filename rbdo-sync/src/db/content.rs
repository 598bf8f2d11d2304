//! `djmdContent` queries
//!
//! Loads the records under a folder prefix and writes assigned "date added"
//! values back inside a single transaction. Rows are addressed by `ID`.

use super::is_lock_error;
use crate::error::{Result, SyncError};
use chrono::NaiveDateTime;
use rbdo_common::time::{format_stored, parse_stored};
use rbdo_common::{Assignment, LocalRecord};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;

/// Registry key holding Rekordbox's global local update counter
const LOCAL_UPDATE_COUNT: &str = "localUpdateCount";

/// Result of a committed apply pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Rows changed by the UPDATE statements
    pub rows_touched: u64,
    /// Local update sequence number after the commit, when the catalog
    /// tracks one
    pub local_usn: Option<i64>,
}

/// Load every record whose `FolderPath` starts with `prefix`
///
/// The prefix comparison is exact (case-sensitive, no wildcards). Empty
/// titles are treated as absent and unparsable timestamps as missing.
pub async fn load_records(pool: &SqlitePool, prefix: &str) -> Result<Vec<LocalRecord>> {
    let prefix_len = i64::try_from(prefix.chars().count()).unwrap_or(i64::MAX);

    let rows: Vec<(Option<String>, String, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT CAST(ID AS TEXT), FolderPath, Title, CAST(created_at AS TEXT)
        FROM djmdContent
        WHERE FolderPath IS NOT NULL AND substr(FolderPath, 1, ?) = ?
        ORDER BY rowid
        "#,
    )
    .bind(prefix_len)
    .bind(prefix)
    .fetch_all(pool)
    .await?;

    let mut unparsable = 0usize;
    let records: Vec<LocalRecord> = rows
        .into_iter()
        .map(|(id, path, title, created_at)| {
            let existing = created_at.as_deref().and_then(parse_stored);
            if existing.is_none() && created_at.as_deref().is_some_and(|s| !s.trim().is_empty()) {
                unparsable += 1;
            }
            let record = LocalRecord::new(path, title.filter(|t| !t.is_empty()), existing);
            match id {
                Some(id) => record.with_row_id(id),
                None => record,
            }
        })
        .collect();

    if unparsable > 0 {
        tracing::warn!(count = unparsable, "Ignoring unparsable created_at values");
    }
    tracing::debug!(prefix = %prefix, count = records.len(), "Loaded catalog records");

    Ok(records)
}

/// Stored `created_at` per row key under `prefix`, for the applied manifest
///
/// Keys follow [`LocalRecord::row_key`].
pub async fn load_timestamps_by_row(
    pool: &SqlitePool,
    prefix: &str,
) -> Result<HashMap<String, Option<NaiveDateTime>>> {
    Ok(load_records(pool, prefix)
        .await?
        .into_iter()
        .map(|r| (r.row_key().to_string(), r.existing_timestamp))
        .collect())
}

fn lock_aware(err: sqlx::Error) -> SyncError {
    if is_lock_error(&err) {
        SyncError::CommitBlocked(err.to_string())
    } else {
        SyncError::Database(err)
    }
}

async fn has_column(tx: &mut Transaction<'_, Sqlite>, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(&mut **tx)
            .await
            .map_err(lock_aware)?;
    Ok(count > 0)
}

/// Current local USN: the registry counter, else the highest row value
async fn current_local_usn(tx: &mut Transaction<'_, Sqlite>) -> Result<(i64, bool)> {
    let registry: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'agentRegistry'",
    )
    .fetch_one(&mut **tx)
    .await
    .map_err(lock_aware)?;

    if registry > 0 {
        let counter: Option<Option<i64>> =
            sqlx::query_scalar("SELECT int_1 FROM agentRegistry WHERE registry_id = ?")
                .bind(LOCAL_UPDATE_COUNT)
                .fetch_optional(&mut **tx)
                .await
                .map_err(lock_aware)?;
        if let Some(counter) = counter {
            return Ok((counter.unwrap_or(0), true));
        }
    }

    let max_row: Option<i64> =
        sqlx::query_scalar("SELECT MAX(rb_local_usn) FROM djmdContent")
            .fetch_one(&mut **tx)
            .await
            .map_err(lock_aware)?;
    Ok((max_row.unwrap_or(0), false))
}

/// Write assignments in one transaction and commit
///
/// Each assignment updates its row by `ID` (by `FolderPath` when the record
/// carries no id). When the catalog has an `rb_local_usn` column every
/// changed row gets the next local USN and the registry counter is advanced,
/// so Rekordbox sees the rows as locally modified. A busy or locked database
/// at any point maps to [`SyncError::CommitBlocked`]; nothing is partially
/// applied.
pub async fn apply_assignments(
    pool: &SqlitePool,
    assignments: &[Assignment],
    touched_at: NaiveDateTime,
) -> Result<ApplyOutcome> {
    let updated_at = format_stored(touched_at);
    let mut tx = pool.begin().await.map_err(lock_aware)?;

    let mut usn = if has_column(&mut tx, "djmdContent", "rb_local_usn").await? {
        Some(current_local_usn(&mut tx).await?)
    } else {
        None
    };
    let set_clause = if usn.is_some() {
        "created_at = ?, updated_at = ?, rb_local_usn = ?"
    } else {
        "created_at = ?, updated_at = ?"
    };
    let mut rows_touched = 0u64;

    for assignment in assignments {
        let (filter, key) = match assignment.record.row_id.as_deref() {
            Some(id) => ("ID = ?", id),
            None => ("FolderPath = ?", assignment.record.path.as_str()),
        };
        let sql = format!("UPDATE djmdContent SET {} WHERE {}", set_clause, filter);

        let mut query = sqlx::query(&sql)
            .bind(format_stored(assignment.new_timestamp))
            .bind(&updated_at);
        if let Some((counter, _)) = usn.as_mut() {
            *counter += 1;
            query = query.bind(*counter);
        }
        let result = query.bind(key).execute(&mut *tx).await.map_err(lock_aware)?;

        rows_touched += result.rows_affected();
    }

    if let Some((counter, true)) = usn {
        sqlx::query("UPDATE agentRegistry SET int_1 = ? WHERE registry_id = ?")
            .bind(counter)
            .bind(LOCAL_UPDATE_COUNT)
            .execute(&mut *tx)
            .await
            .map_err(lock_aware)?;
    }

    tx.commit().await.map_err(lock_aware)?;
    let local_usn = usn.map(|(counter, _)| counter);
    tracing::info!(rows = rows_touched, local_usn = ?local_usn, "Committed date-added updates");

    Ok(ApplyOutcome {
        rows_touched,
        local_usn,
    })
}

/// Rows an apply pass would touch, from a read-back taken without writing
pub fn count_present(
    assignments: &[Assignment],
    stored: &HashMap<String, Option<NaiveDateTime>>,
) -> u64 {
    assignments
        .iter()
        .filter(|a| stored.contains_key(a.record.row_key()))
        .count() as u64
}
