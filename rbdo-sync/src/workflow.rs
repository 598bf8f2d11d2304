//! Run workflow
//!
//! Wires the reorder engine between its collaborators:
//! 1. Validate settings and create the run directory
//! 2. Fetch the ranked likes list (`sc_likes.tsv`)
//! 3. Load catalog records under the target prefix
//! 4. Match (`matched.tsv`, `unmatched.tsv`)
//! 5. Assign timestamps (`planned_updates.tsv`, `run_meta.txt`)
//! 6. Apply in one transaction (`--apply` only; a dry run never writes)
//! 7. Re-read stored values (`applied_updates.tsv`)

use crate::config::SyncConfig;
use crate::db::{self, CATALOG_FILE};
use crate::error::{Result, SyncError};
use crate::manifest::{RunManifest, RunMeta};
use crate::services::{ensure_rekordbox_closed, LikesSource};
use chrono::NaiveDateTime;
use rbdo_common::reorder::{reconcile, Reconciliation, ReorderConfig};
use rbdo_common::time::{self, format_manifest};
use rbdo_common::{Error, ReorderSummary, UnmatchedRecord};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub summary: ReorderSummary,
    /// Timestamp given to the rank-1 match
    pub anchor: NaiveDateTime,
    /// Rows changed, or for a dry run the rows an apply would change
    pub rows_touched: u64,
    /// False for a dry run
    pub applied: bool,
}

impl RunReport {
    /// `key=value` lines for the terminal
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("run_dir={}", self.run_dir.display()),
            format!("matched={}", self.summary.matched),
            format!("unmatched={}", self.summary.unmatched),
            format!("exact={}", self.summary.exact),
            format!("normalized={}", self.summary.normalized),
            format!("collisions={}", self.summary.collisions),
            format!("anchor_datetime={}", format_manifest(Some(self.anchor))),
            format!("rows_touched={}", self.rows_touched),
        ];
        if !self.applied {
            lines.push("dry_run=1 (no changes written)".to_string());
        }
        lines
    }
}

/// Existing directory, canonicalized
fn existing_dir(path: &Path, what: &str) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(Error::Config(format!("{} does not exist: {}", what, path.display())).into());
    }
    Ok(std::fs::canonicalize(path)?)
}

fn target_prefix(target_dir: &Path) -> String {
    format!("{}/", target_dir.display().to_string().trim_end_matches('/'))
}

/// Execute one reconciliation run
///
/// Manifests written before a failure stay on disk; a zero-match run still
/// leaves `matched.tsv` and `unmatched.tsv` behind.
pub async fn run(config: &SyncConfig, source: &dyn LikesSource) -> Result<RunReport> {
    // Step 1: validate everything before touching the catalog
    let reorder_config = ReorderConfig::from_raw(
        config.step_seconds,
        config.anchor_datetime.as_deref(),
        config.offset_mode,
    )?;

    let db_dir = existing_dir(&config.db_dir, "db-dir")?;
    let db_path = db_dir.join(CATALOG_FILE);
    if !db_path.is_file() {
        return Err(Error::Config(format!("master.db not found at: {}", db_path.display())).into());
    }
    let target_dir = existing_dir(&config.target_dir, "target-dir")?;

    let started_at = time::now_local();
    let run_id = time::run_id(started_at);
    let manifest = RunManifest::create(&config.run_root, &run_id)?;
    info!(run_id = %run_id, dir = %manifest.dir().display(), "Starting run");

    // Step 2: reference list
    info!(source = %source.describe(), "Fetching SoundCloud likes order");
    let likes = source.fetch().await?;
    manifest.write_likes(&likes)?;

    // Step 3: catalog records
    let prefix = target_prefix(&target_dir);
    let pool = db::connect(&db_path).await?;
    let records = db::load_records(&pool, &prefix).await?;
    if records.is_empty() {
        pool.close().await;
        return Err(SyncError::NoRecords(prefix));
    }
    info!(count = records.len(), prefix = %prefix, "Loaded catalog records");

    // Step 4: matching
    let reconciliation = reconcile(&likes, &records, &reorder_config, started_at)?;
    let report = reconciliation.report();
    let summary = report.summary;
    let unmatched: Vec<&UnmatchedRecord> = report
        .outcomes
        .iter()
        .filter_map(|o| o.as_unmatched())
        .collect();
    manifest.write_matched(&report.matched_by_rank())?;
    manifest.write_unmatched(&unmatched)?;
    info!(
        matched = summary.matched,
        unmatched = summary.unmatched,
        exact = summary.exact,
        normalized = summary.normalized,
        "Matched catalog records to likes"
    );

    let plan = match reconciliation {
        Reconciliation::Planned(plan) => plan,
        Reconciliation::NothingMatched(_) => {
            pool.close().await;
            return Err(SyncError::NothingMatched);
        }
    };

    if summary.collisions > 0 {
        warn!(
            collisions = summary.collisions,
            "Several catalog records matched the same like"
        );
    }

    // Step 5: plan and metadata
    manifest.write_planned(&plan.assignments)?;

    let mut meta = RunMeta::new();
    meta.push("run_id", &run_id)
        .push("db_dir", db_dir.display())
        .push("db_path", db_path.display())
        .push("target_dir", target_dir.display())
        .push("likes_source", config.likes.describe())
        .push("step_seconds", config.step_seconds)
        .push("offset_mode", config.offset_mode.as_str())
        .push(
            "use_like_index_offset",
            u8::from(config.offset_mode == rbdo_common::OffsetMode::RankGap),
        )
        .push("anchor_datetime", format_manifest(Some(plan.anchor)))
        .push("apply", u8::from(config.apply))
        .push("matched", summary.matched)
        .push("unmatched", summary.unmatched)
        .push("collisions", summary.collisions)
        .push("started_at", started_at.format("%Y-%m-%d %H:%M:%S"));
    manifest.write_meta(&meta)?;
    info!(
        anchor = %format_manifest(Some(plan.anchor)),
        mode = config.offset_mode.as_str(),
        updates = plan.assignments.len(),
        "Planned date-added updates"
    );

    // Step 6: apply; a dry run reads only, so another process holding the
    // catalog lock cannot block it
    let applied = if config.apply {
        ensure_rekordbox_closed()?;
        info!("Applying changes to master.db");
        let outcome = db::apply_assignments(&pool, &plan.assignments, time::now_local()).await?;
        if let Some(usn) = outcome.local_usn {
            info!(local_usn = usn, "Advanced local update counter");
        }
        Some(outcome)
    } else {
        info!("Dry run: master.db left unchanged");
        None
    };

    // Step 7: read back what the catalog now holds
    let stored = db::load_timestamps_by_row(&pool, &prefix).await?;
    manifest.write_applied(&plan.assignments, &stored)?;
    pool.close().await;

    let rows_touched = match &applied {
        Some(outcome) => outcome.rows_touched,
        None => db::count_present(&plan.assignments, &stored),
    };
    info!(run_id = %run_id, applied = config.apply, rows = rows_touched, "Run complete");

    Ok(RunReport {
        run_id,
        run_dir: manifest.dir().to_path_buf(),
        summary,
        anchor: plan.anchor,
        rows_touched,
        applied: config.apply,
    })
}
