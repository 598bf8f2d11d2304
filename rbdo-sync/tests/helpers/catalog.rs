//! Temporary Rekordbox-style catalogs and canned likes lists

use anyhow::Result;
use async_trait::async_trait;
use rbdo_common::{OffsetMode, ReferenceEntry};
use rbdo_sync::services::LikesSource;
use rbdo_sync::{LikesOrigin, SyncConfig};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// One `djmdContent` row under the target folder
pub struct TestTrack {
    pub file_name: &'static str,
    pub title: Option<&'static str>,
    pub created_at: &'static str,
}

impl TestTrack {
    pub fn new(file_name: &'static str, title: Option<&'static str>, created_at: &'static str) -> Self {
        Self {
            file_name,
            title,
            created_at,
        }
    }
}

/// Database directory, target folder and run root inside one temp dir
///
/// `temp_dir` must be kept alive for the duration of the test.
pub struct TestLibrary {
    pub temp_dir: TempDir,
    pub db_dir: PathBuf,
    /// Canonicalized, as the workflow sees it
    pub target_dir: PathBuf,
    pub run_root: PathBuf,
}

impl TestLibrary {
    pub fn track_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.target_dir.display(), file_name)
    }

    pub async fn pool(&self) -> Result<SqlitePool> {
        let db_url = format!("sqlite:{}", self.db_dir.join("master.db").display());
        Ok(SqlitePool::connect(&db_url).await?)
    }
}

/// Create a catalog with `tracks` under `<temp>/music/likes` plus one row
/// in a sibling folder that must never be selected
///
/// Tracks get `ID`s 1, 2, ... in order.
pub async fn create_test_library(tracks: &[TestTrack]) -> Result<TestLibrary> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("rekordbox");
    std::fs::create_dir_all(&db_dir)?;
    let target_dir = temp_dir.path().join("music").join("likes");
    std::fs::create_dir_all(&target_dir)?;
    let target_dir = std::fs::canonicalize(&target_dir)?;
    let run_root = temp_dir.path().join("runs");

    let db_url = format!("sqlite:{}?mode=rwc", db_dir.join("master.db").display());
    let pool = SqlitePool::connect(&db_url).await?;

    sqlx::query(
        r#"
        CREATE TABLE djmdContent (
            ID VARCHAR(255) PRIMARY KEY,
            FolderPath VARCHAR(255),
            Title VARCHAR(255),
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    let outside = format!(
        "{}/likes-archive/A.mp3",
        target_dir.parent().unwrap_or(Path::new("/")).display()
    );
    let mut rows: Vec<(String, Option<&str>, &str)> = tracks
        .iter()
        .map(|t| {
            (
                format!("{}/{}", target_dir.display(), t.file_name),
                t.title,
                t.created_at,
            )
        })
        .collect();
    rows.push((outside, Some("A"), "2020-01-01 00:00:00.000 +00:00"));

    for (i, (path, title, created_at)) in rows.into_iter().enumerate() {
        sqlx::query(
            "INSERT INTO djmdContent (ID, FolderPath, Title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind((i + 1).to_string())
        .bind(path)
        .bind(title.unwrap_or(""))
        .bind(created_at)
        .bind(created_at)
        .execute(&pool)
        .await?;
    }
    pool.close().await;

    Ok(TestLibrary {
        temp_dir,
        db_dir,
        target_dir,
        run_root,
    })
}

/// `(created_at, updated_at)` as stored for `path`
pub async fn read_row(library: &TestLibrary, path: &str) -> Result<(String, String)> {
    let pool = library.pool().await?;
    let row: (String, String) = sqlx::query_as(
        "SELECT CAST(created_at AS TEXT), CAST(updated_at AS TEXT) FROM djmdContent WHERE FolderPath = ?",
    )
    .bind(path)
    .fetch_one(&pool)
    .await?;
    pool.close().await;
    Ok(row)
}

/// Stored `created_at` of the row with catalog `ID` `id`
pub async fn read_created_at(library: &TestLibrary, id: &str) -> Result<String> {
    let pool = library.pool().await?;
    let created_at: String =
        sqlx::query_scalar("SELECT CAST(created_at AS TEXT) FROM djmdContent WHERE ID = ?")
            .bind(id)
            .fetch_one(&pool)
            .await?;
    pool.close().await;
    Ok(created_at)
}

/// Dense-mode settings pointing at `library`
pub fn sync_config(library: &TestLibrary, apply: bool) -> SyncConfig {
    SyncConfig {
        db_dir: library.db_dir.clone(),
        target_dir: library.target_dir.clone(),
        likes: LikesOrigin::Url("https://soundcloud.com/test/likes".to_string()),
        step_seconds: 1,
        anchor_datetime: None,
        offset_mode: OffsetMode::Dense,
        run_root: library.run_root.clone(),
        apply,
        fetch_timeout: Duration::from_secs(5),
        ytdlp_binary: "yt-dlp".to_string(),
        log_level: "info".to_string(),
    }
}

/// Canned likes list
pub struct StaticLikes(pub Vec<ReferenceEntry>);

impl StaticLikes {
    /// Titles ranked 1.. in the given order
    pub fn titled(titles: &[&str]) -> Self {
        Self(
            titles
                .iter()
                .enumerate()
                .map(|(i, title)| {
                    let rank = (i + 1) as u32;
                    ReferenceEntry::new(
                        rank,
                        format!("{}", 1000 + rank),
                        *title,
                        format!("https://soundcloud.com/artist/track-{}", rank),
                    )
                })
                .collect(),
        )
    }
}

#[async_trait]
impl LikesSource for StaticLikes {
    fn describe(&self) -> String {
        "static://test".to_string()
    }

    async fn fetch(&self) -> rbdo_sync::Result<Vec<ReferenceEntry>> {
        Ok(self.0.clone())
    }
}
