//! SoundCloud likes client
//!
//! Supplies the ranked reference list. The live source shells out to
//! `yt-dlp --flat-playlist -J`; the file source replays the `sc_likes.tsv`
//! manifest written by an earlier run so a dry run and its apply run can
//! share exactly the same list.

use crate::error::{Result, SyncError};
use crate::manifest::LIKES_HEADER;
use async_trait::async_trait;
use rbdo_common::ReferenceEntry;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Source of the ranked reference list
#[async_trait]
pub trait LikesSource: Send + Sync {
    /// Human-readable origin, recorded in run metadata
    fn describe(&self) -> String;

    /// Fetch the full list, rank 1 first
    ///
    /// # Errors
    /// Fails rather than returning an empty list.
    async fn fetch(&self) -> Result<Vec<ReferenceEntry>>;
}

/// `yt-dlp -J` flat playlist payload (only the fields we use)
#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Option<Vec<Option<FlatEntry>>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
}

fn id_to_string(id: Option<&serde_json::Value>) -> String {
    match id {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse `yt-dlp --flat-playlist -J` output
///
/// Rank is the 1-based position in `entries`, counting skipped slots, so
/// removed or untitled likes leave gaps instead of shifting later ranks.
/// Null entries and entries with a blank title are skipped.
pub fn parse_flat_playlist(payload: &str, origin: &str) -> Result<Vec<ReferenceEntry>> {
    let playlist: FlatPlaylist = serde_json::from_str(payload)
        .map_err(|e| SyncError::Fetch(format!("Failed to parse yt-dlp JSON output: {}", e)))?;

    let mut likes = Vec::new();
    for (i, entry) in playlist.entries.unwrap_or_default().into_iter().enumerate() {
        let Some(entry) = entry else { continue };
        let title = entry.title.as_deref().unwrap_or("").trim();
        if title.is_empty() {
            continue;
        }
        let rank = u32::try_from(i + 1)
            .map_err(|_| SyncError::Fetch("likes list too long".to_string()))?;
        let url = entry
            .url
            .filter(|u| !u.is_empty())
            .or(entry.webpage_url)
            .unwrap_or_default();

        likes.push(ReferenceEntry::new(
            rank,
            id_to_string(entry.id.as_ref()),
            title,
            url,
        ));
    }

    if likes.is_empty() {
        return Err(SyncError::Fetch(format!("No likes entries found at: {}", origin)));
    }
    Ok(likes)
}

/// Live likes list via yt-dlp
pub struct YtDlpLikesSource {
    binary: String,
    url: String,
    timeout: Duration,
}

impl YtDlpLikesSource {
    pub fn new(binary: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LikesSource for YtDlpLikesSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<ReferenceEntry>> {
        tracing::debug!(binary = %self.binary, url = %self.url, "Running yt-dlp flat playlist fetch");

        let run = Command::new(&self.binary)
            .args(["--flat-playlist", "-J", &self.url])
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Err(_) => {
                return Err(SyncError::Fetch(format!(
                    "yt-dlp timed out after {}s while fetching likes URL '{}'",
                    self.timeout.as_secs(),
                    self.url
                )))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::MissingDependency(self.binary.clone()))
            }
            Ok(Err(e)) => return Err(SyncError::Fetch(format!("Failed to execute yt-dlp: {}", e))),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(SyncError::Fetch(format!(
                "yt-dlp failed ({}) while fetching likes URL '{}'. stderr: {}",
                code,
                self.url,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let likes = parse_flat_playlist(&stdout, &self.url)?;
        tracing::info!(count = likes.len(), "Fetched SoundCloud likes");
        Ok(likes)
    }
}

/// Parse an `sc_likes.tsv` manifest (`sc_index sc_id sc_title sc_url`)
///
/// The first line must be the manifest header; any other file is rejected
/// rather than having its first row silently dropped.
pub fn parse_likes_tsv(content: &str, origin: &str) -> Result<Vec<ReferenceEntry>> {
    let header = content.lines().next().unwrap_or("");
    let columns: Vec<&str> = header.trim_end_matches('\r').split('\t').collect();
    if columns != LIKES_HEADER {
        return Err(SyncError::Fetch(format!(
            "{}: expected header '{}', found '{}'",
            origin,
            LIKES_HEADER.join("\t"),
            header.trim_end()
        )));
    }

    let mut likes = Vec::new();

    for (line_no, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(4, '\t');
        let rank_field = fields.next().unwrap_or("");
        let rank: u32 = rank_field.trim().parse().map_err(|_| {
            SyncError::Fetch(format!(
                "{}:{}: invalid sc_index '{}'",
                origin,
                line_no + 1,
                rank_field
            ))
        })?;
        let id = fields.next().unwrap_or("");
        let title = fields.next().unwrap_or("").trim();
        let url = fields.next().unwrap_or("");
        if title.is_empty() {
            continue;
        }
        likes.push(ReferenceEntry::new(rank, id, title, url));
    }

    if likes.is_empty() {
        return Err(SyncError::Fetch(format!("No likes entries found at: {}", origin)));
    }
    likes.sort_by_key(|e| e.rank);
    Ok(likes)
}

/// Likes list replayed from an earlier run's manifest
pub struct TsvLikesSource {
    path: PathBuf,
}

impl TsvLikesSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl LikesSource for TsvLikesSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn fetch(&self) -> Result<Vec<ReferenceEntry>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let likes = parse_likes_tsv(&content, &self.path.display().to_string())?;
        tracing::info!(count = likes.len(), path = %self.path.display(), "Loaded likes from manifest");
        Ok(likes)
    }
}
