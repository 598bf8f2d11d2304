//! Command-line arguments and resolved run settings
//!
//! `Args` covers the first two priority levels (flag, then environment
//! variable); [`SyncConfig::resolve`] folds in the TOML file and built-in
//! defaults.

use crate::services::{LikesSource, TsvLikesSource, YtDlpLikesSource};
use clap::Parser;
use rbdo_common::config::{expand_home, resolve_run_root, TomlConfig};
use rbdo_common::{Error, OffsetMode, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments for rbdo-sync
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rbdo-sync")]
#[command(about = "Reorder Rekordbox \"date added\" to follow SoundCloud likes order")]
#[command(version)]
pub struct Args {
    /// Rekordbox database directory (contains master.db)
    #[arg(long, env = "RBDO_DB_DIR")]
    pub db_dir: PathBuf,

    /// Target track folder inside the Rekordbox collection
    #[arg(long, env = "RBDO_TARGET_DIR")]
    pub target_dir: PathBuf,

    /// SoundCloud likes URL, fetched with yt-dlp
    #[arg(long, env = "RBDO_LIKES_URL")]
    pub likes_url: Option<String>,

    /// Replay the likes list from an earlier run's sc_likes.tsv
    #[arg(long)]
    pub likes_file: Option<PathBuf>,

    /// Seconds between consecutive liked tracks (>= 1)
    #[arg(long, allow_negative_numbers = true)]
    pub step_seconds: Option<i64>,

    /// Timestamp for the newest like (default: newest existing date among matches)
    #[arg(long)]
    pub anchor_datetime: Option<String>,

    /// Offset by like index instead of dense matched order
    #[arg(long)]
    pub use_like_index_offset: bool,

    /// Directory for per-run manifest folders
    #[arg(long)]
    pub run_root: Option<PathBuf>,

    /// Persist changes to master.db (default is a dry run)
    #[arg(long)]
    pub apply: bool,

    /// Settings file (default: <config_dir>/rbdo/rbdo-sync.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Where the ranked reference list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikesOrigin {
    Url(String),
    File(PathBuf),
}

impl LikesOrigin {
    fn from_args(url: Option<&str>, file: Option<&Path>) -> Result<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        match (url, file) {
            (Some(_), Some(_)) => Err(Error::Config(
                "use either --likes-url or --likes-file, not both".to_string(),
            )),
            (Some(url), None) => Ok(LikesOrigin::Url(url.to_string())),
            (None, Some(file)) => Ok(LikesOrigin::File(expand_home(file))),
            (None, None) => Err(Error::Config(
                "one of --likes-url or --likes-file is required".to_string(),
            )),
        }
    }

    /// Value recorded in run metadata
    pub fn describe(&self) -> String {
        match self {
            LikesOrigin::Url(url) => url.clone(),
            LikesOrigin::File(path) => format!("file://{}", path.display()),
        }
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub db_dir: PathBuf,
    pub target_dir: PathBuf,
    pub likes: LikesOrigin,
    pub step_seconds: i64,
    pub anchor_datetime: Option<String>,
    pub offset_mode: OffsetMode,
    pub run_root: PathBuf,
    pub apply: bool,
    pub fetch_timeout: Duration,
    pub ytdlp_binary: String,
    pub log_level: String,
}

impl SyncConfig {
    /// Merge parsed arguments with the settings file
    ///
    /// Value ranges (step, anchor format, paths on disk) are checked later,
    /// at the start of the run.
    pub fn resolve(args: Args, toml: TomlConfig) -> Result<Self> {
        let likes = LikesOrigin::from_args(args.likes_url.as_deref(), args.likes_file.as_deref())?;

        let offset_mode = if args.use_like_index_offset {
            OffsetMode::RankGap
        } else {
            toml.offset_mode.unwrap_or_default()
        };

        let run_root = expand_home(&resolve_run_root(args.run_root.as_deref(), &toml));

        Ok(Self {
            db_dir: expand_home(&args.db_dir),
            target_dir: expand_home(&args.target_dir),
            likes,
            step_seconds: args.step_seconds.unwrap_or_else(|| toml.step_seconds_or_default()),
            anchor_datetime: args.anchor_datetime,
            offset_mode,
            run_root,
            apply: args.apply,
            fetch_timeout: Duration::from_secs(toml.fetch_timeout_secs_or_default()),
            ytdlp_binary: toml.ytdlp_binary_or_default(),
            log_level: toml.logging.level.clone(),
        })
    }

    /// Parse arguments and load the settings file they point at
    pub fn from_args(args: Args) -> Result<Self> {
        let toml = TomlConfig::load(args.config.as_deref())?;
        Self::resolve(args, toml)
    }

    /// Build the reference-list collaborator for this run
    pub fn likes_source(&self) -> Box<dyn LikesSource> {
        match &self.likes {
            LikesOrigin::Url(url) => Box::new(YtDlpLikesSource::new(
                self.ytdlp_binary.clone(),
                url.clone(),
                self.fetch_timeout,
            )),
            LikesOrigin::File(path) => Box::new(TsvLikesSource::new(path)),
        }
    }
}
