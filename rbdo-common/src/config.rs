//! Configuration file loading and default locations
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)
//!
//! Levels 1 and 2 are handled by the binary's argument parser; this module
//! covers the TOML file and the built-in defaults.

use crate::reorder::OffsetMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config/data dirs
const APP_DIR: &str = "rbdo";

/// Default TOML file name for the sync tool
pub const DEFAULT_CONFIG_FILE: &str = "rbdo-sync.toml";

/// Built-in defaults
pub const DEFAULT_STEP_SECONDS: i64 = 1;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";

/// Optional settings file
///
/// Every field may be omitted; a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Seconds between consecutive assigned timestamps
    pub step_seconds: Option<i64>,

    /// `"dense"` or `"rank-gap"`
    pub offset_mode: Option<OffsetMode>,

    /// Directory that receives per-run manifest folders
    pub run_root: Option<PathBuf>,

    /// Upper bound for one reference-list fetch
    pub fetch_timeout_secs: Option<u64>,

    /// yt-dlp executable name or path
    pub ytdlp_binary: Option<String>,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load settings
    ///
    /// With an explicit path the file must exist. Without one, the platform
    /// default location is tried and a missing file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn step_seconds_or_default(&self) -> i64 {
        self.step_seconds.unwrap_or(DEFAULT_STEP_SECONDS)
    }

    pub fn fetch_timeout_secs_or_default(&self) -> u64 {
        self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS)
    }

    pub fn ytdlp_binary_or_default(&self) -> String {
        self.ytdlp_binary
            .clone()
            .unwrap_or_else(|| DEFAULT_YTDLP_BINARY.to_string())
    }
}

/// Default config file location: `<config_dir>/rbdo/rbdo-sync.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Default manifest root: `<data_local_dir>/rbdo/runs`
pub fn default_run_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join("runs"))
        .unwrap_or_else(|| PathBuf::from("./rbdo_runs"))
}

/// Expand a leading `~` to the home directory; other paths pass through
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve the manifest root: CLI/env value, then TOML, then default
pub fn resolve_run_root(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = &toml.run_root {
        return path.clone();
    }
    default_run_root()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.step_seconds_or_default(), 1);
        assert_eq!(config.fetch_timeout_secs_or_default(), 300);
        assert_eq!(config.ytdlp_binary_or_default(), "yt-dlp");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_toml_parses() {
        let config = TomlConfig::from_toml_str(
            r#"
            step_seconds = 60
            offset_mode = "rank-gap"
            run_root = "/tmp/runs"
            fetch_timeout_secs = 30
            ytdlp_binary = "/opt/bin/yt-dlp"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.step_seconds, Some(60));
        assert_eq!(config.offset_mode, Some(OffsetMode::RankGap));
        assert_eq!(config.run_root, Some(PathBuf::from("/tmp/runs")));
        assert_eq!(config.fetch_timeout_secs_or_default(), 30);
        assert_eq!(config.ytdlp_binary_or_default(), "/opt/bin/yt-dlp");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("offset_mode = \"sideways\"").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_run_root_priority() {
        let toml = TomlConfig {
            run_root: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        assert_eq!(
            resolve_run_root(Some(Path::new("/from/cli")), &toml),
            PathBuf::from("/from/cli")
        );
        assert_eq!(resolve_run_root(None, &toml), PathBuf::from("/from/toml"));
        assert!(resolve_run_root(None, &TomlConfig::default()).ends_with("runs"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        assert_eq!(expand_home(Path::new("rel/~x")), PathBuf::from("rel/~x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/Music")), home.join("Music"));
        }
    }
}
