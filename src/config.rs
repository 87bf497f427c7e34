//! # Configuration Module
//!
//! Runtime configuration for mpdgrep: where the snapshot cache lives and how
//! to reach MPD. There is deliberately no config file — MPD connection
//! settings come from the same `MPD_HOST`/`MPD_PORT` environment variables
//! every other MPD client honors, and the cache goes in the platform data
//! directory:
//!
//! - Linux: `~/.local/share/mpdgrep/`
//! - macOS: `~/Library/Application Support/mpdgrep/`
//! - Windows: `%APPDATA%\mpdgrep\`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Platform data directory for mpdgrep, created on first use.
///
/// # Errors
///
/// Fails when the platform has no standard data directory or the mpdgrep
/// subdirectory cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("could not determine the system data directory")?;

    let dir = data_dir.join("mpdgrep");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory at {}", dir.display()))?;

    Ok(dir)
}

/// Path of the snapshot cache database.
pub fn get_cache_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("mpddb.sqlite"))
}

/// Resolved runtime configuration, threaded explicitly through the program
/// instead of living in ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Snapshot cache location.
    pub cache_path: PathBuf,
    /// MPD host, from `MPD_HOST` when set.
    pub mpd_host: Option<String>,
    /// MPD port, from `MPD_PORT` when set.
    pub mpd_port: Option<String>,
}

impl RuntimeConfig {
    /// Resolve configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cache_path: get_cache_path()?,
            mpd_host: std::env::var("MPD_HOST").ok(),
            mpd_port: std::env::var("MPD_PORT").ok(),
        })
    }

    /// Configuration with an explicit cache path, for tests and embedders.
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self {
            cache_path,
            mpd_host: None,
            mpd_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_path_is_stable_and_absolute() {
        let first = get_cache_path().unwrap();
        let second = get_cache_path().unwrap();
        assert_eq!(first, second);
        assert!(first.is_absolute());
        assert!(first.to_string_lossy().ends_with("mpddb.sqlite"));
    }

    #[test]
    fn data_dir_is_created() {
        let dir = get_data_dir().unwrap();
        assert!(dir.exists());
        assert!(dir.is_dir());
        assert_eq!(dir.file_name().unwrap(), "mpdgrep");
    }
}
