//! Configuration management for `issue_tracker`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI flags / `ISSUE_TRACKER_*` environment variables
//! 2. YAML config file (`--config` / `ISSUE_TRACKER_CONFIG`)
//! 3. Defaults

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use tracker_lib::error::{Result, TrackerError};

/// Default listen address used when nothing else is configured.
const DEFAULT_BIND: &str = "127.0.0.1:3000";
/// Default database filename used when nothing else is configured.
const DEFAULT_DB_FILENAME: &str = "issue-tracker.db";

/// Settings read from the optional YAML config file.
///
/// Every key is optional; missing keys fall through to the next layer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub bind: Option<String>,
    pub db: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Load the config file at `path`. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TrackerError::config(format!("invalid config file {}: {e}", path.display())))
    }
}

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub db: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve the effective configuration from CLI flags and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if a
    /// configured bind address is malformed.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::from_layers(&file, cli.bind, cli.db.clone(), cli.log_file.clone())
    }

    /// Merge the file layer with per-setting overrides (overrides win).
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address from the file layer is malformed.
    pub fn from_layers(
        file: &FileConfig,
        bind: Option<SocketAddr>,
        db: Option<PathBuf>,
        log_file: Option<PathBuf>,
    ) -> Result<Self> {
        let bind = match bind {
            Some(addr) => addr,
            None => parse_bind(file.bind.as_deref().unwrap_or(DEFAULT_BIND))?,
        };
        let db = db
            .or_else(|| file.db.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME));
        let log_file = log_file.or_else(|| file.log_file.clone());

        Ok(Self { bind, db, log_file })
    }
}

fn parse_bind(value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| TrackerError::config(format!("invalid bind address '{value}': {e}")))
}
