//! Command-line interface for `issue_tracker`.
//!
//! The service takes no subcommands: flags select the config file, the
//! bind address, and the database path, each overridable via
//! `ISSUE_TRACKER_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// `issue_tracker` (issue-tracker) - Project-scoped issue tracker REST service.
#[derive(Parser, Debug)]
#[command(name = "issue-tracker")]
#[command(
    author,
    version,
    about = "Project-scoped issue tracker REST service (axum + SQLite)",
    long_about = None
)]
pub struct Cli {
    /// Path to a YAML config file (keys: bind, db, log-file)
    #[arg(long, env = "ISSUE_TRACKER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Socket address to listen on
    #[arg(long, env = "ISSUE_TRACKER_BIND", value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Path to the SQLite database file
    #[arg(long, env = "ISSUE_TRACKER_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Append JSON-formatted logs to this file
    #[arg(long, env = "ISSUE_TRACKER_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}
