//! `issue_tracker` - Project-scoped issue tracker REST service
//!
//! This crate provides the HTTP service around the `tracker-lib` core:
//! clients create, list, update, and delete issue records scoped to a
//! project, persisted in `SQLite`.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered service configuration (defaults, YAML, flags)
//! - [`http`] - axum router and request handlers
//! - [`logging`] - tracing subscriber setup
//! - [`storage`] - `SQLite` store and the shared async handle

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod storage;

pub use tracker_lib::{Result, TrackerError};

use clap::Parser;
use tokio::net::TcpListener;

use crate::cli::Cli;
use crate::config::ServiceConfig;
use crate::http::AppState;
use crate::storage::{SqliteStore, StoreHandle};

/// Run the service.
///
/// This is the main entry point called from `main()`: parse flags,
/// resolve config, initialize logging, open the store, and serve until
/// ctrl-c. The store handle drops (closing the database) after the
/// server stops.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store cannot be
/// opened, or the listener cannot bind.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::resolve(&cli)?;
    logging::init_logging(cli.verbose, cli.quiet, config.log_file.as_deref())?;

    tracing::info!(db = %config.db.display(), "opening store");
    let store = SqliteStore::open(&config.db)?;
    let app = http::app(AppState::new(StoreHandle::new(store)));

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("issue tracker listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("issue tracker stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received");
}
