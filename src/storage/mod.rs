//! `SQLite` storage layer for `issue_tracker`.
//!
//! This module provides the persistence layer using `SQLite` with:
//! - WAL mode for concurrent reads on file databases
//! - Exact-match list queries compiled to a dynamic WHERE clause
//! - An async handle that serializes access and keeps blocking I/O
//!   off the async worker threads
//!
//! # Submodules
//!
//! - [`handle`] - Shared async store handle (`spawn_blocking` bridge)
//! - [`sqlite`] - Main `SQLite` store implementation

pub mod handle;
pub mod sqlite;

pub use handle::StoreHandle;
pub use sqlite::SqliteStore;
