//! Shared async handle over the `SQLite` store.

use std::sync::{Arc, Mutex};

use tracker_lib::error::{Result, TrackerError};

use crate::storage::SqliteStore;

/// Async-safe handle to the tracker database.
///
/// Wraps [`SqliteStore`] behind `Arc<Mutex>` and runs all access on
/// tokio's blocking thread pool via `spawn_blocking`, keeping
/// synchronous `SQLite` I/O off the async worker threads. Handlers
/// hold a clone; the store closes when the last clone drops.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<SqliteStore>>,
}

impl StoreHandle {
    #[must_use]
    pub fn new(store: SqliteStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run a closure with access to the store on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store task panicked or the lock is
    /// poisoned; otherwise whatever `f` returns.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&SqliteStore) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let guard = store
                .lock()
                .map_err(|e| TrackerError::storage(format!("store lock poisoned: {e}")))?;
            f(&guard)
        })
        .await
        .map_err(|e| TrackerError::storage(format!("store task panicked: {e}")))?
    }
}
