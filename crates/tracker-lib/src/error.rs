//! Error types for `tracker-lib`.

use thiserror::Error;

/// Primary error type for tracker operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Lookup Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    // === Validation Errors ===
    /// One or more required fields were absent or empty.
    #[error("Required field(s) missing: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// An update request carried an `_id` but nothing to change.
    #[error("No update field(s) sent for {id}")]
    NoUpdateFields { id: String },

    // === Configuration Errors ===
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === Storage Errors ===
    /// Generic storage error (database-specific causes flattened to text).
    #[error("Storage error: {0}")]
    Storage(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    #[must_use]
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingFields {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn issue_not_found(id: impl Into<String>) -> Self {
        Self::IssueNotFound { id: id.into() }
    }

    #[must_use]
    pub fn no_update_fields(id: impl Into<String>) -> Self {
        Self::NoUpdateFields { id: id.into() }
    }
}

/// Result type using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;
