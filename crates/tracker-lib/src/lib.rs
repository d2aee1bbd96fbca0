//! `tracker-lib` — core issue-tracking types and update semantics.
//!
//! Database-free: record types, required-field validation, exact-match
//! filter resolution, and the partial-update merge live here. The
//! service crate supplies persistence (SQLite) and the HTTP surface.
//!
//! # Quick Start
//!
//! ```
//! use chrono::Utc;
//! use tracker_lib::{IssueUpdate, NewIssue};
//!
//! // Validate and materialize a new issue
//! let input = NewIssue {
//!     issue_title: Some("Fix login".into()),
//!     issue_text: Some("500 on submit".into()),
//!     created_by: Some("alice".into()),
//!     ..Default::default()
//! };
//! input.validate().unwrap();
//! let mut issue = input.into_issue("it-abc12".into(), "pr-def34".into(), Utc::now());
//!
//! // Apply a partial update (truthy fields only)
//! let update: IssueUpdate =
//!     serde_json::from_str(r#"{"_id": "it-abc12", "assigned_to": "bob"}"#).unwrap();
//! assert!(update.has_update_fields());
//! update.apply_to(&mut issue, Utc::now());
//! assert_eq!(issue.assigned_to, "bob");
//! ```

pub mod error;
pub mod model;
pub mod query;
pub mod util;

pub use error::{Result, TrackerError};
pub use model::{Issue, NewIssue, Project};
pub use query::{IssueUpdate, ListFilters};
