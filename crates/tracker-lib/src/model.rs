//! Core data types for the issue tracker.
//!
//! Wire names follow the public API: `id` serializes as `_id`,
//! `project_id` as `projectId`, everything else stays snake_case.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TrackerError};

const fn default_open() -> bool {
    true
}

/// Render a timestamp in the wire format: UTC ISO-8601 with
/// millisecond precision and a `Z` suffix.
///
/// Stored timestamp columns use the same rendering, so exact-match
/// filters on `created_on`/`updated_on` compare these strings.
#[must_use]
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a wire-format timestamp back into a `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `Storage` if the string is not valid RFC 3339; stored
/// timestamps are always written by [`format_timestamp`], so a parse
/// failure means a corrupt row.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TrackerError::storage(format!("bad timestamp '{value}': {e}")))
}

/// Current time, truncated to the wire format's millisecond resolution.
///
/// Records are stamped at storage resolution so that a freshly created
/// or updated record compares equal to what a later read returns.
#[must_use]
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.timestamp_subsec_millis() * 1_000_000)
        .unwrap_or(now)
}

fn serialize_timestamp<S>(
    value: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(value))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// A named grouping that scopes a set of issues.
///
/// Created lazily on first issue creation for an unseen name; never
/// mutated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Unique ID (e.g., "pr-k3f9a").
    #[serde(rename = "_id")]
    pub id: String,

    /// Project name, unique within the store.
    pub name: String,
}

/// The primary issue entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Unique ID (e.g., "it-4k2j9").
    #[serde(rename = "_id")]
    pub id: String,

    /// Owning project, immutable after creation.
    #[serde(rename = "projectId")]
    pub project_id: String,

    /// Short summary (required, non-empty).
    pub issue_title: String,

    /// Detailed description (required, non-empty).
    pub issue_text: String,

    /// Reporter (required, non-empty).
    pub created_by: String,

    /// Assignee, defaults to empty.
    #[serde(default)]
    pub assigned_to: String,

    /// Free-form status label, defaults to empty.
    #[serde(default)]
    pub status_text: String,

    /// Open/closed flag, true at creation.
    #[serde(default = "default_open")]
    pub open: bool,

    /// Set exactly once at creation.
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_on: DateTime<Utc>,

    /// Refreshed on every successful update.
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub updated_on: DateTime<Utc>,
}

/// Create-operation input: the caller-supplied fields of a new issue.
///
/// All fields optional at the deserialization layer; [`Self::validate`]
/// enforces the required trio before any store call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIssue {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
}

impl NewIssue {
    /// Check the required fields (`issue_title`, `issue_text`,
    /// `created_by`): each must be present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` naming every absent or empty required
    /// field. Runs before any store access; a failed validation
    /// guarantees no mutation happened.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !field_present(&self.issue_title) {
            missing.push("issue_title");
        }
        if !field_present(&self.issue_text) {
            missing.push("issue_text");
        }
        if !field_present(&self.created_by) {
            missing.push("created_by");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TrackerError::missing_fields(missing))
        }
    }

    /// Materialize the full issue record.
    ///
    /// Assumes [`Self::validate`] passed. Optional fields default to
    /// empty strings, `open` starts true, and both timestamps are set
    /// to `now`.
    #[must_use]
    pub fn into_issue(self, id: String, project_id: String, now: DateTime<Utc>) -> Issue {
        Issue {
            id,
            project_id,
            issue_title: self.issue_title.unwrap_or_default(),
            issue_text: self.issue_text.unwrap_or_default(),
            created_by: self.created_by.unwrap_or_default(),
            assigned_to: self.assigned_to.unwrap_or_default(),
            status_text: self.status_text.unwrap_or_default(),
            open: true,
            created_on: now,
            updated_on: now,
        }
    }
}

fn field_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}
