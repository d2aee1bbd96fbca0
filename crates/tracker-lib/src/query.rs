//! Operation inputs: list filters and the partial-update request.
//!
//! This is where the tracker's two real contracts live — exact-match
//! filter resolution and the truthy-only update merge.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::{Issue, format_timestamp};

/// Exact-match filters for the list operation.
///
/// Built from raw query-string pairs with [`Self::from_pairs`]. Every
/// supplied pair must match for a record to be returned (logical AND,
/// no partial or range matching). A key that is not an issue field,
/// or an `open` value that is not `true`/`false`, can never match a
/// stored record and marks the whole filter unsatisfiable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    unsatisfiable: bool,
}

impl ListFilters {
    /// Build filters from raw key/value pairs (e.g. a parsed query
    /// string). Later duplicates overwrite earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "_id" => filters.id = Some(value),
                "projectId" => filters.project_id = Some(value),
                "issue_title" => filters.issue_title = Some(value),
                "issue_text" => filters.issue_text = Some(value),
                "created_by" => filters.created_by = Some(value),
                "assigned_to" => filters.assigned_to = Some(value),
                "status_text" => filters.status_text = Some(value),
                "open" => match value.as_str() {
                    "true" => filters.open = Some(true),
                    "false" => filters.open = Some(false),
                    _ => filters.unsatisfiable = true,
                },
                "created_on" => filters.created_on = Some(value),
                "updated_on" => filters.updated_on = Some(value),
                _ => filters.unsatisfiable = true,
            }
        }
        filters
    }

    /// True when no stored record can ever match (unknown filter key
    /// or unparseable `open` value was supplied).
    #[must_use]
    pub const fn is_unsatisfiable(&self) -> bool {
        self.unsatisfiable
    }

    /// True when no filter fields were supplied at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.project_id.is_none()
            && self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
            && self.created_on.is_none()
            && self.updated_on.is_none()
            && !self.unsatisfiable
    }

    /// Reference semantics: does `issue` match every supplied filter?
    ///
    /// The SQL layer builds its WHERE clause from the same fields;
    /// the storage tests check the two against each other.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        if self.unsatisfiable {
            return false;
        }
        let field_matches =
            |filter: &Option<String>, actual: &str| filter.as_deref().is_none_or(|f| f == actual);

        field_matches(&self.id, &issue.id)
            && field_matches(&self.project_id, &issue.project_id)
            && field_matches(&self.issue_title, &issue.issue_title)
            && field_matches(&self.issue_text, &issue.issue_text)
            && field_matches(&self.created_by, &issue.created_by)
            && field_matches(&self.assigned_to, &issue.assigned_to)
            && field_matches(&self.status_text, &issue.status_text)
            && self.open.is_none_or(|open| open == issue.open)
            && field_matches(&self.created_on, &format_timestamp(&issue.created_on))
            && field_matches(&self.updated_on, &format_timestamp(&issue.updated_on))
    }
}

/// Raw partial-update request for an issue.
///
/// Captures the PUT body exactly as received: recognized fields are
/// typed, everything else lands in `extra` so the empty-input check
/// sees the whole payload. `open` stays a raw JSON value because the
/// legacy contract accepts booleans and strings there.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueUpdate {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssueUpdate {
    /// The target `_id`, if present and non-empty.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }

    /// True when at least one field besides `_id` carries a value.
    ///
    /// "Carries a value" means present and not zero-length: `null`,
    /// `""`, `[]`, and `{}` all count as empty. Unrecognized fields
    /// count too — a request updating only fields this tracker does
    /// not know about still counts as sending update fields.
    #[must_use]
    pub fn has_update_fields(&self) -> bool {
        let string_sent = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

        string_sent(&self.issue_title)
            || string_sent(&self.issue_text)
            || string_sent(&self.created_by)
            || string_sent(&self.assigned_to)
            || string_sent(&self.status_text)
            || self.open.as_ref().is_some_and(|v| !value_is_empty(v))
            || self.extra.values().any(|v| !value_is_empty(v))
    }

    /// Apply the truthy-only merge to `issue` and refresh `updated_on`.
    ///
    /// String fields are applied only when non-empty. A truthy `open`
    /// value closes the issue (sets `open` to false); `false`, `""`,
    /// and `null` leave it untouched — so the string `"false"` closes
    /// the issue while the boolean `false` does nothing, and no update
    /// can reopen one. That asymmetry is the contract, quirk included.
    pub fn apply_to(&self, issue: &mut Issue, now: DateTime<Utc>) {
        if let Some(title) = non_empty(&self.issue_title) {
            issue.issue_title = title.to_string();
        }
        if let Some(text) = non_empty(&self.issue_text) {
            issue.issue_text = text.to_string();
        }
        if let Some(creator) = non_empty(&self.created_by) {
            issue.created_by = creator.to_string();
        }
        if let Some(assignee) = non_empty(&self.assigned_to) {
            issue.assigned_to = assignee.to_string();
        }
        if let Some(status) = non_empty(&self.status_text) {
            issue.status_text = status.to_string();
        }
        if self.open.as_ref().is_some_and(value_is_truthy) {
            issue.open = false;
        }
        issue.updated_on = now;
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Truthiness rule for update values: `false`, `0`, `NaN`, `""`, and
/// `null` do not trigger a change; everything else — including tiny
/// nonzero numbers — does.
fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Zero-length rule for the "no update field(s) sent" check.
fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
