//! `SQLite` store implementation.

use std::fmt::Write as _;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, ToSql, params};

use tracker_lib::error::{Result, TrackerError};
use tracker_lib::model::{
    Issue, NewIssue, Project, format_timestamp, parse_timestamp, timestamp_now,
};
use tracker_lib::query::{IssueUpdate, ListFilters};
use tracker_lib::util::{ISSUE_ID_PREFIX, PROJECT_ID_PREFIX, generate_id};

/// The complete SQL schema for the tracker database.
///
/// Timestamp columns hold the wire rendering (ISO-8601 millis, `Z`),
/// so exact-match filters on them compare strings directly.
pub const SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id),
        issue_title TEXT NOT NULL,
        issue_text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        assigned_to TEXT NOT NULL DEFAULT '',
        status_text TEXT NOT NULL DEFAULT '',
        open INTEGER NOT NULL DEFAULT 1,
        created_on TEXT NOT NULL,
        updated_on TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id);
";

/// SQLite-backed project/issue store.
///
/// One connection, owned exclusively; concurrent access goes through
/// [`crate::storage::StoreHandle`].
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the connection cannot be established or
    /// schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        // WAL wants a real file; in-memory databases skip it.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        Self::init(conn)
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the connection cannot be established.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL).map_err(db_err)?;
        Ok(Self { conn })
    }

    // ========================================================================
    // Projects
    // ========================================================================

    /// Look up a project by name.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn find_project(&self, name: &str) -> Result<Option<Project>> {
        self.conn
            .query_row(
                "SELECT id, name FROM projects WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    /// Look up a project by name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query or insert failure.
    pub fn find_or_create_project(&self, name: &str) -> Result<Project> {
        if let Some(project) = self.find_project(name)? {
            return Ok(project);
        }

        let count = self.count_projects()?;
        let id = generate_id(PROJECT_ID_PREFIX, name, timestamp_now(), count, |candidate| {
            self.project_id_exists(candidate)
        });
        self.conn
            .execute(
                "INSERT INTO projects (id, name) VALUES (?1, ?2)",
                params![id, name],
            )
            .map_err(db_err)?;

        Ok(Project {
            id,
            name: name.to_string(),
        })
    }

    // ========================================================================
    // Issues
    // ========================================================================

    /// Create a new issue under `project_id` and return the stored record.
    ///
    /// Generates the ID, stamps `created_on`/`updated_on` with the
    /// current time, and defaults the optional fields. Callers are
    /// expected to have validated `new` already.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on insert failure.
    pub fn create_issue(&self, project_id: &str, new: NewIssue) -> Result<Issue> {
        let now = timestamp_now();
        let seed = format!(
            "{}|{}",
            new.issue_title.as_deref().unwrap_or_default(),
            new.created_by.as_deref().unwrap_or_default()
        );
        let count = self.count_issues()?;
        let id = generate_id(ISSUE_ID_PREFIX, &seed, now, count, |candidate| {
            self.issue_id_exists(candidate)
        });

        let issue = new.into_issue(id, project_id.to_string(), now);
        self.conn
            .execute(
                "INSERT INTO issues (
                    id, project_id, issue_title, issue_text, created_by,
                    assigned_to, status_text, open, created_on, updated_on
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    issue.id,
                    issue.project_id,
                    issue.issue_title,
                    issue.issue_text,
                    issue.created_by,
                    issue.assigned_to,
                    issue.status_text,
                    issue.open,
                    format_timestamp(&issue.created_on),
                    format_timestamp(&issue.updated_on),
                ],
            )
            .map_err(db_err)?;

        Ok(issue)
    }

    /// Fetch a single issue by ID.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure or a corrupt timestamp row.
    pub fn get_issue(&self, id: &str) -> Result<Option<Issue>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, project_id, issue_title, issue_text, created_by,
                        assigned_to, status_text, open, created_on, updated_on
                 FROM issues WHERE id = ?1",
                params![id],
                IssueRow::from_row,
            )
            .optional()
            .map_err(db_err)?;

        row.map(IssueRow::into_issue).transpose()
    }

    /// List the issues of one project matching every supplied filter.
    ///
    /// Unsatisfiable filters (unknown key, unparseable `open`) short
    /// circuit to an empty result without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure or a corrupt timestamp row.
    pub fn list_issues(&self, project_id: &str, filters: &ListFilters) -> Result<Vec<Issue>> {
        if filters.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT id, project_id, issue_title, issue_text, created_by,
                    assigned_to, status_text, open, created_on, updated_on
             FROM issues WHERE project_id = ?1",
        );
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(project_id.to_string())];
        let mut add_filter = |column: &str, value: Box<dyn ToSql>| {
            values.push(value);
            let _ = write!(sql, " AND {column} = ?{}", values.len());
        };

        if let Some(ref v) = filters.id {
            add_filter("id", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.project_id {
            // ANDed with the scoping clause, so a mismatch yields no rows.
            add_filter("project_id", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.issue_title {
            add_filter("issue_title", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.issue_text {
            add_filter("issue_text", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.created_by {
            add_filter("created_by", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.assigned_to {
            add_filter("assigned_to", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.status_text {
            add_filter("status_text", Box::new(v.clone()));
        }
        if let Some(open) = filters.open {
            add_filter("open", Box::new(open));
        }
        if let Some(ref v) = filters.created_on {
            add_filter("created_on", Box::new(v.clone()));
        }
        if let Some(ref v) = filters.updated_on {
            add_filter("updated_on", Box::new(v.clone()));
        }

        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let value_refs: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(value_refs.as_slice(), IssueRow::from_row)
            .map_err(db_err)?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.map_err(db_err)?.into_issue()?);
        }
        Ok(issues)
    }

    /// Apply a partial update to an issue and persist it.
    ///
    /// Mirrors the update contract's check order: the issue is looked
    /// up first, but an all-empty payload answers before the lookup
    /// outcome is examined. `updated_on` is refreshed even when no
    /// field value changed.
    ///
    /// # Errors
    ///
    /// Returns `NoUpdateFields` if the payload carries nothing to
    /// change, `IssueNotFound` if no issue has this ID, and `Storage`
    /// on query or write failure.
    pub fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<Issue> {
        let looked_up = self.get_issue(id);
        if !update.has_update_fields() {
            return Err(TrackerError::no_update_fields(id));
        }
        let mut issue = looked_up?.ok_or_else(|| TrackerError::issue_not_found(id))?;

        update.apply_to(&mut issue, timestamp_now());
        if self.save_issue(&issue)? {
            Ok(issue)
        } else {
            Err(TrackerError::issue_not_found(id))
        }
    }

    /// Write back every mutable field of an issue.
    ///
    /// Returns `false` if no row with that ID exists. `project_id` and
    /// `created_on` are immutable and never written.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on update failure.
    pub fn save_issue(&self, issue: &Issue) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                "UPDATE issues SET
                    issue_title = ?1, issue_text = ?2, created_by = ?3,
                    assigned_to = ?4, status_text = ?5, open = ?6, updated_on = ?7
                 WHERE id = ?8",
                params![
                    issue.issue_title,
                    issue.issue_text,
                    issue.created_by,
                    issue.assigned_to,
                    issue.status_text,
                    issue.open,
                    format_timestamp(&issue.updated_on),
                    issue.id,
                ],
            )
            .map_err(db_err)?;

        Ok(affected > 0)
    }

    /// Delete a single issue. Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on delete failure.
    pub fn delete_issue(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM issues WHERE id = ?1", params![id])
            .map_err(db_err)?;

        Ok(affected > 0)
    }

    /// Delete every issue in the store (projects are untouched).
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on delete failure.
    pub fn clear_issues(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM issues", []).map_err(db_err)
    }

    // ========================================================================
    // Counts and existence probes (ID generation support)
    // ========================================================================

    fn count_projects(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn count_issues(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn project_id_exists(&self, id: &str) -> bool {
        self.conn
            .prepare("SELECT 1 FROM projects WHERE id = ?1")
            .and_then(|mut stmt| stmt.exists([id]))
            .unwrap_or(false)
    }

    fn issue_id_exists(&self, id: &str) -> bool {
        self.conn
            .prepare("SELECT 1 FROM issues WHERE id = ?1")
            .and_then(|mut stmt| stmt.exists([id]))
            .unwrap_or(false)
    }
}

fn db_err(e: rusqlite::Error) -> TrackerError {
    TrackerError::storage(e.to_string())
}

/// Intermediate row struct for reading issues from `SQLite` before
/// parsing the stored timestamp strings into typed values.
struct IssueRow {
    id: String,
    project_id: String,
    issue_title: String,
    issue_text: String,
    created_by: String,
    assigned_to: String,
    status_text: String,
    open: bool,
    created_on: String,
    updated_on: String,
}

impl IssueRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            issue_title: row.get(2)?,
            issue_text: row.get(3)?,
            created_by: row.get(4)?,
            assigned_to: row.get(5)?,
            status_text: row.get(6)?,
            open: row.get(7)?,
            created_on: row.get(8)?,
            updated_on: row.get(9)?,
        })
    }

    fn into_issue(self) -> Result<Issue> {
        Ok(Issue {
            id: self.id,
            project_id: self.project_id,
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            open: self.open,
            created_on: parse_timestamp(&self.created_on)?,
            updated_on: parse_timestamp(&self.updated_on)?,
        })
    }
}
