//! Request handlers for the issue API.
//!
//! The legacy wire contract: every command outcome, success or
//! failure, is a `200 OK` JSON body. Failures carry an `error` string
//! and, where the operation knows it, the offending `_id`. A malformed
//! or absent JSON body is treated as a body with no fields.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use tracker_lib::error::TrackerError;
use tracker_lib::model::{Issue, NewIssue};
use tracker_lib::query::{IssueUpdate, ListFilters};

use crate::http::AppState;

const ERR_MISSING_FIELDS: &str = "required field(s) missing";
const ERR_MISSING_ID: &str = "missing _id";
const ERR_NO_UPDATE_FIELDS: &str = "no update field(s) sent";
const ERR_COULD_NOT_UPDATE: &str = "could not update";
const ERR_COULD_NOT_DELETE: &str = "could not delete";

const RESULT_UPDATED: &str = "successfully updated";
const RESULT_DELETED: &str = "successfully deleted";
const RESULT_CLEARED: &str = "successfully cleared";

/// Command failure payload: the `error` message plus the echoed `_id`
/// when the operation got far enough to know it.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

/// Command success confirmation echoing the `_id`.
#[derive(Debug, Serialize)]
struct ResultBody {
    result: &'static str,
    #[serde(rename = "_id")]
    id: String,
}

/// Bulk-clear confirmation with the number of removed records.
#[derive(Debug, Serialize)]
struct ClearedBody {
    result: &'static str,
    count: usize,
}

/// DELETE body: only `_id` matters, everything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "_id")]
    id: Option<String>,
}

fn command_error(error: &'static str, id: Option<String>) -> Response {
    Json(ErrorBody { error, id }).into_response()
}

/// Store failures outside the per-operation contract (create, clear)
/// are fatal to the request.
fn store_failure(err: &TrackerError) -> Response {
    tracing::error!(error = %err, "store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// GET /issues/{project} - List a project's issues.
///
/// Query parameters become exact-match filters, ANDed together. An
/// absent project yields an empty array, as does a store failure (the
/// read path degrades instead of failing the caller).
pub async fn list_issues(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Issue>> {
    let filters = ListFilters::from_pairs(params);

    let name = project_name.clone();
    let project = match state.store.call(move |store| store.find_project(&name)).await {
        Ok(Some(project)) => project,
        Ok(None) => return Json(Vec::new()),
        Err(e) => {
            tracing::warn!(project = %project_name, error = %e, "project lookup failed");
            return Json(Vec::new());
        }
    };

    match state
        .store
        .call(move |store| store.list_issues(&project.id, &filters))
        .await
    {
        Ok(issues) => Json(issues),
        Err(e) => {
            tracing::warn!(project = %project_name, error = %e, "issue list failed");
            Json(Vec::new())
        }
    }
}

/// POST /issues/{project} - Create an issue.
///
/// Requires `issue_title`, `issue_text`, and `created_by` to be
/// present and non-empty; resolves the project (creating it on first
/// use) and returns the full stored record.
pub async fn create_issue(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
    payload: Result<Json<NewIssue>, JsonRejection>,
) -> Response {
    let new = match payload {
        Ok(Json(new)) => new,
        Err(_) => NewIssue::default(),
    };
    if new.validate().is_err() {
        return command_error(ERR_MISSING_FIELDS, None);
    }

    let name = project_name;
    let project = match state
        .store
        .call(move |store| store.find_or_create_project(&name))
        .await
    {
        Ok(project) => project,
        Err(e) => return store_failure(&e),
    };

    match state
        .store
        .call(move |store| store.create_issue(&project.id, new))
        .await
    {
        Ok(issue) => Json(issue).into_response(),
        Err(e) => store_failure(&e),
    }
}

/// PUT /issues/{project} - Partially update an issue by `_id`.
///
/// Checks run in contract order: a missing `_id` answers before
/// anything else; an all-empty payload answers before the not-found
/// outcome; any store error folds into the operation's own
/// `could not update` failure.
pub async fn update_issue(
    State(state): State<AppState>,
    Path(_project_name): Path<String>,
    payload: Result<Json<IssueUpdate>, JsonRejection>,
) -> Response {
    let update = match payload {
        Ok(Json(update)) => update,
        Err(_) => IssueUpdate::default(),
    };

    let Some(id) = update.id().map(str::to_string) else {
        return command_error(ERR_MISSING_ID, None);
    };

    let op_id = id.clone();
    let outcome = state
        .store
        .call(move |store| store.update_issue(&op_id, &update))
        .await;

    match outcome {
        Ok(_issue) => Json(ResultBody {
            result: RESULT_UPDATED,
            id,
        })
        .into_response(),
        Err(TrackerError::NoUpdateFields { .. }) => command_error(ERR_NO_UPDATE_FIELDS, Some(id)),
        Err(TrackerError::IssueNotFound { .. }) => command_error(ERR_COULD_NOT_UPDATE, Some(id)),
        Err(e) => {
            tracing::warn!(issue = %id, error = %e, "issue update failed");
            command_error(ERR_COULD_NOT_UPDATE, Some(id))
        }
    }
}

/// DELETE /issues/{project} - Delete an issue by `_id`.
pub async fn delete_issue(
    State(state): State<AppState>,
    Path(_project_name): Path<String>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(_) => DeleteRequest::default(),
    };

    let Some(id) = request.id.filter(|id| !id.is_empty()) else {
        return command_error(ERR_MISSING_ID, None);
    };

    let delete_id = id.clone();
    match state
        .store
        .call(move |store| store.delete_issue(&delete_id))
        .await
    {
        Ok(true) => Json(ResultBody {
            result: RESULT_DELETED,
            id,
        })
        .into_response(),
        Ok(false) => command_error(ERR_COULD_NOT_DELETE, Some(id)),
        Err(e) => {
            tracing::warn!(issue = %id, error = %e, "issue delete failed");
            command_error(ERR_COULD_NOT_DELETE, Some(id))
        }
    }
}

/// DELETE /admin/clear-all - Remove every issue (projects survive).
pub async fn clear_all(State(state): State<AppState>) -> Response {
    match state
        .store
        .call(crate::storage::SqliteStore::clear_issues)
        .await
    {
        Ok(count) => Json(ClearedBody {
            result: RESULT_CLEARED,
            count,
        })
        .into_response(),
        Err(e) => store_failure(&e),
    }
}
