//! End-to-end API tests through the router (no network).
//!
//! Each test builds the full axum router over an in-memory store and
//! drives it with `tower::ServiceExt::oneshot`. Covers the legacy wire
//! contract: every command outcome, success or failure, is a `200 OK`
//! JSON body.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use issue_tracker::http::{self, AppState};
use issue_tracker::logging::init_test_logging;
use issue_tracker::storage::{SqliteStore, StoreHandle};

fn test_app() -> Router {
    init_test_logging();
    let store = SqliteStore::open_in_memory().expect("open in-memory store");
    http::app(AppState::new(StoreHandle::new(store)))
}

/// Send one request and return the parsed JSON body, asserting the
/// legacy all-200 contract on the way.
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Value {
    let request = match body {
        Some(value) => Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("build request"),
        None => Request::builder()
            .uri(uri)
            .method(method)
            .body(Body::empty())
            .expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("route request");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse response JSON")
}

async fn create(app: &Router, project: &str, body: Value) -> Value {
    send(app, "POST", &format!("/issues/{project}"), Some(body)).await
}

async fn list(app: &Router, project: &str, query: &str) -> Vec<Value> {
    let uri = if query.is_empty() {
        format!("/issues/{project}")
    } else {
        format!("/issues/{project}?{query}")
    };
    match send(app, "GET", &uri, None).await {
        Value::Array(items) => items,
        other => panic!("expected array, got {other}"),
    }
}

fn joe_payload() -> Value {
    json!({
        "issue_title": "Fix error in posting data",
        "issue_text": "When we post data it has an error.",
        "created_by": "Joe",
        "assigned_to": "Joe",
        "status_text": "In QA"
    })
}

// ============================================================================
// POST /issues/{project}
// ============================================================================

#[tokio::test]
async fn test_create_with_every_field() {
    let app = test_app();
    let body = create(&app, "testing123", joe_payload()).await;

    assert_eq!(body["issue_title"], "Fix error in posting data");
    assert_eq!(body["issue_text"], "When we post data it has an error.");
    assert_eq!(body["created_by"], "Joe");
    assert_eq!(body["assigned_to"], "Joe");
    assert_eq!(body["status_text"], "In QA");
    assert_eq!(body["open"], true);

    let id = body["_id"].as_str().expect("generated _id");
    assert!(id.starts_with("it-"));
    let project_id = body["projectId"].as_str().expect("projectId");
    assert!(project_id.starts_with("pr-"));
    assert_eq!(body["created_on"], body["updated_on"]);
}

#[tokio::test]
async fn test_create_with_only_required_fields_defaults_optionals() {
    let app = test_app();
    let body = create(
        &app,
        "apitest",
        json!({
            "issue_title": "Title",
            "issue_text": "Text",
            "created_by": "Joe"
        }),
    )
    .await;

    assert_eq!(body["assigned_to"], "");
    assert_eq!(body["status_text"], "");
    assert_eq!(body["open"], true);
}

#[tokio::test]
async fn test_create_missing_required_field_writes_nothing() {
    let app = test_app();

    for payload in [
        json!({ "issue_text": "Text", "created_by": "Joe" }),
        json!({ "issue_title": "Title", "created_by": "Joe" }),
        json!({ "issue_title": "Title", "issue_text": "Text" }),
        json!({ "issue_title": "Title", "issue_text": "Text", "created_by": "" }),
    ] {
        let body = create(&app, "apitest", payload).await;
        assert_eq!(body, json!({ "error": "required field(s) missing" }));
    }

    // Nothing reached the store: a store-wide clear removes zero rows.
    let cleared = send(&app, "DELETE", "/admin/clear-all", None).await;
    assert_eq!(cleared["count"], 0);
    assert!(list(&app, "apitest", "").await.is_empty());
}

#[tokio::test]
async fn test_create_with_malformed_body_reports_missing_fields() {
    let app = test_app();
    let request = Request::builder()
        .uri("/issues/apitest")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from("this is not json"))
        .expect("build request");

    let response = app.clone().oneshot(request).await.expect("route request");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    let body: Value = serde_json::from_slice(&bytes).expect("parse body");
    assert_eq!(body, json!({ "error": "required field(s) missing" }));
}

// ============================================================================
// GET /issues/{project}
// ============================================================================

#[tokio::test]
async fn test_list_unknown_project_is_empty() {
    let app = test_app();
    assert!(list(&app, "never-written", "").await.is_empty());
}

#[tokio::test]
async fn test_list_scopes_issues_to_their_project() {
    let app = test_app();
    create(
        &app,
        "alpha",
        json!({ "issue_title": "Mine", "issue_text": "t", "created_by": "alice" }),
    )
    .await;
    create(
        &app,
        "beta",
        json!({ "issue_title": "Theirs", "issue_text": "t", "created_by": "bob" }),
    )
    .await;

    let alpha = list(&app, "alpha", "").await;
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0]["issue_title"], "Mine");

    let beta = list(&app, "beta", "").await;
    assert_eq!(beta.len(), 1);
    assert_eq!(beta[0]["issue_title"], "Theirs");
}

#[tokio::test]
async fn test_list_filters_exact_match_and_combined() {
    let app = test_app();
    for (title, creator, status) in [
        ("A", "Joe", "In QA"),
        ("B", "Joe", "done"),
        ("C", "Ted", "In QA"),
    ] {
        create(
            &app,
            "filters",
            json!({
                "issue_title": title,
                "issue_text": "t",
                "created_by": creator,
                "status_text": status
            }),
        )
        .await;
    }

    let by_creator = list(&app, "filters", "created_by=Joe").await;
    assert_eq!(by_creator.len(), 2);
    assert!(by_creator.iter().all(|i| i["created_by"] == "Joe"));

    let combined = list(&app, "filters", "created_by=Joe&status_text=done").await;
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0]["issue_title"], "B");

    // Exact match only: a prefix of a stored value matches nothing.
    assert!(list(&app, "filters", "created_by=Jo").await.is_empty());
}

#[tokio::test]
async fn test_list_filter_on_open_flag() {
    let app = test_app();
    let kept = create(
        &app,
        "flags",
        json!({ "issue_title": "stays open", "issue_text": "t", "created_by": "Joe" }),
    )
    .await;
    let closed = create(
        &app,
        "flags",
        json!({ "issue_title": "gets closed", "issue_text": "t", "created_by": "Joe" }),
    )
    .await;

    // A truthy `open` in an update closes the issue.
    send(
        &app,
        "PUT",
        "/issues/flags",
        Some(json!({ "_id": closed["_id"], "open": true })),
    )
    .await;

    let open_issues = list(&app, "flags", "open=true").await;
    assert_eq!(open_issues.len(), 1);
    assert_eq!(open_issues[0]["_id"], kept["_id"]);

    let closed_issues = list(&app, "flags", "open=false").await;
    assert_eq!(closed_issues.len(), 1);
    assert_eq!(closed_issues[0]["_id"], closed["_id"]);
}

#[tokio::test]
async fn test_list_unknown_filter_key_matches_nothing() {
    let app = test_app();
    create(
        &app,
        "apitest",
        json!({ "issue_title": "A", "issue_text": "t", "created_by": "Joe" }),
    )
    .await;

    assert!(list(&app, "apitest", "favorite_color=teal").await.is_empty());
    assert!(list(&app, "apitest", "open=banana").await.is_empty());
}

#[tokio::test]
async fn test_list_filter_on_project_id_field() {
    let app = test_app();
    let created = create(&app, "apitest", joe_payload()).await;
    let project_id = created["projectId"].as_str().expect("projectId");

    let matching = list(&app, "apitest", &format!("projectId={project_id}")).await;
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0]["_id"], created["_id"]);

    // A foreign projectId cannot contradict the path's project scope.
    assert!(list(&app, "apitest", "projectId=pr-elsewhere").await.is_empty());
}

// ============================================================================
// PUT /issues/{project}
// ============================================================================

#[tokio::test]
async fn test_update_one_field_confirms_and_persists() {
    let app = test_app();
    let created = create(&app, "apitest", joe_payload()).await;
    let id = created["_id"].as_str().expect("_id").to_string();

    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({ "_id": id, "created_by": "Ted" })),
    )
    .await;
    assert_eq!(
        body,
        json!({ "result": "successfully updated", "_id": id })
    );

    let issues = list(&app, "apitest", "").await;
    assert_eq!(issues[0]["created_by"], "Ted");
    assert_eq!(issues[0]["issue_title"], "Fix error in posting data");
}

#[tokio::test]
async fn test_update_multiple_fields() {
    let app = test_app();
    let created = create(&app, "apitest", joe_payload()).await;
    let id = created["_id"].as_str().expect("_id").to_string();

    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({
            "_id": id,
            "issue_title": "Renamed",
            "assigned_to": "Ted",
            "status_text": "ready"
        })),
    )
    .await;
    assert_eq!(body["result"], "successfully updated");

    let issue = &list(&app, "apitest", "").await[0];
    assert_eq!(issue["issue_title"], "Renamed");
    assert_eq!(issue["assigned_to"], "Ted");
    assert_eq!(issue["status_text"], "ready");
    assert_eq!(issue["issue_text"], "When we post data it has an error.");
}

#[tokio::test]
async fn test_update_open_false_is_ignored_but_refreshes_updated_on() {
    let app = test_app();
    let created = create(&app, "apitest", joe_payload()).await;
    let id = created["_id"].as_str().expect("_id").to_string();
    let created_on = created["created_on"].as_str().expect("created_on");

    // Let the millisecond clock tick so the refresh is observable.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({ "_id": id, "open": false })),
    )
    .await;
    assert_eq!(body["result"], "successfully updated");

    let issue = &list(&app, "apitest", "").await[0];
    assert_eq!(issue["open"], true, "open: false must not close the issue");
    let updated_on = issue["updated_on"].as_str().expect("updated_on");
    assert!(updated_on > created_on, "updated_on must refresh");
    assert_eq!(issue["created_on"].as_str(), Some(created_on));
}

#[tokio::test]
async fn test_update_truthy_open_closes_even_the_string_false() {
    let app = test_app();
    for open_value in [json!(true), json!("false")] {
        let created = create(&app, "apitest", joe_payload()).await;
        let id = created["_id"].as_str().expect("_id").to_string();

        send(
            &app,
            "PUT",
            "/issues/apitest",
            Some(json!({ "_id": id, "open": open_value })),
        )
        .await;

        let issues = list(&app, "apitest", &format!("_id={id}")).await;
        assert_eq!(issues[0]["open"], false, "open: {open_value} must close");
    }
}

#[tokio::test]
async fn test_update_with_only_id_reports_no_update_fields() {
    let app = test_app();
    let created = create(&app, "apitest", joe_payload()).await;
    let id = created["_id"].as_str().expect("_id").to_string();

    let body = send(&app, "PUT", "/issues/apitest", Some(json!({ "_id": id }))).await;
    assert_eq!(
        body,
        json!({ "error": "no update field(s) sent", "_id": id })
    );

    // Empty strings count as not sent.
    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({ "_id": id, "issue_title": "", "assigned_to": "" })),
    )
    .await;
    assert_eq!(body["error"], "no update field(s) sent");

    let issue = &list(&app, "apitest", "").await[0];
    assert_eq!(issue["issue_title"], "Fix error in posting data");
    assert_eq!(issue["created_on"], issue["updated_on"]);
}

#[tokio::test]
async fn test_update_nonexistent_id_reports_could_not_update() {
    let app = test_app();
    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({ "_id": "it-nope", "issue_title": "New" })),
    )
    .await;
    assert_eq!(
        body,
        json!({ "error": "could not update", "_id": "it-nope" })
    );

    // The failed update must not have created anything.
    let cleared = send(&app, "DELETE", "/admin/clear-all", None).await;
    assert_eq!(cleared["count"], 0);
}

#[tokio::test]
async fn test_update_without_id_reports_missing_id() {
    let app = test_app();

    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({ "issue_title": "New" })),
    )
    .await;
    assert_eq!(body, json!({ "error": "missing _id" }));

    // An empty `_id` counts as missing, as does a malformed body.
    let body = send(
        &app,
        "PUT",
        "/issues/apitest",
        Some(json!({ "_id": "", "issue_title": "New" })),
    )
    .await;
    assert_eq!(body, json!({ "error": "missing _id" }));

    let body = send(&app, "PUT", "/issues/apitest", None).await;
    assert_eq!(body, json!({ "error": "missing _id" }));
}

// ============================================================================
// DELETE /issues/{project}
// ============================================================================

#[tokio::test]
async fn test_delete_removes_issue() {
    let app = test_app();
    let created = create(&app, "apitest", joe_payload()).await;
    let id = created["_id"].as_str().expect("_id").to_string();

    let body = send(
        &app,
        "DELETE",
        "/issues/apitest",
        Some(json!({ "_id": id })),
    )
    .await;
    assert_eq!(
        body,
        json!({ "result": "successfully deleted", "_id": id })
    );
    assert!(list(&app, "apitest", "").await.is_empty());

    // Deleting it again reports the per-operation failure.
    let body = send(
        &app,
        "DELETE",
        "/issues/apitest",
        Some(json!({ "_id": id })),
    )
    .await;
    assert_eq!(body, json!({ "error": "could not delete", "_id": id }));
}

#[tokio::test]
async fn test_delete_nonexistent_id_reports_could_not_delete() {
    let app = test_app();
    let body = send(
        &app,
        "DELETE",
        "/issues/apitest",
        Some(json!({ "_id": "it-nope" })),
    )
    .await;
    assert_eq!(
        body,
        json!({ "error": "could not delete", "_id": "it-nope" })
    );
}

#[tokio::test]
async fn test_delete_without_id_reports_missing_id() {
    let app = test_app();

    let body = send(&app, "DELETE", "/issues/apitest", Some(json!({}))).await;
    assert_eq!(body, json!({ "error": "missing _id" }));

    let body = send(&app, "DELETE", "/issues/apitest", None).await;
    assert_eq!(body, json!({ "error": "missing _id" }));
}

// ============================================================================
// DELETE /admin/clear-all
// ============================================================================

#[tokio::test]
async fn test_clear_all_removes_issues_but_keeps_projects() {
    let app = test_app();
    let first = create(&app, "alpha", joe_payload()).await;
    create(
        &app,
        "alpha",
        json!({ "issue_title": "Second", "issue_text": "t", "created_by": "Joe" }),
    )
    .await;
    create(
        &app,
        "beta",
        json!({ "issue_title": "Third", "issue_text": "t", "created_by": "Ted" }),
    )
    .await;

    let body = send(&app, "DELETE", "/admin/clear-all", None).await;
    assert_eq!(
        body,
        json!({ "result": "successfully cleared", "count": 3 })
    );
    assert!(list(&app, "alpha", "").await.is_empty());
    assert!(list(&app, "beta", "").await.is_empty());

    // Projects survive the clear: a new issue lands in the same project.
    let again = create(&app, "alpha", joe_payload()).await;
    assert_eq!(again["projectId"], first["projectId"]);

    // A second clear finds only the issue just created.
    let body = send(&app, "DELETE", "/admin/clear-all", None).await;
    assert_eq!(body["count"], 1);
}
