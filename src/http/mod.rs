//! HTTP surface for `issue_tracker`.
//!
//! All issue operations hang off a single project-scoped path:
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | /issues/{project} | `list_issues` | List issues, exact-match filters |
//! | POST | /issues/{project} | `create_issue` | Create an issue |
//! | PUT | /issues/{project} | `update_issue` | Partial update by `_id` |
//! | DELETE | /issues/{project} | `delete_issue` | Delete by `_id` |
//! | DELETE | /admin/clear-all | `clear_all` | Remove every issue |
//!
//! Command outcomes (success or failure) respond `200 OK` with a JSON
//! body; only store failures on create and clear surface as `500`.

pub mod handlers;

use axum::Router;
use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

use crate::storage::StoreHandle;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The one store handle; store calls are a handler's only
    /// suspension points.
    pub store: StoreHandle,
}

impl AppState {
    #[must_use]
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }
}

/// Build the service router with all API routes.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/issues/{project}",
            get(handlers::list_issues)
                .post(handlers::create_issue)
                .put(handlers::update_issue)
                .delete(handlers::delete_issue),
        )
        .route("/admin/clear-all", delete(handlers::clear_all))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
