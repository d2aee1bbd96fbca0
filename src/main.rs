//! `issue_tracker` (issue-tracker) - Project-scoped issue tracker REST service
//!
//! A small REST API over `SQLite`: issues live under named projects,
//! with exact-match list filters and partial updates by `_id`.

use issue_tracker::run;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
