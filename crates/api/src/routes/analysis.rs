//! Route definitions for the analysis pipeline.
//!
//! ```text
//! POST   /analyze             -> submit a document for analysis
//! GET    /status/{task_id}    -> poll one job
//! GET    /results             -> list recent jobs
//! DELETE /results/{task_id}   -> remove one job record
//! GET    /queue/status        -> broker introspection (best-effort)
//! ```

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analysis::submit))
        .route("/status/{task_id}", get(analysis::get_status))
        .route("/results", get(analysis::list_results))
        .route("/results/{task_id}", delete(analysis::delete_result))
        .route("/queue/status", get(analysis::queue_status))
}
