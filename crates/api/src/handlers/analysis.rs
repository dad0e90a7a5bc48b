//! Handlers for the analysis pipeline: submission gateway and status
//! query service.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use finsight_core::error::CoreError;
use finsight_core::submission::{normalize_query, validate_upload, DEFAULT_SOURCE_NAME};
use finsight_core::types::{JobId, Timestamp};
use finsight_db::models::{JobRecord, JobStatus, NewJob};
use finsight_queue::DispatchMessage;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub status: &'static str,
    pub task_id: JobId,
    pub query: String,
    pub file_processed: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub task_id: JobId,
    pub status: JobStatus,
    pub query: String,
    pub file_name: String,
    /// Populated only once the job is terminal; while pending or
    /// processing clients see `null`.
    pub result: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub task_id: JobId,
    pub status: JobStatus,
    pub query: String,
    pub file_name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub results: Vec<ResultSummary>,
}

impl From<JobRecord> for StatusResponse {
    fn from(record: JobRecord) -> Self {
        let result = record
            .status
            .is_terminal()
            .then_some(record.result_ref);
        Self {
            task_id: record.id,
            status: record.status,
            query: record.query,
            file_name: record.source_name,
            result,
            created_at: record.created_at,
        }
    }
}

impl From<JobRecord> for ResultSummary {
    fn from(record: JobRecord) -> Self {
        Self {
            task_id: record.id,
            status: record.status,
            query: record.query,
            file_name: record.source_name,
            created_at: record.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /analyze
///
/// Multipart body: `file` (required) plus an optional `query` field.
/// Stages the upload, inserts the pending record, enqueues the dispatch
/// message, and returns 202.
///
/// Ordering matters: the artifact is staged before the record exists,
/// and the record exists before the message is observable to a worker.
/// An enqueue failure is logged and left to the recovery sweep; the
/// record is already durable so the job is never silently lost.
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_SOURCE_NAME)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            "query" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                query = Some(text);
            }
            _ => {} // ignore unknown fields
        }
    }

    let (source_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    validate_upload(&bytes).map_err(AppError::Core)?;
    let query = normalize_query(query.as_deref());

    let job_id = uuid::Uuid::now_v7();
    // Artifacts are keyed separately from jobs so repeated filenames
    // can never collide in staging.
    let artifact_id = uuid::Uuid::now_v7();

    let staged = state
        .artifacts
        .stage(artifact_id, &source_name, &bytes)
        .await
        .map_err(AppError::Core)?;
    let staged_path = staged.to_string_lossy().into_owned();

    let record = match state
        .store
        .insert(NewJob {
            id: job_id,
            query: query.clone(),
            source_name: source_name.clone(),
            staged_path: staged_path.clone(),
        })
        .await
    {
        Ok(record) => record,
        Err(err) => {
            // A staged artifact must never outlive a failed insert.
            if let Err(cleanup) = state.artifacts.remove_staged(&staged).await {
                tracing::warn!(error = %cleanup, "Could not roll back staged artifact");
            }
            return Err(err.into());
        }
    };

    let message = DispatchMessage {
        job_id: record.id,
        query: query.clone(),
        artifact_location: staged_path,
        source_name: source_name.clone(),
    };
    if let Err(err) = state.transport.enqueue(&message).await {
        // The record stays pending; the recovery sweep re-dispatches it.
        tracing::error!(job_id = %record.id, error = %err, "Enqueue failed; job awaits recovery sweep");
    }

    tracing::info!(job_id = %record.id, file = %source_name, "Analysis queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            status: "queued",
            task_id: record.id,
            query,
            file_processed: source_name,
            message: "Analysis queued successfully. Use /status/{task_id} to check progress.",
        }),
    ))
}

// ---------------------------------------------------------------------------
// Status / list / delete
// ---------------------------------------------------------------------------

/// GET /status/{task_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<JobId>,
) -> AppResult<Json<StatusResponse>> {
    let record = state
        .store
        .find(task_id)
        .await?
        .ok_or_else(|| not_found(task_id))?;
    Ok(Json(record.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Maximum number of results. Defaults to 10, capped at 100.
    pub limit: Option<i64>,
}

/// Default page size for `/results`.
const DEFAULT_LIMIT: i64 = 10;

/// Maximum page size for `/results`.
const MAX_LIMIT: i64 = 100;

/// GET /results?limit=N
pub async fn list_results(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT);
    let records = state.store.list_recent(limit).await?;
    Ok(Json(ListResponse {
        results: records.into_iter().map(Into::into).collect(),
    }))
}

/// DELETE /results/{task_id}
///
/// Removes the record permanently. Does not cancel an in-flight worker
/// claim; a worker finishing a deleted job no-ops safely.
pub async fn delete_result(
    State(state): State<AppState>,
    Path(task_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    if !state.store.delete(task_id).await? {
        return Err(not_found(task_id));
    }
    tracing::info!(job_id = %task_id, "Job record deleted");
    Ok(Json(json!({ "message": "Result deleted successfully" })))
}

// ---------------------------------------------------------------------------
// Queue introspection
// ---------------------------------------------------------------------------

/// GET /queue/status
///
/// Best-effort broker introspection. A broker failure degrades to an
/// error payload rather than a 5xx, so dashboards keep rendering.
pub async fn queue_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.transport.stats().await {
        Ok(stats) => Json(json!({
            "broker": state.transport.name(),
            "queued": stats.ready,
            "in_flight": stats.in_flight,
        })),
        Err(err) => Json(json!({
            "broker": state.transport.name(),
            "error": format!("Could not fetch queue status: {err}"),
        })),
    }
}

fn not_found(task_id: JobId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Task",
        id: task_id.to_string(),
    })
}
