//! Job entity model: one row per submitted analysis job.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use finsight_core::types::{JobId, Timestamp};

/// Placeholder `result_ref` while a job is non-terminal.
pub const RESULT_PLACEHOLDER: &str = "Processing...";

/// Lifecycle state of a job.
///
/// Transitions only along `Pending -> Processing -> {Completed, Failed}`.
/// `Completed` and `Failed` are terminal; the store implementations
/// refuse any further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether no further transitions are permitted.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Lowercase wire/database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `analysis_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRecord {
    /// External handle and idempotency key, assigned at submission.
    pub id: JobId,
    /// Instruction text; never empty (blank submissions get a default).
    pub query: String,
    /// Original upload filename, for display.
    pub source_name: String,
    pub status: JobStatus,
    /// Placeholder while non-terminal; output path on completion; an
    /// `Error: ...` description on failure.
    pub result_ref: String,
    /// Staged input location, kept until the job is terminal so a lost
    /// dispatch message can be rebuilt from the record.
    pub staged_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields supplied by the gateway when inserting a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: JobId,
    pub query: String,
    pub source_name: String,
    pub staged_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }
}
