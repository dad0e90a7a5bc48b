//! The transient message handed from gateway to worker.

use serde::{Deserialize, Serialize};

use finsight_core::types::JobId;

/// Everything a worker needs to process one job.
///
/// Not authoritative: the job record is. Loss is recoverable (the
/// recovery sweep rebuilds the message from the record's staged path)
/// and duplication is harmless (the claim compare-and-set dedupes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub job_id: JobId,
    pub query: String,
    pub artifact_location: String,
    pub source_name: String,
}
