//! The `JobStore` trait and its implementations.

mod memory;
mod pg;

pub use memory::MemoryJobStore;
pub use pg::PgJobStore;

use async_trait::async_trait;

use finsight_core::types::{JobId, Timestamp};

use crate::models::{JobRecord, JobStatus, NewJob};

/// Errors surfaced by a job store.
///
/// Store failures are transient infrastructure conditions, distinct
/// from "not found" (which the lookup methods express via `Option`).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

/// Result of the claim-before-work compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller won the `pending -> processing` transition and holds
    /// exclusive execution rights for the job.
    Claimed,
    /// The record was already past `pending` (duplicate delivery or a
    /// lost race). Not an error; the caller must discard its message.
    Stale(JobStatus),
    /// The record no longer exists (deleted job). Discard the message.
    Missing,
}

/// Durable table of job records; the single authority for job state.
///
/// Every mutation is a single atomic (conditional) update against one
/// record. [`try_claim`](JobStore::try_claim) is the one
/// concurrency-critical operation and must be linearizable per record.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Cheap reachability probe for health endpoints.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a new `pending` record with the placeholder result.
    async fn insert(&self, new: NewJob) -> Result<JobRecord, StoreError>;

    async fn find(&self, id: JobId) -> Result<Option<JobRecord>, StoreError>;

    /// Most-recent-first, at most `limit` records.
    async fn list_recent(&self, limit: i64) -> Result<Vec<JobRecord>, StoreError>;

    /// Remove a record permanently. Returns `false` if it did not exist.
    /// Does not cancel an in-flight worker claim.
    async fn delete(&self, id: JobId) -> Result<bool, StoreError>;

    /// Compare-and-set `pending -> processing`. Exactly one concurrent
    /// caller can observe [`ClaimOutcome::Claimed`] per record.
    async fn try_claim(&self, id: JobId) -> Result<ClaimOutcome, StoreError>;

    /// Transition `processing -> completed`, recording the output
    /// reference and clearing the staged path. Returns `false` when the
    /// record was not in `processing` (nothing is mutated).
    async fn complete(&self, id: JobId, result_ref: &str) -> Result<bool, StoreError>;

    /// Transition `processing -> failed`, recording a human-readable
    /// error description. Returns `false` when the record was not in
    /// `processing`.
    async fn fail(&self, id: JobId, error_ref: &str) -> Result<bool, StoreError>;

    /// Records stuck at `processing` since before `cutoff`, bounded by
    /// `limit`. Used by the recovery sweep.
    async fn stale_processing(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError>;

    /// Records still `pending` since before `cutoff` (their dispatch
    /// message is presumed lost), bounded by `limit`.
    async fn stale_pending(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError>;
}
