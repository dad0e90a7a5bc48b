//! In-memory [`JobStore`] for tests and single-process deployments.
//!
//! All mutations happen under one `RwLock` write guard, which makes the
//! claim transition trivially linearizable per record. Semantics match
//! `PgJobStore` exactly; the worker and api test suites run against
//! this implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use finsight_core::types::{JobId, Timestamp};

use crate::models::job::RESULT_PLACEHOLDER;
use crate::models::{JobRecord, JobStatus, NewJob};

use super::{ClaimOutcome, JobStore, StoreError};

#[derive(Debug, Clone)]
struct StoredJob {
    /// Insertion sequence; tie-breaker for `list_recent` ordering when
    /// two jobs share a `created_at` timestamp.
    seq: u64,
    record: JobRecord,
}

/// Map-backed implementation of [`JobStore`].
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, StoredJob>>,
    seq: AtomicU64,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<JobId, StoredJob>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<JobId, StoredJob>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, new: NewJob) -> Result<JobRecord, StoreError> {
        let now = Utc::now();
        let record = JobRecord {
            id: new.id,
            query: new.query,
            source_name: new.source_name,
            status: JobStatus::Pending,
            result_ref: RESULT_PLACEHOLDER.to_string(),
            staged_path: Some(new.staged_path),
            created_at: now,
            updated_at: now,
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.write().insert(
            record.id,
            StoredJob {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn find(&self, id: JobId) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.read().get(&id).map(|j| j.record.clone()))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<JobRecord>, StoreError> {
        let mut jobs: Vec<StoredJob> = self.read().values().cloned().collect();
        jobs.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs.into_iter().map(|j| j.record).collect())
    }

    async fn delete(&self, id: JobId) -> Result<bool, StoreError> {
        Ok(self.write().remove(&id).is_some())
    }

    async fn try_claim(&self, id: JobId) -> Result<ClaimOutcome, StoreError> {
        let mut jobs = self.write();
        match jobs.get_mut(&id) {
            None => Ok(ClaimOutcome::Missing),
            Some(job) if job.record.status == JobStatus::Pending => {
                job.record.status = JobStatus::Processing;
                job.record.updated_at = Utc::now();
                Ok(ClaimOutcome::Claimed)
            }
            Some(job) => Ok(ClaimOutcome::Stale(job.record.status)),
        }
    }

    async fn complete(&self, id: JobId, result_ref: &str) -> Result<bool, StoreError> {
        Ok(self.finish(id, JobStatus::Completed, result_ref))
    }

    async fn fail(&self, id: JobId, error_ref: &str) -> Result<bool, StoreError> {
        Ok(self.finish(id, JobStatus::Failed, error_ref))
    }

    async fn stale_processing(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError> {
        Ok(self.stale(JobStatus::Processing, cutoff, limit))
    }

    async fn stale_pending(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError> {
        Ok(self.stale(JobStatus::Pending, cutoff, limit))
    }
}

impl MemoryJobStore {
    /// Shared `processing -> terminal` transition; refuses anything else.
    fn finish(&self, id: JobId, status: JobStatus, result_ref: &str) -> bool {
        let mut jobs = self.write();
        match jobs.get_mut(&id) {
            Some(job) if job.record.status == JobStatus::Processing => {
                job.record.status = status;
                job.record.result_ref = result_ref.to_string();
                job.record.staged_path = None;
                job.record.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    fn stale(&self, status: JobStatus, cutoff: Timestamp, limit: i64) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self
            .read()
            .values()
            .filter(|j| j.record.status == status && j.record.updated_at < cutoff)
            .map(|j| j.record.clone())
            .collect();
        records.sort_by_key(|r| r.updated_at);
        records.truncate(limit.max(0) as usize);
        records
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;

    use super::*;

    fn new_job(name: &str) -> NewJob {
        NewJob {
            id: uuid::Uuid::now_v7(),
            query: "What is the revenue?".into(),
            source_name: name.into(),
            staged_path: format!("staging/{name}"),
        }
    }

    #[tokio::test]
    async fn insert_starts_pending_with_placeholder() {
        let store = MemoryJobStore::new();
        let record = store.insert(new_job("a.pdf")).await.unwrap();

        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(record.result_ref, RESULT_PLACEHOLDER);
        assert!(record.staged_path.is_some());

        let found = store.find(record.id).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn claim_wins_once_then_reports_stale() {
        let store = MemoryJobStore::new();
        let record = store.insert(new_job("a.pdf")).await.unwrap();

        assert_matches!(store.try_claim(record.id).await.unwrap(), ClaimOutcome::Claimed);
        assert_matches!(
            store.try_claim(record.id).await.unwrap(),
            ClaimOutcome::Stale(JobStatus::Processing)
        );
    }

    #[tokio::test]
    async fn claim_on_missing_job_reports_missing() {
        let store = MemoryJobStore::new();
        assert_matches!(
            store.try_claim(uuid::Uuid::now_v7()).await.unwrap(),
            ClaimOutcome::Missing
        );
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let store = std::sync::Arc::new(MemoryJobStore::new());
        let record = store.insert(new_job("a.pdf")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = record.id;
            handles.push(tokio::spawn(async move { store.try_claim(id).await.unwrap() }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() == ClaimOutcome::Claimed {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn terminal_records_cannot_be_mutated() {
        let store = MemoryJobStore::new();
        let record = store.insert(new_job("a.pdf")).await.unwrap();

        store.try_claim(record.id).await.unwrap();
        assert!(store.complete(record.id, "outputs/a.txt").await.unwrap());

        // Completed is terminal: no failure, no re-claim, no re-complete.
        assert!(!store.fail(record.id, "Error: too late").await.unwrap());
        assert!(!store.complete(record.id, "outputs/b.txt").await.unwrap());
        assert_matches!(
            store.try_claim(record.id).await.unwrap(),
            ClaimOutcome::Stale(JobStatus::Completed)
        );

        let found = store.find(record.id).await.unwrap().unwrap();
        assert_eq!(found.result_ref, "outputs/a.txt");
        assert_eq!(found.staged_path, None);
    }

    #[tokio::test]
    async fn complete_requires_a_prior_claim() {
        let store = MemoryJobStore::new();
        let record = store.insert(new_job("a.pdf")).await.unwrap();

        // pending -> completed must not skip processing.
        assert!(!store.complete(record.id, "outputs/a.txt").await.unwrap());
        let found = store.find(record.id).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn list_recent_orders_and_limits() {
        let store = MemoryJobStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let record = store.insert(new_job(&format!("{i}.pdf"))).await.unwrap();
            ids.push(record.id);
        }

        let listed = store.list_recent(3).await.unwrap();
        assert_eq!(listed.len(), 3);
        // Most recent first.
        assert_eq!(listed[0].id, ids[4]);
        assert_eq!(listed[1].id, ids[3]);
        assert_eq!(listed[2].id, ids[2]);
    }

    #[tokio::test]
    async fn delete_is_permanent_and_reports_unknown_ids() {
        let store = MemoryJobStore::new();
        let record = store.insert(new_job("a.pdf")).await.unwrap();

        assert!(store.delete(record.id).await.unwrap());
        assert!(!store.delete(record.id).await.unwrap());
        assert!(store.find(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_queries_filter_by_status_and_age() {
        let store = MemoryJobStore::new();
        let pending = store.insert(new_job("a.pdf")).await.unwrap();
        let claimed = store.insert(new_job("b.pdf")).await.unwrap();
        store.try_claim(claimed.id).await.unwrap();

        let future = Utc::now() + Duration::seconds(5);
        let stale_pending = store.stale_pending(future, 10).await.unwrap();
        assert_eq!(stale_pending.len(), 1);
        assert_eq!(stale_pending[0].id, pending.id);

        let stale_processing = store.stale_processing(future, 10).await.unwrap();
        assert_eq!(stale_processing.len(), 1);
        assert_eq!(stale_processing[0].id, claimed.id);

        // Nothing is stale relative to a cutoff in the past.
        let past = Utc::now() - Duration::seconds(5);
        assert!(store.stale_pending(past, 10).await.unwrap().is_empty());
    }
}
