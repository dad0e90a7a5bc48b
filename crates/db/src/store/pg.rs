//! PostgreSQL-backed [`JobStore`].
//!
//! All transitions are single conditional `UPDATE`s guarded on the
//! current status, so terminal rows can never be mutated and the claim
//! is linearizable per record without any source-level locking.

use async_trait::async_trait;
use sqlx::PgPool;

use finsight_core::types::{JobId, Timestamp};

use crate::models::job::RESULT_PLACEHOLDER;
use crate::models::{JobRecord, JobStatus, NewJob};

use super::{ClaimOutcome, JobStore, StoreError};

/// Column list for `analysis_jobs` queries.
const COLUMNS: &str =
    "id, query, source_name, status, result_ref, staged_path, created_at, updated_at";

/// PostgreSQL implementation of [`JobStore`].
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, new: NewJob) -> Result<JobRecord, StoreError> {
        let query = format!(
            "INSERT INTO analysis_jobs (id, query, source_name, status, result_ref, staged_path) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, JobRecord>(&query)
            .bind(new.id)
            .bind(&new.query)
            .bind(&new.source_name)
            .bind(JobStatus::Pending)
            .bind(RESULT_PLACEHOLDER)
            .bind(&new.staged_path)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find(&self, id: JobId) -> Result<Option<JobRecord>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM analysis_jobs WHERE id = $1");
        let record = sqlx::query_as::<_, JobRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<JobRecord>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM analysis_jobs ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        let records = sqlx::query_as::<_, JobRecord>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn delete(&self, id: JobId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM analysis_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn try_claim(&self, id: JobId) -> Result<ClaimOutcome, StoreError> {
        let result = sqlx::query(
            "UPDATE analysis_jobs \
             SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(JobStatus::Processing)
        .bind(JobStatus::Pending)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ClaimOutcome::Claimed);
        }

        // The CAS lost: distinguish a duplicate delivery from a deleted job.
        match self.find(id).await? {
            Some(record) => Ok(ClaimOutcome::Stale(record.status)),
            None => Ok(ClaimOutcome::Missing),
        }
    }

    async fn complete(&self, id: JobId, result_ref: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE analysis_jobs \
             SET status = $2, result_ref = $3, staged_path = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(JobStatus::Completed)
        .bind(result_ref)
        .bind(JobStatus::Processing)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fail(&self, id: JobId, error_ref: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE analysis_jobs \
             SET status = $2, result_ref = $3, staged_path = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(JobStatus::Failed)
        .bind(error_ref)
        .bind(JobStatus::Processing)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stale_processing(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError> {
        self.stale(JobStatus::Processing, cutoff, limit).await
    }

    async fn stale_pending(
        &self,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError> {
        self.stale(JobStatus::Pending, cutoff, limit).await
    }
}

impl PgJobStore {
    async fn stale(
        &self,
        status: JobStatus,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM analysis_jobs \
             WHERE status = $1 AND updated_at < $2 \
             ORDER BY updated_at ASC \
             LIMIT $3"
        );
        let records = sqlx::query_as::<_, JobRecord>(&query)
            .bind(status)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
