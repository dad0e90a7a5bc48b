//! Recovery sweep: reconciles jobs the happy path lost track of.
//!
//! Two conditions are remediated, both bounded per pass and logged:
//!
//! - `pending` records older than the pending threshold have no live
//!   dispatch message (the enqueue failed, or the broker lost it).
//!   Their message is rebuilt from the record and re-enqueued; if the
//!   original message still exists the duplicate is harmless, because
//!   the claim compare-and-set lets only one delivery win.
//! - `processing` records older than the processing threshold belong
//!   to a worker that died mid-job. They are marked `failed` with an
//!   explicit reason. Re-dispatch is deliberately not attempted: the
//!   pipeline guarantees at most one engine attempt per job.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use finsight_db::models::JobRecord;
use finsight_queue::DispatchMessage;

use crate::config::WorkerConfig;
use crate::runner::WorkerContext;

/// Result description stored on orphaned `processing` records.
const ORPHANED_RESULT: &str =
    "Error: processing was interrupted (worker terminated unexpectedly)";

/// Counters for one sweep pass, mainly for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub redispatched: usize,
    pub orphaned_failed: usize,
}

/// Periodic background task performing the recovery sweep.
pub struct RecoverySweep {
    ctx: WorkerContext,
    config: WorkerConfig,
}

impl RecoverySweep {
    pub fn new(ctx: WorkerContext, config: WorkerConfig) -> Self {
        Self { ctx, config }
    }

    /// Run until cancelled, sweeping once per configured interval.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            stale_pending_secs = self.config.stale_pending.num_seconds(),
            stale_processing_secs = self.config.stale_processing.num_seconds(),
            "Recovery sweep started"
        );
        let mut ticker = tokio::time::interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Recovery sweep stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if report.redispatched > 0 || report.orphaned_failed > 0 => {
                            tracing::info!(
                                redispatched = report.redispatched,
                                orphaned_failed = report.orphaned_failed,
                                "Recovery sweep remediated jobs"
                            );
                        }
                        Ok(_) => {
                            tracing::debug!("Recovery sweep: nothing to do");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Recovery sweep failed");
                        }
                    }
                }
            }
        }
    }

    /// One bounded pass over both stale conditions.
    pub async fn sweep_once(
        &self,
    ) -> Result<SweepReport, Box<dyn std::error::Error + Send + Sync>> {
        let mut report = SweepReport::default();
        let now = Utc::now();
        let limit = self.config.sweep_batch_limit;

        let pending_cutoff = now - self.config.stale_pending;
        for record in self.ctx.store.stale_pending(pending_cutoff, limit).await? {
            match self.redispatch(&record).await {
                Ok(true) => report.redispatched += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(job_id = %record.id, error = %e, "Re-dispatch failed");
                }
            }
        }

        let processing_cutoff = now - self.config.stale_processing;
        for record in self
            .ctx
            .store
            .stale_processing(processing_cutoff, limit)
            .await?
        {
            if self.ctx.store.fail(record.id, ORPHANED_RESULT).await? {
                tracing::warn!(job_id = %record.id, "Marked orphaned processing job as failed");
                report.orphaned_failed += 1;
            }
        }

        Ok(report)
    }

    /// Rebuild and enqueue the dispatch message for a stranded pending
    /// record. Skips records without a staged path (nothing to hand a
    /// worker).
    async fn redispatch(
        &self,
        record: &JobRecord,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let Some(staged_path) = record.staged_path.clone() else {
            tracing::warn!(job_id = %record.id, "Stale pending job has no staged artifact; skipping");
            return Ok(false);
        };

        let message = DispatchMessage {
            job_id: record.id,
            query: record.query.clone(),
            artifact_location: staged_path,
            source_name: record.source_name.clone(),
        };
        self.ctx.transport.enqueue(&message).await?;
        tracing::info!(job_id = %record.id, "Re-dispatched stale pending job");
        Ok(true)
    }
}
