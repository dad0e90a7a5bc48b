//! Worker loops and the per-message processing algorithm.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use finsight_core::artifacts::ArtifactStore;
use finsight_core::types::JobId;
use finsight_db::{ClaimOutcome, JobStore, StoreError};
use finsight_engine::{AnalysisEngine, EngineError};
use finsight_queue::{Delivery, QueueTransport};

use crate::config::WorkerConfig;

/// Shared collaborators handed to every worker loop.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<dyn JobStore>,
    pub transport: Arc<dyn QueueTransport>,
    pub engine: Arc<dyn AnalysisEngine>,
    pub artifacts: Arc<ArtifactStore>,
    /// Optional per-job deadline on the engine call.
    pub engine_timeout: Option<Duration>,
}

/// What processing one delivery decided. Every variant represents a
/// durable decision, so the delivery is acknowledged afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed,
    Failed,
    /// The record was already past `pending` at claim time, or left
    /// `processing` while the engine ran; the late result is discarded.
    DuplicateDiscarded,
    /// The record no longer exists; the job was deleted.
    MissingDiscarded,
}

/// Process one dispatch message end to end.
///
/// Claim-before-work: the `pending -> processing` compare-and-set is
/// taken before the engine runs, so at most one delivery of a message
/// ever executes the engine. Errors returned here are store failures;
/// the caller must leave the delivery unacknowledged so the broker
/// redelivers it.
pub async fn process_delivery(
    ctx: &WorkerContext,
    delivery: &Delivery,
) -> Result<ProcessOutcome, StoreError> {
    let message = &delivery.message;
    let job_id = message.job_id;
    let staged = std::path::Path::new(&message.artifact_location);

    match ctx.store.try_claim(job_id).await? {
        ClaimOutcome::Missing => {
            // The job was deleted while queued. Nothing owns the staged
            // file anymore, so remove it here.
            tracing::info!(job_id = %job_id, "Discarding message for deleted job");
            remove_staged(ctx, staged, job_id).await;
            return Ok(ProcessOutcome::MissingDiscarded);
        }
        ClaimOutcome::Stale(status) => {
            tracing::debug!(job_id = %job_id, %status, "Discarding duplicate delivery");
            if status.is_terminal() {
                remove_staged(ctx, staged, job_id).await;
            }
            return Ok(ProcessOutcome::DuplicateDiscarded);
        }
        ClaimOutcome::Claimed => {}
    }

    tracing::info!(job_id = %job_id, source = %message.source_name, "Job claimed");

    let outcome = match run_engine(ctx, &message.query, staged).await {
        Ok(text) => {
            match ctx
                .artifacts
                .write_output(job_id, &message.source_name, &text)
                .await
            {
                Ok(output_path) => {
                    let output_ref = output_path.to_string_lossy().into_owned();
                    if ctx.store.complete(job_id, &output_ref).await? {
                        tracing::info!(job_id = %job_id, output = %output_ref, "Job completed");
                        ProcessOutcome::Completed
                    } else {
                        // The record left `processing` while the engine
                        // ran (deleted, or failed by the recovery
                        // sweep). The output just written has no owning
                        // record; remove it.
                        if let Err(err) = ctx.artifacts.remove_output(&output_path).await {
                            tracing::warn!(job_id = %job_id, error = %err, "Could not remove orphaned output");
                        }
                        discarded(ctx, job_id).await?
                    }
                }
                Err(err) => {
                    let reason = format!("Error: failed to persist analysis output: {err}");
                    if ctx.store.fail(job_id, &reason).await? {
                        tracing::error!(job_id = %job_id, error = %err, "Output write failed");
                        ProcessOutcome::Failed
                    } else {
                        discarded(ctx, job_id).await?
                    }
                }
            }
        }
        Err(err) => {
            // One attempt only: engine failures become a terminal
            // failed record, never a retry.
            let reason = format!("Error: {err}");
            if ctx.store.fail(job_id, &reason).await? {
                tracing::warn!(job_id = %job_id, error = %err, "Analysis failed");
                ProcessOutcome::Failed
            } else {
                discarded(ctx, job_id).await?
            }
        }
    };

    remove_staged(ctx, staged, job_id).await;
    Ok(outcome)
}

/// The record left `processing` behind our back; classify why so the
/// caller can ack with an accurate outcome.
async fn discarded(ctx: &WorkerContext, job_id: JobId) -> Result<ProcessOutcome, StoreError> {
    match ctx.store.find(job_id).await? {
        None => {
            tracing::info!(job_id = %job_id, "Job deleted during processing; result discarded");
            Ok(ProcessOutcome::MissingDiscarded)
        }
        Some(record) => {
            tracing::info!(job_id = %job_id, status = %record.status, "Job finished elsewhere; result discarded");
            Ok(ProcessOutcome::DuplicateDiscarded)
        }
    }
}

/// Invoke the engine, applying the configured deadline if any.
async fn run_engine(
    ctx: &WorkerContext,
    query: &str,
    document: &std::path::Path,
) -> Result<String, EngineError> {
    match ctx.engine_timeout {
        None => ctx.engine.analyze(query, document).await,
        Some(deadline) => {
            match tokio::time::timeout(deadline, ctx.engine.analyze(query, document)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Analysis(format!(
                    "analysis exceeded the {}s deadline",
                    deadline.as_secs()
                ))),
            }
        }
    }
}

/// Best-effort staged-input cleanup; never affects job status.
async fn remove_staged(ctx: &WorkerContext, staged: &std::path::Path, job_id: JobId) {
    if let Err(err) = ctx.artifacts.remove_staged(staged).await {
        tracing::warn!(job_id = %job_id, error = %err, "Could not remove staged artifact");
    }
}

/// N independent worker loops over the shared transport.
pub struct WorkerPool {
    ctx: WorkerContext,
    config: WorkerConfig,
}

impl WorkerPool {
    pub fn new(ctx: WorkerContext, config: WorkerConfig) -> Self {
        Self { ctx, config }
    }

    /// Spawn the configured number of worker loops. Each runs until the
    /// cancellation token fires.
    pub fn spawn(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        (0..self.config.concurrency)
            .map(|worker_id| {
                let ctx = self.ctx.clone();
                let poll_interval = self.config.poll_interval;
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    run_worker(worker_id, ctx, poll_interval, cancel).await;
                })
            })
            .collect()
    }
}

/// One worker loop: poll, process, ack.
async fn run_worker(
    worker_id: usize,
    ctx: WorkerContext,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(worker_id, "Worker started");
    let mut ticker = tokio::time::interval(poll_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(worker_id, "Worker shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = poll_once(worker_id, &ctx).await {
                    tracing::error!(worker_id, error = %e, "Worker cycle failed");
                }
            }
        }
    }
}

/// Dequeue and process at most one message.
///
/// The delivery is acknowledged only after `process_delivery` recorded
/// a durable decision; on a store failure the message stays in flight
/// and the broker redelivers it after the visibility window.
async fn poll_once(
    worker_id: usize,
    ctx: &WorkerContext,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(delivery) = ctx.transport.dequeue().await? else {
        return Ok(());
    };

    tracing::debug!(
        worker_id,
        job_id = %delivery.message.job_id,
        "Message received"
    );

    match process_delivery(ctx, &delivery).await {
        Ok(outcome) => {
            tracing::debug!(worker_id, job_id = %delivery.message.job_id, ?outcome, "Acknowledging message");
            ctx.transport.ack(delivery.receipt).await?;
            Ok(())
        }
        Err(err) => {
            tracing::error!(
                worker_id,
                job_id = %delivery.message.job_id,
                error = %err,
                "Status write failed; leaving message for redelivery"
            );
            Err(err.into())
        }
    }
}
