//! The `QueueTransport` trait: broker-agnostic enqueue/dequeue/ack.

use async_trait::async_trait;
use serde::Serialize;

use crate::message::DispatchMessage;

/// Broker-assigned handle for one delivery, passed back on ack.
pub type Receipt = i64;

/// One dequeued message plus the receipt needed to acknowledge it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub receipt: Receipt,
    pub message: DispatchMessage,
}

/// Best-effort broker introspection for `/queue/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueStats {
    /// Messages ready for delivery.
    pub ready: i64,
    /// Messages delivered but not yet acknowledged.
    pub in_flight: i64,
}

/// Errors surfaced by a queue transport.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("broker error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("message serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("queue transport unavailable: {0}")]
    Unavailable(String),
}

/// At-least-once message channel from submitters to workers.
///
/// A dequeued message stays invisible for the broker's visibility
/// window; if the consumer never acks (crash, store write failure) the
/// message becomes deliverable again. Consumers must therefore ack only
/// after their status write succeeded, and must tolerate duplicates.
/// No ordering is guaranteed across jobs.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Short broker identifier for introspection payloads.
    fn name(&self) -> &'static str;

    async fn enqueue(&self, message: &DispatchMessage) -> Result<(), QueueError>;

    /// Pull the next visible message, if any. Non-blocking; workers
    /// poll on an interval.
    async fn dequeue(&self) -> Result<Option<Delivery>, QueueError>;

    /// Permanently consume a delivered message.
    async fn ack(&self, receipt: Receipt) -> Result<(), QueueError>;

    async fn stats(&self) -> Result<QueueStats, QueueError>;
}
