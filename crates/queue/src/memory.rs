//! In-process [`QueueTransport`] used by tests and single-process
//! deployments. Same delivery semantics as [`PgQueue`](crate::PgQueue):
//! at-least-once with a visibility timeout.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::message::DispatchMessage;
use crate::transport::{Delivery, QueueError, QueueStats, QueueTransport, Receipt};

/// Default redelivery window for unacknowledged messages.
const DEFAULT_VISIBILITY: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct Inner {
    ready: VecDeque<DispatchMessage>,
    in_flight: HashMap<Receipt, (DispatchMessage, Instant)>,
}

/// Deque-backed transport. Cheap to construct per test.
#[derive(Debug)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
    next_receipt: AtomicI64,
    visibility: Duration,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_visibility(DEFAULT_VISIBILITY)
    }

    /// Use a custom visibility window (tests shrink this to exercise
    /// redelivery without waiting).
    pub fn with_visibility(visibility: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_receipt: AtomicI64::new(1),
            visibility,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move expired in-flight messages back to the ready queue.
    fn requeue_expired(inner: &mut Inner) {
        let now = Instant::now();
        let expired: Vec<Receipt> = inner
            .in_flight
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(receipt, _)| *receipt)
            .collect();
        for receipt in expired {
            if let Some((message, _)) = inner.in_flight.remove(&receipt) {
                inner.ready.push_back(message);
            }
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueTransport for MemoryQueue {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn enqueue(&self, message: &DispatchMessage) -> Result<(), QueueError> {
        self.lock().ready.push_back(message.clone());
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Delivery>, QueueError> {
        let mut inner = self.lock();
        Self::requeue_expired(&mut inner);

        let Some(message) = inner.ready.pop_front() else {
            return Ok(None);
        };
        let receipt = self.next_receipt.fetch_add(1, Ordering::Relaxed);
        inner
            .in_flight
            .insert(receipt, (message.clone(), Instant::now() + self.visibility));
        Ok(Some(Delivery { receipt, message }))
    }

    async fn ack(&self, receipt: Receipt) -> Result<(), QueueError> {
        self.lock().in_flight.remove(&receipt);
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, QueueError> {
        let mut inner = self.lock();
        Self::requeue_expired(&mut inner);
        Ok(QueueStats {
            ready: inner.ready.len() as i64,
            in_flight: inner.in_flight.len() as i64,
        })
    }
}
