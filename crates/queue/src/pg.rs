//! PostgreSQL-backed [`QueueTransport`].
//!
//! Messages live in the `dispatch_queue` table. Dequeue claims the
//! oldest visible row with `FOR UPDATE SKIP LOCKED`, so concurrent
//! workers never receive the same row at the same time, and pushes
//! `visible_at` into the future. Ack deletes the row; a consumer that
//! dies without acking simply lets the row become visible again.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::message::DispatchMessage;
use crate::transport::{Delivery, QueueError, QueueStats, QueueTransport, Receipt};

/// Default redelivery window for unacknowledged messages.
const DEFAULT_VISIBILITY_SECS: i64 = 300;

/// Broker backed by the `dispatch_queue` table.
#[derive(Debug, Clone)]
pub struct PgQueue {
    pool: PgPool,
    visibility_secs: i64,
}

impl PgQueue {
    pub fn new(pool: PgPool) -> Self {
        Self::with_visibility_secs(pool, DEFAULT_VISIBILITY_SECS)
    }

    pub fn with_visibility_secs(pool: PgPool, visibility_secs: i64) -> Self {
        Self {
            pool,
            visibility_secs,
        }
    }
}

#[async_trait]
impl QueueTransport for PgQueue {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn enqueue(&self, message: &DispatchMessage) -> Result<(), QueueError> {
        let payload = serde_json::to_value(message)?;
        sqlx::query("INSERT INTO dispatch_queue (job_id, payload) VALUES ($1, $2)")
            .bind(message.job_id)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Delivery>, QueueError> {
        let row = sqlx::query(
            "UPDATE dispatch_queue \
             SET in_flight = TRUE, \
                 visible_at = NOW() + ($1 * INTERVAL '1 second') \
             WHERE id = ( \
                 SELECT id FROM dispatch_queue \
                 WHERE visible_at <= NOW() \
                 ORDER BY enqueued_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, payload",
        )
        .bind(self.visibility_secs)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let receipt: Receipt = row.get("id");
        let payload: serde_json::Value = row.get("payload");
        let message: DispatchMessage = serde_json::from_value(payload)?;
        Ok(Some(Delivery { receipt, message }))
    }

    async fn ack(&self, receipt: Receipt) -> Result<(), QueueError> {
        sqlx::query("DELETE FROM dispatch_queue WHERE id = $1")
            .bind(receipt)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, QueueError> {
        let row = sqlx::query(
            "SELECT \
                 COUNT(*) FILTER (WHERE visible_at <= NOW()) AS ready, \
                 COUNT(*) FILTER (WHERE in_flight AND visible_at > NOW()) AS in_flight \
             FROM dispatch_queue",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(QueueStats {
            ready: row.get::<Option<i64>, _>("ready").unwrap_or(0),
            in_flight: row.get::<Option<i64>, _>("in_flight").unwrap_or(0),
        })
    }
}
