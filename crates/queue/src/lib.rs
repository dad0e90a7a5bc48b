//! Queue Transport: at-least-once delivery of dispatch messages from
//! the submission gateway to the worker pool.
//!
//! The transport is a pass-through; it never holds authoritative job
//! state. [`PgQueue`] backs it with a PostgreSQL table using `FOR
//! UPDATE SKIP LOCKED` and a visibility timeout; [`MemoryQueue`] backs
//! it with an in-process deque for tests.

pub mod memory;
pub mod message;
pub mod pg;
pub mod transport;

pub use memory::MemoryQueue;
pub use message::DispatchMessage;
pub use pg::PgQueue;
pub use transport::{Delivery, QueueError, QueueStats, QueueTransport, Receipt};
