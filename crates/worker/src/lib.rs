//! Worker Pool: pulls dispatch messages, claims jobs, runs the
//! analysis engine, and records terminal outcomes.
//!
//! The pool is N independent polling loops over a shared
//! [`QueueTransport`](finsight_queue::QueueTransport); the only
//! coordination between workers is the job store's claim
//! compare-and-set. The recovery sweep runs alongside them as a
//! separate periodic task.

pub mod config;
pub mod runner;
pub mod sweep;

pub use config::WorkerConfig;
pub use runner::{process_delivery, ProcessOutcome, WorkerContext, WorkerPool};
pub use sweep::RecoverySweep;
