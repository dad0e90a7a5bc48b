//! HTTP surface: the Submission Gateway and the Status Query Service.
//!
//! The gateway accepts uploads, stages them, inserts the pending job
//! record, and enqueues the dispatch message. The status service is a
//! read/delete-only projection over the job store; it never touches
//! the queue transport (except for the best-effort broker
//! introspection endpoint).

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
