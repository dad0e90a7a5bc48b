//! Domain primitives shared across the finsight workspace.
//!
//! This crate has no internal dependencies. It provides the common
//! error type, shared type aliases, artifact staging/output storage,
//! filename conventions, and submission normalization rules.

pub mod artifacts;
pub mod error;
pub mod naming;
pub mod submission;
pub mod types;
