//! The Analysis Engine seam.
//!
//! The pipeline treats document analysis as an external collaborator:
//! anything implementing [`AnalysisEngine`] can be plugged into the
//! worker pool. The built-in [`summarizer::TextSummarizer`] is a
//! deterministic plain-text implementation; richer engines (LLM
//! backends, PDF extractors) are swappable implementations of the same
//! trait and are deliberately out of scope here.

pub mod summarizer;

use std::path::Path;

use async_trait::async_trait;

pub use summarizer::TextSummarizer;

/// Why an analysis attempt failed.
///
/// The `Display` form is what ends up in the job's `result_ref` (after
/// an `Error: ` prefix), so messages must be human-readable.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine looked at the document and could not analyze it.
    #[error("{0}")]
    Analysis(String),

    /// The staged document could not be read.
    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
}

/// A unit of analysis work: `(query, document) -> report text`.
///
/// Implementations must be safe to invoke repeatedly with the same
/// inputs; the pipeline itself never invokes an engine twice for one
/// job, but redelivery races make re-invocation theoretically possible.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn analyze(&self, query: &str, document: &Path) -> Result<String, EngineError>;
}
