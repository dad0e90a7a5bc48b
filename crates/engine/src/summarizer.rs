//! Built-in plain-text analysis engine.
//!
//! Treats the staged document as UTF-8 text and produces a small
//! deterministic report: size, line counts, how many lines carry
//! figures, and a short excerpt. Good enough to exercise the pipeline
//! end to end; anything smarter belongs in a separate engine.

use std::path::Path;

use async_trait::async_trait;

use crate::{AnalysisEngine, EngineError};

/// Lines shown in the report excerpt.
const EXCERPT_LINES: usize = 5;

/// Maximum characters kept per excerpt line.
const EXCERPT_LINE_LEN: usize = 120;

/// Deterministic text-statistics engine.
#[derive(Debug, Default, Clone)]
pub struct TextSummarizer;

impl TextSummarizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisEngine for TextSummarizer {
    async fn analyze(&self, query: &str, document: &Path) -> Result<String, EngineError> {
        let bytes = tokio::fs::read(document).await?;
        let text = String::from_utf8_lossy(&bytes);

        let lines: Vec<&str> = text.lines().collect();
        let non_empty: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        if non_empty.is_empty() {
            return Err(EngineError::Analysis(
                "document contains no readable text".into(),
            ));
        }

        let numeric_lines = non_empty
            .iter()
            .filter(|l| l.chars().any(|c| c.is_ascii_digit()))
            .count();

        let document_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.display().to_string());

        let mut report = String::new();
        report.push_str(&format!("Analysis of '{document_name}'\n"));
        report.push_str(&format!("Query: {query}\n\n"));
        report.push_str(&format!(
            "Document statistics: {} bytes, {} lines ({} non-empty, {} containing figures).\n\n",
            bytes.len(),
            lines.len(),
            non_empty.len(),
            numeric_lines,
        ));

        report.push_str("Excerpt:\n");
        for line in non_empty.iter().take(EXCERPT_LINES) {
            let mut shown: String = line.chars().take(EXCERPT_LINE_LEN).collect();
            if line.chars().count() > EXCERPT_LINE_LEN {
                shown.push('…');
            }
            report.push_str(&format!("  {shown}\n"));
        }

        report.push_str(&format!(
            "\nSummary: {} of {} content lines reference figures; review the excerpt above \
             against the query \"{query}\".\n",
            numeric_lines,
            non_empty.len(),
        ));

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_doc(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn report_includes_query_and_counts() {
        let (_dir, path) = write_doc("Revenue: 1000\n\nCosts: 400\nOutlook strong\n");
        let engine = TextSummarizer::new();

        let report = engine.analyze("What is the revenue?", &path).await.unwrap();

        assert!(report.contains("Query: What is the revenue?"));
        assert!(report.contains("3 non-empty"));
        assert!(report.contains("2 containing figures"));
        assert!(report.contains("Revenue: 1000"));
    }

    #[tokio::test]
    async fn empty_document_fails_with_readable_reason() {
        let (_dir, path) = write_doc("\n   \n");
        let engine = TextSummarizer::new();

        let err = engine.analyze("anything", &path).await.unwrap_err();
        assert_eq!(err.to_string(), "document contains no readable text");
    }

    #[tokio::test]
    async fn missing_document_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TextSummarizer::new();

        let err = engine
            .analyze("anything", &dir.path().join("gone.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[tokio::test]
    async fn long_lines_are_truncated_in_excerpt() {
        let long = "x".repeat(300);
        let (_dir, path) = write_doc(&format!("{long}\n"));
        let engine = TextSummarizer::new();

        let report = engine.analyze("q", &path).await.unwrap();
        assert!(report.contains('…'));
        assert!(!report.contains(&long));
    }
}
