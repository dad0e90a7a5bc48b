//! Normalization and validation rules applied at submission time.

use crate::error::CoreError;

/// Query used when the submitter sends a blank or missing query.
/// A job is never stored with an empty query.
pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

/// Fallback display name for uploads without a usable filename.
pub const DEFAULT_SOURCE_NAME: &str = "document.pdf";

/// Trim the submitted query, falling back to [`DEFAULT_QUERY`] when the
/// result would be empty.
pub fn normalize_query(query: Option<&str>) -> String {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => DEFAULT_QUERY.to_string(),
    }
}

/// Reject empty uploads before anything is persisted.
pub fn validate_upload(bytes: &[u8]) -> Result<(), CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_falls_back_to_default() {
        assert_eq!(normalize_query(None), DEFAULT_QUERY);
        assert_eq!(normalize_query(Some("")), DEFAULT_QUERY);
        assert_eq!(normalize_query(Some("   \t ")), DEFAULT_QUERY);
    }

    #[test]
    fn query_is_trimmed() {
        assert_eq!(normalize_query(Some("  what is the revenue? ")), "what is the revenue?");
    }

    #[test]
    fn empty_upload_is_rejected() {
        assert!(validate_upload(b"").is_err());
        assert!(validate_upload(b"%PDF-1.7").is_ok());
    }
}
