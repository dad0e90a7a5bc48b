//! Filename conventions for staged uploads and analysis outputs.
//!
//! Staged inputs are keyed by a fresh artifact id (never the job id) so
//! repeated uploads of the same filename cannot collide. Output files
//! derive from the original filename plus the job id.

use crate::types::JobId;

/// Filename for a staged upload: `upload_{artifact_id}.{ext}`.
///
/// The extension is taken from the original filename; files without an
/// extension get `.bin`.
pub fn staged_file_name(artifact_id: JobId, source_name: &str) -> String {
    let ext = source_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    format!("upload_{artifact_id}.{}", ext.to_lowercase())
}

/// Filename for an analysis output: `{sanitized_stem}_{job_id}.txt`.
///
/// # Examples
///
/// ```
/// use finsight_core::naming::output_file_name;
///
/// let id = uuid::Uuid::nil();
/// assert_eq!(
///     output_file_name("Q3 Report.pdf", id),
///     format!("q3_report_{id}.txt"),
/// );
/// ```
pub fn output_file_name(source_name: &str, job_id: JobId) -> String {
    let stem = source_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(source_name);
    format!("{}_{job_id}.txt", sanitize_stem(stem))
}

/// Lowercase a filename stem and replace anything that is not
/// alphanumeric with underscores, collapsing runs.
fn sanitize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut last_was_sep = true;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("document");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_name_uses_artifact_id_and_extension() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            staged_file_name(id, "report.PDF"),
            format!("upload_{id}.pdf")
        );
    }

    #[test]
    fn staged_name_defaults_to_bin_without_extension() {
        let id = uuid::Uuid::nil();
        assert_eq!(staged_file_name(id, "report"), format!("upload_{id}.bin"));
        // A trailing dot is not a usable extension.
        assert_eq!(staged_file_name(id, "report."), format!("upload_{id}.bin"));
    }

    #[test]
    fn output_name_sanitizes_stem() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            output_file_name("Q3 Report (final).pdf", id),
            format!("q3_report_final_{id}.txt")
        );
    }

    #[test]
    fn output_name_handles_pathological_stems() {
        let id = uuid::Uuid::nil();
        assert_eq!(output_file_name("....pdf", id), format!("document_{id}.txt"));
    }
}
