//! Document Renderer: deterministic `ResumeRecord` → DOCX.
//!
//! Every call builds an independent document; no template or numbering state
//! is shared between calls.

mod docx;
pub mod layout;

use crate::errors::PipelineError;
use crate::models::document::RenderedDocument;
use crate::models::resume::ResumeRecord;

const OUTPUT_SUFFIX: &str = "_anonymized.docx";

/// Renders `record` and names the result after the uploaded file.
pub fn render(record: &ResumeRecord, source_name: &str) -> Result<RenderedDocument, PipelineError> {
    let blocks = layout::layout(record)?;
    let bytes = docx::to_docx(&blocks)?;
    Ok(RenderedDocument {
        file_name: output_file_name(source_name),
        bytes,
    })
}

/// `{base name}_anonymized.docx`, with directories and the extension dropped
/// and anything outside `[A-Za-z0-9._-]` replaced by `_`.
pub fn output_file_name(source_name: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.trim_matches('.');
    if sanitized.is_empty() {
        format!("resume{OUTPUT_SUFFIX}")
    } else {
        format!("{sanitized}{OUTPUT_SUFFIX}")
    }
}
