//! Text Extractor: turns an uploaded PDF or DOCX into newline-joined plain text.
//!
//! Both parsers are synchronous and CPU-bound; async callers should run them
//! under `spawn_blocking`.

mod docx;
mod pdf;

use std::path::Path;

use crate::errors::PipelineError;
use crate::models::document::{DocumentFormat, ExtractedText, RawDocument};

/// Extracts text from an in-memory document.
///
/// Fails with `UnsupportedFormat` before any parsing when the file name has
/// an extension other than `.pdf` / `.docx`.
pub fn extract(raw: &RawDocument) -> Result<ExtractedText, PipelineError> {
    let format = raw.format()?;
    extract_bytes(format, &raw.bytes)
}

/// Extracts text from a document already staged on disk. The format comes
/// from the staged file's extension.
pub fn extract_file(path: &Path) -> Result<ExtractedText, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| {
        PipelineError::Extraction(format!("Failed to read {}: {e}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    extract(&RawDocument::new(file_name, bytes))
}

fn extract_bytes(format: DocumentFormat, bytes: &[u8]) -> Result<ExtractedText, PipelineError> {
    let text = match format {
        DocumentFormat::Pdf => pdf::extract_text(bytes)?,
        DocumentFormat::Docx => docx::extract_text(bytes)?,
    };
    ExtractedText::new(text)
}

/// A DOCX upload with one paragraph per line, for tests outside this module.
#[cfg(test)]
pub(crate) fn docx_fixture(lines: &[&str]) -> Vec<u8> {
    docx::tests::build_docx(lines)
}
