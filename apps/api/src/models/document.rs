use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use crate::errors::PipelineError;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Input formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detects the format from a file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, PipelineError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            _ => Err(PipelineError::UnsupportedFormat {
                file_name: file_name.to_string(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => ".pdf",
            DocumentFormat::Docx => ".docx",
        }
    }
}

/// An uploaded file, owned by exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub file_name: String,
    pub bytes: Bytes,
}

impl RawDocument {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn format(&self) -> Result<DocumentFormat, PipelineError> {
        DocumentFormat::from_file_name(&self.file_name)
    }
}

/// Plain text pulled out of a document. Never empty or all-whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: String) -> Result<Self, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::Extraction(
                "Could not extract any text from the document".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// A rendered DOCX and the name it should be downloaded under.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Outcome for a single file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    #[serde(rename = "originalName")]
    pub original_name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Rendered {
        #[serde(rename = "downloadReference")]
        download_reference: String,
    },
    Failed {
        #[serde(rename = "errorKind")]
        error_kind: String,
        #[serde(rename = "errorDetail")]
        error_detail: String,
    },
}

impl BatchEntry {
    pub fn rendered(original_name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            outcome: FileOutcome::Rendered {
                download_reference: reference.into(),
            },
        }
    }

    pub fn failed(original_name: impl Into<String>, error: &PipelineError) -> Self {
        Self {
            original_name: original_name.into(),
            outcome: FileOutcome::Failed {
                error_kind: error.kind().to_string(),
                error_detail: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FileOutcome::Rendered { .. })
    }

    pub fn download_reference(&self) -> Option<&str> {
        match &self.outcome {
            FileOutcome::Rendered { download_reference } => Some(download_reference),
            FileOutcome::Failed { .. } => None,
        }
    }
}

/// One entry per submitted file, in submission order.
pub type BatchResult = Vec<BatchEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_file_name("Resume.PDF").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_file_name("cv.DocX").unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn test_unsupported_extensions_are_rejected() {
        for name in ["resume.xyz", "resume.doc", "resume", "resume.pdf.txt"] {
            let err = DocumentFormat::from_file_name(name).unwrap_err();
            assert!(
                matches!(err, PipelineError::UnsupportedFormat { .. }),
                "{name} should be unsupported"
            );
        }
    }

    #[test]
    fn test_extracted_text_rejects_whitespace_only() {
        assert!(ExtractedText::new("  \n\t ".to_string()).is_err());
        assert!(ExtractedText::new("Jane Doe".to_string()).is_ok());
    }

    #[test]
    fn test_batch_entry_serializes_camel_case() {
        let ok = serde_json::to_value(BatchEntry::rendered("a.pdf", "123_a_anonymized.docx"))
            .unwrap();
        assert_eq!(ok["originalName"], "a.pdf");
        assert_eq!(ok["downloadReference"], "123_a_anonymized.docx");

        let err = PipelineError::Extraction("empty".to_string());
        let failed = serde_json::to_value(BatchEntry::failed("b.docx", &err)).unwrap();
        assert_eq!(failed["originalName"], "b.docx");
        assert_eq!(failed["errorKind"], "extraction");
        assert!(failed["errorDetail"].as_str().unwrap().contains("empty"));
        assert!(failed.get("downloadReference").is_none());
    }
}
