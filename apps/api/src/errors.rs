use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Per-file failure raised by one stage of the anonymization pipeline.
///
/// Every variant is non-fatal to a batch: the coordinator records it against
/// the file that produced it and moves on to the next file.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file type for {file_name}. Please upload .pdf or .docx files only.")]
    UnsupportedFormat { file_name: String },

    #[error("Failed to extract text: {0}")]
    Extraction(String),

    #[error("Failed to parse resume with the AI model: {0}")]
    Normalization(String),

    #[error("Failed to format document: {0}")]
    Render(String),

    #[error("Failed to store document: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Processing aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Stable machine-readable tag, used in batch results and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat { .. } => "unsupported_format",
            PipelineError::Extraction(_) => "extraction",
            PipelineError::Normalization(_) => "normalization",
            PipelineError::Render(_) => "render",
            PipelineError::Storage(_) => "storage",
            PipelineError::Aborted(_) => "aborted",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(e @ PipelineError::UnsupportedFormat { .. }) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT", e.to_string())
            }
            AppError::Pipeline(e @ PipelineError::Extraction(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                e.to_string(),
            ),
            AppError::Pipeline(e @ PipelineError::Normalization(_)) => {
                tracing::error!("Normalization error: {e}");
                (StatusCode::BAD_GATEWAY, "NORMALIZATION_ERROR", e.to_string())
            }
            AppError::Pipeline(e @ PipelineError::Render(_)) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    e.to_string(),
                )
            }
            AppError::Pipeline(e @ PipelineError::Storage(_)) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Pipeline(e @ PipelineError::Aborted(_)) => {
                tracing::error!("Aborted: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_kinds_are_stable() {
        let unsupported = PipelineError::UnsupportedFormat {
            file_name: "resume.xyz".to_string(),
        };
        assert_eq!(unsupported.kind(), "unsupported_format");
        assert_eq!(PipelineError::Extraction("x".into()).kind(), "extraction");
        assert_eq!(
            PipelineError::Normalization("x".into()).kind(),
            "normalization"
        );
        assert_eq!(PipelineError::Render("x".into()).kind(), "render");
    }

    #[test]
    fn test_unsupported_format_maps_to_bad_request() {
        let err = AppError::from(PipelineError::UnsupportedFormat {
            file_name: "cv.txt".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_extraction_maps_to_unprocessable_entity() {
        let err = AppError::from(PipelineError::Extraction("no text".into()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_normalization_maps_to_bad_gateway() {
        let err = AppError::from(PipelineError::Normalization("bad json".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::NotFound("missing.docx".into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
