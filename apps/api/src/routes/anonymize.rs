use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{AppError, PipelineError};
use crate::models::document::{BatchEntry, RawDocument, DOCX_MIME};
use crate::pipeline::store::download_name;
use crate::state::AppState;

const BATCH_FIELD: &str = "files";
const SINGLE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<ResultView>,
}

/// A batch entry plus the URL its output can be fetched from.
#[derive(Debug, Serialize)]
pub struct ResultView {
    #[serde(flatten)]
    pub entry: BatchEntry,
    #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SingleResponse {
    #[serde(rename = "originalName")]
    pub original_name: String,
    #[serde(rename = "downloadReference")]
    pub download_reference: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// POST /api/v1/anonymize
/// Multipart body with one or more `files` parts. Per-file failures are
/// reported inline; the request itself only fails when no file was sent.
pub async fn handle_anonymize_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError> {
    let files = read_files(multipart, BATCH_FIELD).await?;
    if files.is_empty() {
        return Err(AppError::Validation(format!(
            "Expected at least one '{BATCH_FIELD}' field"
        )));
    }

    let results = state
        .coordinator
        .process(files)
        .await
        .into_iter()
        .map(|entry| ResultView {
            download_url: entry.download_reference().map(|r| state.download_url(r)),
            entry,
        })
        .collect();

    Ok(Json(BatchResponse { results }))
}

/// POST /api/v1/anonymize/single
/// Multipart body with a single `file` part.
pub async fn handle_anonymize_single(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SingleResponse>, AppError> {
    let raw = read_files(multipart, SINGLE_FIELD)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation(format!("Expected a '{SINGLE_FIELD}' field")))?;

    let original_name = raw.file_name.clone();
    let reference = state.coordinator.process_one(raw).await?;

    Ok(Json(SingleResponse {
        original_name,
        download_url: state.download_url(&reference),
        download_reference: reference,
    }))
}

/// GET /api/v1/download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state
        .store
        .load(&filename)
        .await
        .map_err(PipelineError::Storage)?
        .ok_or_else(|| AppError::NotFound(format!("File not found: {filename}")))?;

    info!("Serving {filename} ({} bytes)", bytes.len());
    let disposition = format!("attachment; filename=\"{}\"", download_name(&filename));
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Collects every file part named `field_name`, in the order sent.
async fn read_files(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Vec<RawDocument>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {file_name}: {e}")))?;
        debug!("Received {file_name} ({} bytes)", bytes.len());
        files.push(RawDocument::new(file_name, bytes));
    }
    Ok(files)
}
