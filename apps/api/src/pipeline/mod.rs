//! Batch Coordinator: drives each uploaded file through
//! extract → normalize → render → persist.
//!
//! Files are independent: each runs in its own task, bounded by a shared
//! semaphore, and a failure in one never affects the others. Results come
//! back in submission order with exactly one entry per file.
//!
//! Extraction and rendering are CPU-bound and run under `spawn_blocking`;
//! the generation call is the only async wait.

pub mod store;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::errors::PipelineError;
use crate::extraction;
use crate::models::document::{BatchEntry, BatchResult, RawDocument};
use crate::normalize::Normalizer;
use crate::pipeline::store::ArtifactStore;
use crate::render;

#[derive(Clone)]
pub struct BatchCoordinator {
    normalizer: Normalizer,
    store: ArtifactStore,
    permits: Arc<Semaphore>,
}

impl BatchCoordinator {
    pub fn new(normalizer: Normalizer, store: ArtifactStore, max_concurrent_files: usize) -> Self {
        Self {
            normalizer,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent_files.max(1))),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.normalizer.backend()
    }

    /// Processes every file and returns one entry per file, in input order.
    ///
    /// Spawned tasks are detached from this future: if the caller goes away
    /// mid-batch, files already in flight still finish and clean up.
    pub async fn process(&self, files: Vec<RawDocument>) -> BatchResult {
        let total = files.len();
        info!("Processing batch of {total} files via {}", self.backend());

        let handles: Vec<_> = files
            .into_iter()
            .map(|raw| {
                let name = raw.file_name.clone();
                let coordinator = self.clone();
                let handle = tokio::spawn(async move {
                    // The semaphore is never closed, so acquisition cannot fail.
                    let _permit = coordinator.permits.clone().acquire_owned().await.ok();
                    let name = raw.file_name.clone();
                    match coordinator.process_one(raw).await {
                        Ok(reference) => BatchEntry::rendered(name, reference),
                        Err(e) => BatchEntry::failed(name, &e),
                    }
                });
                (name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        for (name, handle) in handles {
            let entry = match handle.await {
                Ok(entry) => entry,
                Err(e) => {
                    error!("Task for {name} did not complete: {e}");
                    BatchEntry::failed(name, &aborted(e))
                }
            };
            results.push(entry);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            "Batch complete: {succeeded} succeeded, {} failed",
            total - succeeded
        );
        results
    }

    /// Runs one file through the whole pipeline and returns its download
    /// reference. The staged upload is removed on every exit path.
    pub async fn process_one(&self, raw: RawDocument) -> Result<String, PipelineError> {
        let file_name = raw.file_name.clone();
        let result = self.run(raw).await;
        match &result {
            Ok(reference) => info!("Anonymized {file_name} -> {reference}"),
            Err(e) => warn!("Failed to anonymize {file_name} ({}): {e}", e.kind()),
        }
        result
    }

    async fn run(&self, raw: RawDocument) -> Result<String, PipelineError> {
        // Unsupported files are rejected before anything touches disk.
        let format = raw.format()?;
        let source_name = raw.file_name.clone();

        let store = self.store.clone();
        let (_staged, text) = tokio::task::spawn_blocking(move || {
            let staged = store.stage(&raw, format)?;
            let text = extraction::extract_file(staged.path())?;
            Ok::<_, PipelineError>((staged, text))
        })
        .await
        .map_err(aborted)??;
        info!("Extracted {} characters from {source_name}", text.char_count());

        let record = self.normalizer.normalize(&text).await?;

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let rendered = render::render(&record, &source_name)?;
            Ok::<_, PipelineError>(store.persist(&rendered)?)
        })
        .await
        .map_err(aborted)?
    }
}

fn aborted(e: JoinError) -> PipelineError {
    PipelineError::Aborted(e.to_string())
}
