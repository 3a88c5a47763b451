use crate::config::Config;
use crate::pipeline::store::ArtifactStore;
use crate::pipeline::BatchCoordinator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: BatchCoordinator,
    /// Same store the coordinator persists into; handlers read downloads from it.
    pub store: ArtifactStore,
    pub config: Config,
}

impl AppState {
    /// Absolute URL a client can fetch a stored output from.
    pub fn download_url(&self, reference: &str) -> String {
        format!(
            "{}/api/v1/download/{reference}",
            self.config.public_base_url.trim_end_matches('/')
        )
    }
}
