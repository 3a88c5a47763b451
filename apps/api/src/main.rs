mod config;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod normalize;
mod pipeline;
mod render;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LlmProvider};
use crate::llm_client::{GeminiClient, LlmClient, TextGenerator};
use crate::normalize::Normalizer;
use crate::pipeline::store::ArtifactStore;
use crate::pipeline::BatchCoordinator;
use crate::routes::build_router;
use crate::state::AppState;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume anonymizer v{}", env!("CARGO_PKG_VERSION"));

    let generator = build_generator(&config)?;
    info!("Text generator initialized (backend: {})", generator.backend());

    let store = ArtifactStore::open(&config.upload_dir, &config.output_dir)
        .context("Failed to create upload/output directories")?;
    info!(
        "Artifact store ready (uploads: {}, outputs: {})",
        store.upload_dir().display(),
        store.output_dir().display()
    );

    if let Some(retention) = config.output_retention() {
        spawn_sweeper(store.clone(), retention);
    }

    let normalizer = Normalizer::new(generator, config.llm_timeout());
    let coordinator =
        BatchCoordinator::new(normalizer, store.clone(), config.max_concurrent_files);
    info!(
        "Batch coordinator ready ({} files in flight)",
        config.max_concurrent_files
    );

    let state = AppState {
        coordinator,
        store,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match config.llm_provider {
        LlmProvider::Anthropic => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is not set")?;
            info!("Using Anthropic (model: {})", llm_client::MODEL);
            Arc::new(LlmClient::new(api_key, config.llm_timeout())?)
        }
        LlmProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .context("GEMINI_API_KEY is not set")?;
            info!("Using Gemini (model: {})", config.gemini_model);
            Arc::new(GeminiClient::new(
                api_key,
                config.gemini_model.clone(),
                config.llm_timeout(),
            )?)
        }
    };
    Ok(generator)
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let Some(origin) = &config.cors_allowed_origin else {
        warn!("CORS_ALLOWED_ORIGIN not set; allowing any origin");
        return Ok(CorsLayer::permissive());
    };

    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("CORS_ALLOWED_ORIGIN is not a valid origin: {origin}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Periodically deletes outputs and partial writes older than `retention`.
fn spawn_sweeper(store: ArtifactStore, retention: Duration) {
    let period = (retention / 4).clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
    info!(
        "Output sweeper running every {}s (retention {}s)",
        period.as_secs(),
        retention.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.sweep(retention)).await {
                Ok(Ok(removed)) => debug!("Sweep removed {removed} files"),
                Ok(Err(e)) => warn!("Output sweep failed: {e}"),
                Err(e) => warn!("Output sweep task failed: {e}"),
            }
        }
    });
}
