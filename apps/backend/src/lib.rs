pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use forge_core::{Workflow, WorkflowState};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::media::MediaStore;

/// Shared application state
///
/// One in-progress card per server. Every transition holds the session lock
/// for its whole duration, so collaborator calls for a card never overlap.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub session: Arc<Mutex<WorkflowState>>,
    pub config: Arc<Config>,
    /// Where generated audio and images live until the card is exported.
    pub media: MediaStore,
}

impl AppState {
    pub fn new(workflow: Workflow, config: Config) -> Self {
        let session = workflow.start();
        Self {
            workflow: Arc::new(workflow),
            session: Arc::new(Mutex::new(session)),
            media: MediaStore::new(config.media.dir.clone()),
            config: Arc::new(config),
        }
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Session routes
        .route("/api/options", get(routes::session::options))
        .route("/api/session", get(routes::session::get))
        .route("/api/session/reset", post(routes::session::reset))
        // Word routes
        .route("/api/word", post(routes::word::submit))
        .route("/api/word/type", put(routes::word::edit_type))
        .route("/api/word/check", post(routes::word::check))
        // Metadata routes
        .route("/api/metadata/plural", post(routes::metadata::plural))
        .route("/api/metadata/conjugations", post(routes::metadata::conjugations))
        // Content routes
        .route("/api/definition", post(routes::content::definition))
        .route("/api/sentence", post(routes::content::sentence))
        .route("/api/image", post(routes::content::image))
        .route("/api/image/skip", post(routes::content::skip_image))
        .route("/api/card", get(routes::content::card))
        // Export routes
        .route("/api/decks", get(routes::export::decks))
        .route("/api/export/status", get(routes::export::status))
        .route("/api/export", post(routes::export::export))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, fact checks will fail until it is");
    }
    tracing::info!(media_dir = %config.media.dir.display(), "Media directory");

    let workflow = Workflow::new(services::collaborators(&config));
    let addr = config.addr();
    let app = build_router(AppState::new(workflow, config));

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
