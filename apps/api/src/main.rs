mod config;
mod errors;
mod export;
mod llm_client;
mod matching;
mod models;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiClient, FLASH_MODEL, PRO_MODEL};
use crate::matching::gateway::{AiGateway, GeminiGateway};
use crate::pipeline::session::SessionStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LabMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and gateway
    let llm = GeminiClient::new(config.gemini_api_key.clone());
    info!("LLM client initialized (models: {FLASH_MODEL}, {PRO_MODEL})");

    let gateway: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(llm));

    // In-memory session store — wizard state lives for the session only
    let sessions = SessionStore::default();

    let state = AppState {
        gateway,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
