use std::sync::Arc;

use crate::config::Config;
use crate::matching::gateway::AiGateway;
use crate::pipeline::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable generative backend. Production: `GeminiGateway`; tests swap
    /// in stubs.
    pub gateway: Arc<dyn AiGateway>,
    /// In-memory wizard sessions. Nothing outlives the process.
    pub sessions: SessionStore,
    pub config: Config,
}
