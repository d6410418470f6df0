//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{
    clear_context_logs, context_logs, get_speech_settings, health, synthesize,
    synthesize_preflight, transcribe, update_speech_settings,
};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Speech proxies
        .route("/transcribe", post(transcribe))
        .route("/tts", post(synthesize).options(synthesize_preflight))
        // Speech settings
        .route(
            "/settings/speech",
            get(get_speech_settings).post(update_speech_settings),
        )
        // Context logs
        .route(
            "/contexts/{ctxid}/logs",
            get(context_logs).delete(clear_context_logs),
        )
}
