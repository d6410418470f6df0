//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use vr_core::{ContextRegistry, ServerConfig, SettingsProvider};
use vr_voice::{SpeechToTextProxy, TextToSpeechProxy};

use crate::error::{ApiError, Result};
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn SettingsProvider>,
    pub contexts: Arc<ContextRegistry>,
    pub stt: SpeechToTextProxy,
    pub tts: TextToSpeechProxy,
}

impl AppState {
    /// Build state with one HTTP client shared by both proxies
    pub fn new(settings: Arc<dyn SettingsProvider>, contexts: Arc<ContextRegistry>) -> Result<Self> {
        let client = reqwest_client()?;
        Ok(Self {
            settings,
            contexts,
            stt: SpeechToTextProxy::with_client(client.clone()),
            tts: TextToSpeechProxy::with_client(client),
        })
    }
}

fn reqwest_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| ApiError::Voice(e.into()))
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server and run until Ctrl-C
pub async fn start_server(server: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
