//! vr-api: HTTP API for voice-relay
//!
//! Exposes the speech proxies, the speech settings and the per-context
//! logs over HTTP. Built with axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, app, start_server};
