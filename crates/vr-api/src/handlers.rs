//! HTTP API handlers
//!
//! Request handlers for the speech proxies, speech settings and context logs.

use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use http::{HeaderName, HeaderValue, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use vr_core::{LogEntry, ProviderConfig, SpeechSettingsPatch};
use vr_voice::{stt, tts};

use crate::error::{ApiError, Result};
use crate::server::AppState;

/// CORS headers attached to synthesized audio and the `/tts` preflight
pub const TTS_CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "POST, OPTIONS"),
    ("access-control-allow-headers", "Content-Type"),
];

// ============================================================================
// Request types
// ============================================================================

/// Transcription request payload. Missing and `null` fields read as empty.
#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    /// Base64 encoded audio
    pub audio: Option<String>,
    /// Context the request belongs to
    pub ctxid: Option<String>,
}

/// Synthesis request payload. Missing and `null` fields read as empty.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    /// Text to speak
    pub text: Option<String>,
    /// Context the request belongs to
    pub ctxid: Option<String>,
}

type Payload<T> = std::result::Result<Json<T>, JsonRejection>;

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Speech-to-text. Always answers 200 with a JSON body; failures carry
/// `{"text": "", "error": ...}`, including bodies that are not valid JSON.
pub async fn transcribe(
    State(state): State<AppState>,
    payload: Payload<TranscribeRequest>,
) -> Json<Value> {
    let config = state.settings.provider_config();

    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!("Unreadable transcribe request: {}", rejection.body_text());
            let log = state.contexts.logger("");
            let err = stt::reject_request(rejection.body_text(), &config, &log);
            return Json(stt::error_body(&err));
        }
    };

    let audio = req.audio.unwrap_or_default();
    let ctxid = req.ctxid.unwrap_or_default();
    debug!("Transcribe request: ctxid={:?}, {} base64 chars", ctxid, audio.len());

    let log = state.contexts.logger(&ctxid);
    match state.stt.transcribe(&audio, &config, &log).await {
        Ok(result) => Json(result),
        Err(e) => Json(stt::error_body(&e)),
    }
}

/// Text-to-speech. Success returns the upstream audio bytes; failures are
/// plain text with a status mirroring the failure.
pub async fn synthesize(State(state): State<AppState>, payload: Payload<TtsRequest>) -> Response {
    let config = state.settings.provider_config();

    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!("Unreadable TTS request: {}", rejection.body_text());
            let log = state.contexts.logger("");
            let err = tts::reject_request(rejection.body_text(), &config, &log);
            return tts_error_response(&err);
        }
    };

    let text = req.text.unwrap_or_default();
    let ctxid = req.ctxid.unwrap_or_default();
    debug!("TTS request: ctxid={:?}, {} chars", ctxid, text.len());

    let log = state.contexts.logger(&ctxid);
    match state.tts.synthesize(&text, &config, &log).await {
        Ok(result) => audio_response(result),
        Err(e) => tts_error_response(&e),
    }
}

/// CORS preflight for `/tts`
pub async fn synthesize_preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, TTS_CORS_HEADERS)
}

/// Current speech settings
pub async fn get_speech_settings(State(state): State<AppState>) -> Json<ProviderConfig> {
    Json(state.settings.provider_config())
}

/// Apply a partial speech settings update
pub async fn update_speech_settings(
    State(state): State<AppState>,
    Json(patch): Json<SpeechSettingsPatch>,
) -> Result<Json<ProviderConfig>> {
    if patch.is_empty() {
        return Err(ApiError::InvalidRequest("no settings given".to_string()));
    }

    let settings = state.settings.clone();
    let updated = tokio::task::spawn_blocking(move || settings.update(patch)).await??;
    info!(
        "Speech settings updated: stt_enabled={}, tts_enabled={}",
        updated.stt_enabled, updated.tts_enabled
    );

    Ok(Json(updated))
}

/// Log entries recorded for a context
pub async fn context_logs(
    State(state): State<AppState>,
    Path(ctxid): Path<String>,
) -> Json<Vec<LogEntry>> {
    Json(state.contexts.entries(&ctxid))
}

/// Forget a context's log. Clearing an unknown context is a no-op.
pub async fn clear_context_logs(
    State(state): State<AppState>,
    Path(ctxid): Path<String>,
) -> StatusCode {
    if state.contexts.clear(&ctxid) {
        info!("Cleared context log: {}", ctxid);
    }
    StatusCode::NO_CONTENT
}

fn tts_error_response(err: &vr_voice::VoiceError) -> Response {
    let (status, body) = tts::error_response(err);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

fn audio_response(result: tts::SynthesisResult) -> Response {
    let content_type = HeaderValue::from_str(&result.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(tts::DEFAULT_AUDIO_CONTENT_TYPE));

    let mut response = Response::new(Body::from(result.audio_data));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    for (name, value) in TTS_CORS_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    response
}
