//! Speech-to-text proxy
//!
//! Forwards base64 audio from the browser to an OpenAI-compatible
//! `/v1/audio/transcriptions` endpoint (faster-whisper-server, speaches,
//! OpenAI itself) and hands the upstream JSON back untouched.

use base64::Engine;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info};

use vr_core::{ContextLogger, LogLevel, ProviderConfig};

use crate::error::{Feature, Result, VoiceError};

/// File name attached to the uploaded audio part
pub const AUDIO_FILE_NAME: &str = "audio.wav";

/// MIME type attached to the uploaded audio part
pub const AUDIO_MIME_TYPE: &str = "audio/wav";

/// Only JSON bodies are accepted from a successful upstream
const JSON_MIME_TYPE: &str = "application/json";

/// Speech-to-text proxy
#[derive(Clone)]
pub struct SpeechToTextProxy {
    client: Client,
}

impl SpeechToTextProxy {
    /// Create a proxy with its own HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Create a proxy sharing an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Transcribe base64 encoded audio.
    ///
    /// `config` is the settings snapshot for this request. Every failure
    /// except a disabled feature is written to `logger` exactly once before
    /// being returned.
    pub async fn transcribe(
        &self,
        audio_base64: &str,
        config: &ProviderConfig,
        logger: &dyn ContextLogger,
    ) -> Result<Value> {
        if !config.stt_enabled {
            debug!("STT request rejected: disabled in settings");
            return Err(VoiceError::Disabled(Feature::Stt));
        }

        let result = self.forward(audio_base64, config).await;
        if let Err(ref e) = result {
            report(e, logger);
        }
        result
    }

    async fn forward(&self, audio_base64: &str, config: &ProviderConfig) -> Result<Value> {
        let audio = decode_audio(audio_base64)?;

        info!(
            "Transcribing audio: {} bytes, model: {}, language: {}",
            audio.len(),
            config.stt_model,
            config.stt_language
        );

        let file = Part::bytes(audio)
            .file_name(AUDIO_FILE_NAME)
            .mime_str(AUDIO_MIME_TYPE)
            .map_err(|e| VoiceError::Multipart(format!("Failed to set mime type: {}", e)))?;

        let form = Form::new()
            .part("file", file)
            .text("model", config.stt_model.clone())
            .text("language", config.stt_language.clone());

        let response = self.client.post(&config.stt_url).multipart(form).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await?;
            return Err(VoiceError::Upstream {
                feature: Feature::Stt,
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_json_content_type(&content_type) {
            return Err(VoiceError::ContentType(content_type));
        }

        let body = response.bytes().await?;
        let result: Value = serde_json::from_slice(&body)?;

        debug!("Transcription complete: {} bytes of JSON", body.len());

        Ok(result)
    }
}

/// Decode the audio payload.
///
/// Accepts a bare base64 string or a `data:<mime>;base64,` URL, ignoring
/// embedded whitespace.
pub fn decode_audio(audio_base64: &str) -> Result<Vec<u8>> {
    let payload = match audio_base64.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => audio_base64,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(VoiceError::EmptyAudio);
    }

    Ok(base64::engine::general_purpose::STANDARD.decode(cleaned)?)
}

/// Error for a transcription request whose body could not be read.
///
/// A disabled feature still answers as disabled and stays out of the log;
/// anything else is logged like a failed transcription.
pub fn reject_request(
    reason: impl Into<String>,
    config: &ProviderConfig,
    logger: &dyn ContextLogger,
) -> VoiceError {
    if !config.stt_enabled {
        return VoiceError::Disabled(Feature::Stt);
    }

    let err = VoiceError::InvalidRequest(reason.into());
    report(&err, logger);
    err
}

/// Caller-facing JSON body for a failed transcription
pub fn error_body(err: &VoiceError) -> Value {
    serde_json::json!({
        "text": "",
        "error": err.to_string(),
    })
}

fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(JSON_MIME_TYPE))
}

fn report(err: &VoiceError, logger: &dyn ContextLogger) {
    if !err.is_logged() {
        return;
    }

    match err {
        VoiceError::Upstream { status, body, .. } => {
            logger.log(LogLevel::Error, &format!("STT API error: {} - {}", status, body));
        }
        other => {
            logger.log(LogLevel::Error, &format!("STT transcription error: {}", other));
        }
    }
}
