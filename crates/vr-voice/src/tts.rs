//! Text-to-speech proxy
//!
//! Sends text to an OpenAI-compatible `/v1/audio/speech` endpoint (Kokoro
//! FastAPI, OpenAI) and returns the audio exactly as the upstream produced
//! it, along with its content type.

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use vr_core::{ContextLogger, LogLevel, ProviderConfig};

use crate::error::{Feature, Result, VoiceError};

/// Content type assumed when the upstream does not send one
pub const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Upstream request body
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub voice: &'a str,
    pub speed: f32,
}

impl<'a> SpeechRequest<'a> {
    pub fn from_config(text: &'a str, config: &'a ProviderConfig) -> Self {
        Self {
            model: &config.tts_model,
            input: text,
            voice: &config.tts_voice,
            speed: config.tts_speed,
        }
    }
}

/// Synthesized audio
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Encoded audio, byte for byte as received
    pub audio_data: Vec<u8>,
    /// Upstream content type
    pub content_type: String,
}

/// Text-to-speech proxy
#[derive(Clone)]
pub struct TextToSpeechProxy {
    client: Client,
}

impl TextToSpeechProxy {
    /// Create a proxy with its own HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Create a proxy sharing an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Synthesize speech for `text` using this request's settings snapshot.
    ///
    /// Failures other than a disabled feature are logged to `logger` once.
    pub async fn synthesize(
        &self,
        text: &str,
        config: &ProviderConfig,
        logger: &dyn ContextLogger,
    ) -> Result<SynthesisResult> {
        if !config.tts_enabled {
            debug!("TTS request rejected: disabled in settings");
            return Err(VoiceError::Disabled(Feature::Tts));
        }

        let result = self.forward(text, config).await;
        if let Err(ref e) = result {
            report(e, logger);
        }
        result
    }

    async fn forward(&self, text: &str, config: &ProviderConfig) -> Result<SynthesisResult> {
        info!(
            "Synthesizing speech: {} chars, model: {}, voice: {}",
            text.len(),
            config.tts_model,
            config.tts_voice
        );

        let response = self
            .client
            .post(&config.tts_url)
            .json(&SpeechRequest::from_config(text, config))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await?;
            return Err(VoiceError::Upstream {
                feature: Feature::Tts,
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE)
            .to_string();

        let audio_data = response.bytes().await?;

        info!(
            "Synthesis complete: {} bytes, content-type: {}",
            audio_data.len(),
            content_type
        );

        Ok(SynthesisResult {
            audio_data: audio_data.to_vec(),
            content_type,
        })
    }
}

/// Error for a synthesis request whose body could not be read.
///
/// Answers as disabled when TTS is switched off; otherwise logs it as a
/// proxy failure.
pub fn reject_request(
    reason: impl Into<String>,
    config: &ProviderConfig,
    logger: &dyn ContextLogger,
) -> VoiceError {
    if !config.tts_enabled {
        return VoiceError::Disabled(Feature::Tts);
    }

    let err = VoiceError::InvalidRequest(reason.into());
    report(&err, logger);
    err
}

/// HTTP status and plain-text body for a failed synthesis
pub fn error_response(err: &VoiceError) -> (u16, String) {
    match err {
        VoiceError::Disabled(_) => (400, err.to_string()),
        VoiceError::Upstream { status, .. } => (*status, err.to_string()),
        other => (500, format!("TTS error: {}", other)),
    }
}

fn report(err: &VoiceError, logger: &dyn ContextLogger) {
    if !err.is_logged() {
        return;
    }

    match err {
        VoiceError::Upstream { status, body, .. } => {
            logger.log(LogLevel::Error, &format!("TTS API error: {} - {}", status, body));
        }
        other => {
            logger.log(LogLevel::Error, &format!("TTS proxy error: {}", other));
        }
    }
}
