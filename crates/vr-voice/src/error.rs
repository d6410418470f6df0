//! Error types for vr-voice

use thiserror::Error;

/// Which proxy produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Stt,
    Tts,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stt => write!(f, "STT"),
            Self::Tts => write!(f, "TTS"),
        }
    }
}

/// vr-voice error type
#[derive(Error, Debug)]
pub enum VoiceError {
    /// Feature switched off in settings
    #[error("{0} is disabled")]
    Disabled(Feature),

    /// Upstream answered with a non-200 status
    #[error("{feature} API error: {status}")]
    Upstream {
        feature: Feature,
        status: u16,
        body: String,
    },

    #[error("Audio decoding error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Audio decoding error: no audio data")]
    EmptyAudio,

    #[error("Multipart encoding error: {0}")]
    Multipart(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream answered 200 with something other than `application/json`
    #[error("Unexpected content type: {0}")]
    ContentType(String),

    /// Inbound request body could not be read
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl VoiceError {
    /// Disabled features are a soft answer; everything else is reported
    /// to the request's context log.
    pub fn is_logged(&self) -> bool {
        !matches!(self, Self::Disabled(_))
    }

    /// Upstream status for `Upstream` errors
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VoiceError>;
