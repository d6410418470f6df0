//! vr-voice: speech proxies for voice-relay
//!
//! Two stateless adapters over OpenAI-compatible audio APIs:
//!
//! - **Speech-to-text**: base64 audio in, upstream transcription JSON out
//! - **Text-to-speech**: text in, upstream audio bytes and content type out
//!
//! Each call makes exactly one upstream request. There are no retries and no
//! timeout beyond the HTTP client's own.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vr_core::{ContextRegistry, ProviderConfig};
//! use vr_voice::SpeechToTextProxy;
//!
//! let proxy = SpeechToTextProxy::new()?;
//! let contexts = ContextRegistry::new();
//! let log = contexts.resolve("chat-42");
//!
//! match proxy.transcribe(&audio_b64, &ProviderConfig::default(), log.as_ref()).await {
//!     Ok(json) => println!("{}", json["text"]),
//!     Err(e) => println!("{}", vr_voice::stt::error_body(&e)),
//! }
//! ```

pub mod error;
pub mod stt;
pub mod tts;

pub use error::{Feature, Result, VoiceError};
pub use stt::SpeechToTextProxy;
pub use tts::{SynthesisResult, TextToSpeechProxy};
