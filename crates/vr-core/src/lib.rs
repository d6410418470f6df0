//! vr-core: Voice Relay Core Library
//!
//! Configuration loading, the speech settings every proxy request reads,
//! and the per-context log that upstream failures are reported to.

pub mod config;
pub mod context;
pub mod error;
pub mod settings;

pub use config::{Config, ServerConfig};
pub use context::{ContextHandle, ContextLog, ContextLogger, ContextRegistry, LogEntry, LogLevel};
pub use error::{Error, Result};
pub use settings::{ProviderConfig, SettingsProvider, SettingsStore, SpeechSettingsPatch, StaticSettings};
