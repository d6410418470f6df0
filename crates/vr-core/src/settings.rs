//! Speech settings
//!
//! `ProviderConfig` carries everything the STT and TTS proxies need for a
//! single request. It is never cached by the proxies: each request asks the
//! `SettingsProvider` for a fresh snapshot, so edits made through the
//! settings endpoint apply to the very next call.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

const MIN_TTS_SPEED: f32 = 0.25;
const MAX_TTS_SPEED: f32 = 4.0;

/// Upstream parameters and feature flags for both proxies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Whether speech-to-text requests are forwarded
    pub stt_enabled: bool,
    /// Transcription model name sent upstream
    pub stt_model: String,
    /// Language hint (ISO 639-1)
    pub stt_language: String,
    /// OpenAI-compatible transcription endpoint
    pub stt_url: String,
    /// Microphone RMS level treated as silence (browser side)
    pub stt_silence_threshold: f32,
    /// Silence length in milliseconds that ends an utterance (browser side)
    pub stt_silence_duration: u64,
    /// Milliseconds to wait for speech before giving up (browser side)
    pub stt_waiting_timeout: u64,

    /// Whether text-to-speech requests are forwarded
    pub tts_enabled: bool,
    /// Synthesis model name sent upstream
    pub tts_model: String,
    /// Voice identifier sent upstream
    pub tts_voice: String,
    /// Playback speed factor
    pub tts_speed: f32,
    /// OpenAI-compatible speech endpoint
    pub tts_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            stt_enabled: true,
            stt_model: "Systran/faster-whisper-medium".to_string(),
            stt_language: "en".to_string(),
            stt_url: "http://192.168.50.59:7000/v1/audio/transcriptions".to_string(),
            stt_silence_threshold: 0.05,
            stt_silence_duration: 1000,
            stt_waiting_timeout: 2000,
            tts_enabled: true,
            tts_model: "kokoro".to_string(),
            tts_voice: "bm_daniel".to_string(),
            tts_speed: 1.0,
            tts_url: "http://192.168.50.59:8880/v1/audio/speech".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Override fields from `STT_*` / `TTS_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(env_string);
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let flag = |key: &str| var(key).map(|v| parse_bool(&v));

        if let Some(v) = flag("STT_ENABLED") {
            self.stt_enabled = v;
        }
        if let Some(v) = var("STT_MODEL") {
            self.stt_model = v;
        }
        if let Some(v) = var("STT_LANGUAGE") {
            self.stt_language = v;
        }
        if let Some(v) = var("STT_URL") {
            self.stt_url = v;
        }
        if let Some(v) = flag("TTS_ENABLED") {
            self.tts_enabled = v;
        }
        if let Some(v) = var("TTS_MODEL") {
            self.tts_model = v;
        }
        if let Some(v) = var("TTS_VOICE") {
            self.tts_voice = v;
        }
        if let Some(v) = var("TTS_SPEED").and_then(|s| s.parse::<f32>().ok()) {
            self.tts_speed = v.clamp(MIN_TTS_SPEED, MAX_TTS_SPEED);
        }
        if let Some(v) = var("TTS_URL") {
            self.tts_url = v;
        }
    }

    /// Merge a partial update into this config
    pub fn apply_patch(&mut self, patch: SpeechSettingsPatch) -> Result<()> {
        if let Some(url) = patch.stt_url.as_deref() {
            validate_url("stt_url", url)?;
        }
        if let Some(url) = patch.tts_url.as_deref() {
            validate_url("tts_url", url)?;
        }
        if patch.tts_speed.is_some_and(|speed| !speed.is_finite()) {
            return Err(Error::InvalidSetting {
                key: "tts_speed",
                reason: "must be a finite number".to_string(),
            });
        }

        if let Some(v) = patch.stt_enabled {
            self.stt_enabled = v;
        }
        if let Some(v) = patch.stt_model {
            self.stt_model = v;
        }
        if let Some(v) = patch.stt_language {
            self.stt_language = v;
        }
        if let Some(v) = patch.stt_url {
            self.stt_url = v;
        }
        if let Some(v) = patch.stt_silence_threshold {
            self.stt_silence_threshold = v;
        }
        if let Some(v) = patch.stt_silence_duration {
            self.stt_silence_duration = v;
        }
        if let Some(v) = patch.stt_waiting_timeout {
            self.stt_waiting_timeout = v;
        }
        if let Some(v) = patch.tts_enabled {
            self.tts_enabled = v;
        }
        if let Some(v) = patch.tts_model {
            self.tts_model = v;
        }
        if let Some(v) = patch.tts_voice {
            self.tts_voice = v;
        }
        if let Some(v) = patch.tts_speed {
            self.tts_speed = v.clamp(MIN_TTS_SPEED, MAX_TTS_SPEED);
        }
        if let Some(v) = patch.tts_url {
            self.tts_url = v;
        }

        Ok(())
    }

    /// Load speech settings from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Write speech settings to a TOML file, creating parent directories
    pub fn save_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Partial settings update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechSettingsPatch {
    pub stt_enabled: Option<bool>,
    pub stt_model: Option<String>,
    pub stt_language: Option<String>,
    pub stt_url: Option<String>,
    pub stt_silence_threshold: Option<f32>,
    pub stt_silence_duration: Option<u64>,
    pub stt_waiting_timeout: Option<u64>,
    pub tts_enabled: Option<bool>,
    pub tts_model: Option<String>,
    pub tts_voice: Option<String>,
    pub tts_speed: Option<f32>,
    pub tts_url: Option<String>,
}

impl SpeechSettingsPatch {
    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.stt_enabled.is_none()
            && self.stt_model.is_none()
            && self.stt_language.is_none()
            && self.stt_url.is_none()
            && self.stt_silence_threshold.is_none()
            && self.stt_silence_duration.is_none()
            && self.stt_waiting_timeout.is_none()
            && self.tts_enabled.is_none()
            && self.tts_model.is_none()
            && self.tts_voice.is_none()
            && self.tts_speed.is_none()
            && self.tts_url.is_none()
    }
}

/// Source of speech settings, queried once per proxied request
pub trait SettingsProvider: Send + Sync {
    /// Current settings snapshot
    fn provider_config(&self) -> ProviderConfig;

    /// Apply a partial update and return the resulting settings
    fn update(&self, _patch: SpeechSettingsPatch) -> Result<ProviderConfig> {
        Err(Error::ReadOnlySettings)
    }
}

/// Fixed settings that never change
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub ProviderConfig);

impl SettingsProvider for StaticSettings {
    fn provider_config(&self) -> ProviderConfig {
        self.0.clone()
    }
}

/// Mutable settings, optionally persisted to a TOML file on every update.
///
/// Readers only ever wait for a snapshot swap; file writes happen under a
/// separate lock that serializes updates.
pub struct SettingsStore {
    current: RwLock<ProviderConfig>,
    updates: Mutex<()>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// In-memory store seeded with `initial`
    pub fn new(initial: ProviderConfig) -> Self {
        Self {
            current: RwLock::new(initial),
            updates: Mutex::new(()),
            path: None,
        }
    }

    /// Store backed by `path`.
    ///
    /// If the file exists its contents replace `initial`, after which the
    /// `STT_*` / `TTS_*` environment overrides are applied again. Otherwise
    /// the file is created on the first update.
    pub fn with_file(initial: ProviderConfig, path: impl Into<PathBuf>) -> Result<Self> {
        Self::load(initial, path.into(), env_string)
    }

    fn load(
        initial: ProviderConfig,
        path: PathBuf,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let current = if path.exists() {
            info!("Loading speech settings from {}", path.display());
            let mut stored = ProviderConfig::from_toml_file(&path)?;
            stored.apply_overrides(var);
            stored
        } else {
            initial
        };

        Ok(Self {
            current: RwLock::new(current),
            updates: Mutex::new(()),
            path: Some(path),
        })
    }

    /// Persistence path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SettingsProvider for SettingsStore {
    fn provider_config(&self) -> ProviderConfig {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, patch: SpeechSettingsPatch) -> Result<ProviderConfig> {
        let _updating = self
            .updates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut next = self.provider_config();
        next.apply_patch(patch)?;

        if let Some(ref path) = self.path {
            next.save_toml_file(path)?;
            debug!("Speech settings saved to {}", path.display());
        }

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next.clone();
        Ok(next)
    }
}

fn validate_url(key: &'static str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::InvalidSetting {
            key,
            reason: format!("expected an http(s) URL, got {:?}", url),
        })
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> bool {
    !matches!(value.to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_defaults() {
        let config = ProviderConfig::default();
        assert!(config.stt_enabled);
        assert!(config.tts_enabled);
        assert_eq!(config.stt_model, "Systran/faster-whisper-medium");
        assert_eq!(config.stt_language, "en");
        assert_eq!(config.tts_model, "kokoro");
        assert_eq!(config.tts_voice, "bm_daniel");
        assert_eq!(config.tts_speed, 1.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProviderConfig = toml::from_str(
            r#"
tts_voice = "af_bella"
stt_enabled = false
"#,
        )
        .unwrap();

        assert_eq!(config.tts_voice, "af_bella");
        assert!(!config.stt_enabled);
        assert_eq!(config.tts_model, "kokoro");
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut config = ProviderConfig::default();
        config
            .apply_patch(SpeechSettingsPatch {
                tts_voice: Some("am_adam".to_string()),
                stt_enabled: Some(false),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.tts_voice, "am_adam");
        assert!(!config.stt_enabled);
        assert_eq!(config.stt_model, ProviderConfig::default().stt_model);
    }

    #[test]
    fn test_apply_patch_clamps_speed() {
        let mut config = ProviderConfig::default();
        config
            .apply_patch(SpeechSettingsPatch {
                tts_speed: Some(10.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.tts_speed, 4.0);
    }

    #[test]
    fn test_apply_patch_rejects_bad_url() {
        let mut config = ProviderConfig::default();
        let err = config
            .apply_patch(SpeechSettingsPatch {
                stt_url: Some("ftp://example.com".to_string()),
                tts_voice: Some("ignored".to_string()),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSetting { key: "stt_url", .. }));
        assert_eq!(config.tts_voice, "bm_daniel");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(SpeechSettingsPatch::default().is_empty());
        let patch: SpeechSettingsPatch = serde_json::from_str(r#"{"tts_speed": 1.5}"#).unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_static_settings_are_read_only() {
        let settings = StaticSettings::default();
        assert!(matches!(
            settings.update(SpeechSettingsPatch::default()),
            Err(Error::ReadOnlySettings)
        ));
    }

    #[test]
    fn test_store_update_is_visible_to_next_read() {
        let store = SettingsStore::new(ProviderConfig::default());
        store
            .update(SpeechSettingsPatch {
                tts_enabled: Some(false),
                ..Default::default()
            })
            .unwrap();

        assert!(!store.provider_config().tts_enabled);
    }

    #[test]
    fn test_store_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings").join("speech.toml");

        let store = SettingsStore::with_file(ProviderConfig::default(), &path).unwrap();
        store
            .update(SpeechSettingsPatch {
                stt_language: Some("ja".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(path.exists());

        let reloaded = SettingsStore::with_file(ProviderConfig::default(), &path).unwrap();
        assert_eq!(reloaded.provider_config().stt_language, "ja");
    }

    #[test]
    fn test_environment_wins_over_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.toml");
        std::fs::write(&path, "tts_voice = \"af_bella\"\nstt_language = \"de\"\n").unwrap();

        let env = |key: &str| match key {
            "TTS_VOICE" => Some("am_adam".to_string()),
            "STT_ENABLED" => Some("off".to_string()),
            _ => None,
        };
        let store = SettingsStore::load(ProviderConfig::default(), path, env).unwrap();
        let config = store.provider_config();

        assert_eq!(config.tts_voice, "am_adam");
        assert!(!config.stt_enabled);
        assert_eq!(config.stt_language, "de");
    }

    #[test]
    fn test_failed_save_keeps_previous_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.toml");
        let store = SettingsStore::with_file(ProviderConfig::default(), &path).unwrap();
        // a directory in place of the file makes the write fail
        std::fs::create_dir(&path).unwrap();

        let err = store
            .update(SpeechSettingsPatch {
                tts_voice: Some("af_sky".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(store.provider_config().tts_voice, "bm_daniel");
    }

    #[test]
    fn test_reads_proceed_during_concurrent_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(
            SettingsStore::with_file(ProviderConfig::default(), dir.path().join("speech.toml"))
                .unwrap(),
        );

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .update(SpeechSettingsPatch {
                            stt_silence_duration: Some(1000 + i),
                            ..Default::default()
                        })
                        .unwrap();
                })
            })
            .collect();
        for _ in 0..100 {
            assert_eq!(store.provider_config().tts_model, "kokoro");
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let saved = ProviderConfig::from_toml_file(store.path().unwrap()).unwrap();
        assert_eq!(saved, store.provider_config());
    }
}
