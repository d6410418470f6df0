//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `voice-relay.toml` config file
//! 3. Defaults
//!
//! `${VAR_NAME}` inside the config file is replaced with the environment
//! variable's value before parsing.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::settings::ProviderConfig;
use crate::{Error, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "voice-relay.toml";

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Main configuration for voice-relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// Initial speech settings
    pub speech: ProviderConfig,

    /// File the speech settings are persisted to when edited at runtime.
    /// When it already exists it takes precedence over `speech`.
    pub settings_path: Option<String>,
}

impl Config {
    /// Replace `${VAR_NAME}` with the variable's value (empty if unset)
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    if !name.is_empty() {
                        result.push_str(&std::env::var(name).unwrap_or_default());
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // Unterminated reference is kept verbatim
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);

        result
    }

    /// Parse configuration from TOML text, expanding `${VAR}` first
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a TOML config file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from defaults and the environment only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Load from `voice-relay.toml` if present, otherwise from the environment
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Environment variables win over the file
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VOICE_RELAY_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("VOICE_RELAY_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(path) = std::env::var("VOICE_RELAY_SETTINGS") {
            if !path.is_empty() {
                self.settings_path = Some(path);
            }
        }

        self.speech.apply_env_overrides();
    }
}
