//! voice-relay: speech proxy server
//!
//! Usage:
//!   voice-relay                    - Start the HTTP server
//!   voice-relay --port 8080        - Override the listen port
//!   voice-relay --config <file>    - Load a specific config file
//!   voice-relay --help             - Show help

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vr_api::AppState;
use vr_core::{Config, ContextRegistry, SettingsProvider, SettingsStore};

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    help: bool,
    version: bool,
    port: Option<u16>,
    config_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    if args.help {
        print_help();
        return Ok(());
    }
    if args.version {
        println!("voice-relay {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load .env file before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match args.config_path {
        Some(ref path) => Config::from_toml_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting voice-relay...");

    let settings: Arc<dyn SettingsProvider> = match config.settings_path {
        Some(ref path) => Arc::new(
            SettingsStore::with_file(config.speech.clone(), path)
                .map_err(|e| anyhow::anyhow!("Failed to load speech settings: {}", e))?,
        ),
        None => Arc::new(SettingsStore::new(config.speech.clone())),
    };

    let speech = settings.provider_config();
    tracing::info!(
        "STT: {} ({}), TTS: {} ({})",
        if speech.stt_enabled { "enabled" } else { "disabled" },
        speech.stt_url,
        if speech.tts_enabled { "enabled" } else { "disabled" },
        speech.tts_url
    );

    let state = AppState::new(settings, Arc::new(ContextRegistry::new()))
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    vr_api::start_server(&config.server, state).await
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> anyhow::Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--version" | "-v" => parsed.version = true,
            "--port" | "-p" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--port requires a value"))?;
                parsed.port = Some(
                    value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid port: {}", value))?,
                );
            }
            "--config" | "-c" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                parsed.config_path = Some(PathBuf::from(value));
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(parsed)
}

/// Print help message
fn print_help() {
    println!("voice-relay - speech-to-text / text-to-speech proxy");
    println!();
    println!("Usage:");
    println!("  voice-relay                  Start the HTTP server");
    println!("  voice-relay --port <PORT>    Override the listen port");
    println!("  voice-relay --config <FILE>  Config file (default: ./voice-relay.toml)");
    println!("  voice-relay --help           Show this help message");
    println!("  voice-relay --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  VOICE_RELAY_HOST      Listen address (default: 0.0.0.0)");
    println!("  VOICE_RELAY_PORT      Listen port (default: 3000)");
    println!("  VOICE_RELAY_SETTINGS  File speech settings are persisted to");
    println!("  STT_ENABLED           Enable speech-to-text (default: true)");
    println!("  STT_MODEL             Transcription model");
    println!("  STT_LANGUAGE          Transcription language (default: en)");
    println!("  STT_URL               Transcription endpoint");
    println!("  TTS_ENABLED           Enable text-to-speech (default: true)");
    println!("  TTS_MODEL             Synthesis model (default: kokoro)");
    println!("  TTS_VOICE             Synthesis voice (default: bm_daniel)");
    println!("  TTS_SPEED             Speech speed (default: 1.0)");
    println!("  TTS_URL               Synthesis endpoint");
    println!("  RUST_LOG              Log filter (default: info)");
}
