use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Playback synchronization and channel-broadcast server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(
    name = "syncast-server",
    version,
    about = "Playback synchronization and channel-broadcast server"
)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "SYNCAST_PORT", default_value = "4000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "SYNCAST_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./syncast.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "SYNCAST_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Channel table: channel id -> audio URL (loaded from [channels]
    /// section in TOML; the built-in starter table applies when absent)
    #[arg(skip)]
    #[serde(default)]
    pub channels: Option<BTreeMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            bind_address: "0.0.0.0".to_string(),
            config: "./syncast.toml".to_string(),
            json_logs: false,
            generate_config: false,
            channels: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (SYNCAST_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("SYNCAST_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Syncast Server Configuration
# Place this file at ./syncast.toml or specify with --config <path>
# All settings can be overridden via environment variables (SYNCAST_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 4000)
# port = 4000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# ---- Audio Channels ----
# Channel id -> audio track URL. Declaring this section replaces the
# built-in starter table (english, hindi, tamil, kannada).
# [channels]
# english = "/audio/english.mp3"
# hindi = "/audio/hindi.mp3"
# tamil = "/audio/tamil.mp3"
# kannada = "/audio/kannada.mp3"
"#
    .to_string()
}
