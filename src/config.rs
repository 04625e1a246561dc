use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{RelayError, Result};

pub const DEFAULT_GENERATE_URL: &str = "http://127.0.0.1:11434/api/generate";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_LOG_LEVEL: &str = "testgen_relay=info,tower_http=info";

/// Main configuration structure loaded from testgen_relay.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub server: ServerConfig,
    /// File the settings were read from; `None` when defaults were used
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Remote text-generation service settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GENERATE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Inbound HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses RELAY_CONFIG or defaults to "testgen_relay.toml".
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "testgen_relay.toml".to_string());
        Self::load_from(&path)
    }

    /// Load from an explicit TOML path, then apply env overrides and validate
    pub fn load_from(config_path: &str) -> Result<Self> {
        // RELAY_ENV_FILE if set, otherwise ./.env
        if let Ok(env_path) = std::env::var("RELAY_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        // Logging is not initialized yet; main reports a missing file through `source`
        let mut config: Config = if let Ok(content) = std::fs::read_to_string(config_path) {
            let mut config = Self::from_toml(&content)?;
            config.source = Some(PathBuf::from(config_path));
            config
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment wins over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RELAY_GENERATE_URL") {
            self.generation.url = url;
            tracing::debug!("RELAY_GENERATE_URL env override applied");
        }
        if let Some(secs) = std::env::var("RELAY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.generation.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("RELAY_HTTP_BIND") {
            match v.parse::<SocketAddr>() {
                Ok(bind) => self.server.bind = bind,
                Err(_) => eprintln!("Ignoring unparseable RELAY_HTTP_BIND '{}'", v),
            }
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.server.log_level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.generation.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RelayError::Config {
                message: format!("generation url '{}' must start with http:// or https://", url),
            });
        }
        if self.generation.timeout_secs == 0 {
            return Err(RelayError::Config {
                message: "generation timeout_secs must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
