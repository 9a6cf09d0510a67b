mod settings;

pub use settings::{EventMapping, EventRules, FieldMap, SalesforceSettings};

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors. All of them are raised before any network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub forwarding: ForwardingConfig,
    #[serde(default)]
    pub salesforce: SalesforceSettings,
}

/// Ingestion API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Forwarding behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardingConfig {
    /// How many times a call is replayed after the destination reports an
    /// expired session. Each replay fetches a fresh token first.
    #[serde(default = "default_max_session_retries")]
    pub max_session_retries: u32,
}

fn default_max_session_retries() -> u32 {
    1
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            max_session_retries: default_max_session_retries(),
        }
    }
}

impl RelayConfig {
    /// Build from `RELAY_CONFIG` (if set) and env var overrides, falling
    /// back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("RELAY_CONFIG") {
            Ok(path) => load_config(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Overrides individual settings from `RELAY_*` environment variables.
    ///
    /// Credentials are usually injected this way so they stay out of the
    /// config file.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("RELAY_API_HOST") {
            self.api.host = v;
        }
        if let Ok(v) = std::env::var("RELAY_API_PORT") {
            self.api.port = v
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("RELAY_API_PORT '{}'", v)))?;
        }
        if let Ok(v) = std::env::var("RELAY_MAX_SESSION_RETRIES") {
            self.forwarding.max_session_retries = v.parse().map_err(|_| {
                ConfigError::Invalid(format!("RELAY_MAX_SESSION_RETRIES '{}'", v))
            })?;
        }

        let salesforce = &mut self.salesforce;
        if let Ok(v) = std::env::var("RELAY_SALESFORCE_CLIENT_ID") {
            salesforce.client_id = v;
        }
        if let Ok(v) = std::env::var("RELAY_SALESFORCE_CLIENT_SECRET") {
            salesforce.client_secret = v;
        }
        if let Ok(v) = std::env::var("RELAY_SALESFORCE_USERNAME") {
            salesforce.username = v;
        }
        if let Ok(v) = std::env::var("RELAY_SALESFORCE_PASSWORD") {
            salesforce.password = v;
        }
        if let Ok(v) = std::env::var("RELAY_SALESFORCE_ENDPOINT") {
            salesforce.endpoint = Some(v);
        }

        Ok(())
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<RelayConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    let config: RelayConfig =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    tracing::debug!(path = %path, "Loaded relay config");
    Ok(config)
}
