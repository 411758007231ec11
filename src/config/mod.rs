//! Configuration system for Brewstand
//!
//! Loads configuration from a TOML file; every section has defaults so the
//! service can start from an empty file, except token verification, which
//! needs the signing authority's JWKS URI, audience and issuer.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use url::Url;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read configuration: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main Brewstand configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Load configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            server: raw.server.unwrap_or_default().into(),
            auth: raw.auth.unwrap_or_default().try_into()?,
            storage: raw.storage.unwrap_or_default().into(),
            logging: raw.logging.unwrap_or_default().into(),
        })
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("brewstand")
            .join("config.toml")
    }

    /// Get the default storage path
    pub fn default_storage_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("brewstand")
            .join("drinks.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Token verification configuration.
///
/// `jwks_uri`, `audience` and `issuer` identify the external signing
/// authority; serving fails without them.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Where the signing authority publishes its key set
    pub jwks_uri: Option<Url>,
    /// Expected `aud` claim
    pub audience: Option<String>,
    /// Expected `iss` claim
    pub issuer: Option<String>,
    /// Allowed clock skew in seconds when checking expiry
    pub leeway_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path of the drink store file
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Config::default_storage_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
