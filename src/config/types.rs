//! Raw configuration types for TOML parsing

use super::*;
use serde::Deserialize;

/// Raw configuration as parsed from TOML
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub server: Option<RawServerConfig>,
    pub auth: Option<RawAuthConfig>,
    pub storage: Option<RawStorageConfig>,
    pub logging: Option<RawLoggingConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawServerConfig {
    pub bind: Option<String>,
}

impl From<RawServerConfig> for ServerConfig {
    fn from(raw: RawServerConfig) -> Self {
        Self {
            bind: raw.bind.unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawAuthConfig {
    pub jwks_uri: Option<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub leeway_secs: Option<u64>,
}

impl TryFrom<RawAuthConfig> for AuthConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAuthConfig) -> Result<Self, Self::Error> {
        let jwks_uri = raw
            .jwks_uri
            .map(|s| {
                Url::parse(&s)
                    .map_err(|e| ConfigError::Invalid(format!("auth.jwks_uri: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            jwks_uri,
            audience: raw.audience,
            issuer: raw.issuer,
            leeway_secs: raw.leeway_secs.unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawStorageConfig {
    pub path: Option<String>,
}

impl From<RawStorageConfig> for StorageConfig {
    fn from(raw: RawStorageConfig) -> Self {
        let path = raw
            .path
            .map(|p| {
                // Expand ~ to home directory
                if let Some(rest) = p.strip_prefix("~/") {
                    dirs::home_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join(rest)
                } else {
                    PathBuf::from(p)
                }
            })
            .unwrap_or_else(Config::default_storage_path);

        Self { path }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLoggingConfig {
    pub level: Option<String>,
}

impl From<RawLoggingConfig> for LoggingConfig {
    fn from(raw: RawLoggingConfig) -> Self {
        Self {
            level: raw.level.unwrap_or_else(|| "info".to_string()),
        }
    }
}
