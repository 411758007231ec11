//! Signing-key lookup against the identity provider's JWKS document

use jsonwebtoken::DecodingKey;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
// JWKS documents are small; anything beyond this is suspect.
const MAX_JWKS_BYTES: u64 = 512 * 1024;

#[derive(Error, Debug)]
pub enum JwksError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("JWKS response too large: {0} bytes")]
    ResponseTooLarge(u64),

    #[error("no key matching kid '{0}' in JWKS")]
    KeyNotFound(String),

    #[error("failed to build JWKS client: {0}")]
    Client(reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

/// Fetches and caches the signing authority's public keys, indexed by kid.
#[derive(Clone)]
pub struct JwksProvider {
    cache: Cache<String, Arc<DecodingKey>>,
    client: Client,
    jwks_uri: Url,
}

impl JwksProvider {
    pub fn new(jwks_uri: Url) -> Result<Self, JwksError> {
        Ok(Self {
            cache: Cache::builder()
                .max_capacity(100)
                .time_to_live(KEY_CACHE_TTL)
                .build(),
            client: Client::builder()
                .timeout(FETCH_TIMEOUT)
                .user_agent(concat!("brewstand/", env!("CARGO_PKG_VERSION")))
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(JwksError::Client)?,
            jwks_uri,
        })
    }

    /// Look up the decoding key for `kid`, refreshing the cached key set on
    /// a miss.
    pub async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, JwksError> {
        if let Some(key) = self.cache.get(kid) {
            return Ok(key);
        }

        self.refresh().await?;

        self.cache
            .get(kid)
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    async fn refresh(&self) -> Result<(), JwksError> {
        tracing::info!(uri = %self.jwks_uri, "refreshing JWKS");
        let resp = self.client.get(self.jwks_uri.clone()).send().await?;

        if let Some(len) = resp.content_length() {
            if len > MAX_JWKS_BYTES {
                return Err(JwksError::ResponseTooLarge(len));
            }
        }

        let jwks: JwksDocument = resp.json().await?;

        for key in jwks.keys {
            if key.kty != "RSA" {
                continue;
            }
            if let (Some(n), Some(e)) = (&key.n, &key.e) {
                if let Ok(decoding_key) = DecodingKey::from_rsa_components(n, e) {
                    self.cache.insert(key.kid.clone(), Arc::new(decoding_key));
                }
            }
        }

        Ok(())
    }
}
