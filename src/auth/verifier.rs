//! Bearer token extraction and JWT verification

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

use super::jwks::JwksProvider;
use super::types::{AuthError, Claims};

/// Pull the token out of the `Authorization` header.
///
/// The header must be exactly two space-separated parts with a `Bearer`
/// scheme word; anything else is a malformed header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("bearer") || parts[1].is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(parts[1].to_string())
}

/// Verifies token signature, expiry and audience/issuer claims against the
/// signing authority, and enforces required permissions.
///
/// Keys are normally resolved by kid through a [`JwksProvider`]; tests use
/// a fixed RSA public key instead.
pub struct TokenVerifier {
    jwks: Option<JwksProvider>,
    static_key: Option<Arc<DecodingKey>>,
    audience: String,
    issuer: String,
    leeway: u64,
}

impl TokenVerifier {
    pub fn new(jwks: JwksProvider, audience: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            jwks: Some(jwks),
            static_key: None,
            audience: audience.into(),
            issuer: issuer.into(),
            leeway: 0,
        }
    }

    /// Build a verifier around a fixed RSA public key, bypassing JWKS
    /// resolution. Intended for tests.
    pub fn with_static_key(
        public_key_pem: &[u8],
        audience: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem).map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            jwks: None,
            static_key: Some(Arc::new(key)),
            audience: audience.into(),
            issuer: issuer.into(),
            leeway: 0,
        })
    }

    /// Allowed clock skew in seconds when checking expiry.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Verify a raw token and return its decoded claim set.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;

        // The signing authority only issues RS256 tokens.
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken);
        }

        let key = match (&self.static_key, &self.jwks) {
            (Some(key), _) => key.clone(),
            (None, Some(provider)) => {
                let kid = header.kid.as_deref().ok_or(AuthError::UnknownKey)?;
                provider
                    .get_key(kid)
                    .await
                    .map_err(|_| AuthError::UnknownKey)?
            }
            (None, None) => return Err(AuthError::UnknownKey),
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidAudience
            | jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::IncorrectClaims,
            _ => AuthError::InvalidToken,
        })?;

        Ok(data.claims)
    }

    /// Authorization guard: extract the bearer token, verify it and require
    /// `permission` to be granted. Returns the verified claims so handlers
    /// can inspect them further.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        permission: &str,
    ) -> Result<Claims, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = self.verify(&token).await?;
        claims.require_permission(permission)?;
        Ok(claims)
    }
}
