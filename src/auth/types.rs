//! Authentication and authorization error and claim types

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication and authorization failures.
///
/// Each variant maps to a fixed HTTP status and a stable machine-readable
/// code; the display string is the message surfaced to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingHeader,

    #[error("malformed header")]
    MalformedHeader,

    #[error("Invalid header: unable to find the appropriate key")]
    UnknownKey,

    #[error("token is expired")]
    TokenExpired,

    #[error("incorrect claims, please check the audience and issuer")]
    IncorrectClaims,

    #[error("Unable to parse authentication token")]
    InvalidToken,

    #[error("permissions not included in JWT")]
    PermissionsMissing,

    #[error("Permission not found")]
    PermissionNotFound,
}

impl AuthError {
    /// HTTP status this failure resolves to.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::UnknownKey
            | AuthError::TokenExpired
            | AuthError::IncorrectClaims => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken | AuthError::PermissionsMissing => StatusCode::BAD_REQUEST,
            AuthError::PermissionNotFound => StatusCode::FORBIDDEN,
        }
    }

    /// Short machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MalformedHeader => "invalid_header",
            AuthError::UnknownKey => "invalid_key",
            AuthError::TokenExpired => "token_expired",
            AuthError::IncorrectClaims => "invalid_claims",
            AuthError::InvalidToken => "invalid_token",
            AuthError::PermissionsMissing => "invalid_claims",
            AuthError::PermissionNotFound => "unauthorized",
        }
    }
}

/// Decoded claim set of a verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience may be a single string or an array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    pub exp: usize,
    /// Capability strings granted to the bearer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Claims {
    /// The `permissions` claim, or an error when the token omits it.
    pub fn permissions(&self) -> Result<&[String], AuthError> {
        self.permissions
            .as_deref()
            .ok_or(AuthError::PermissionsMissing)
    }

    /// Check that `required` is a member of the permissions claim.
    pub fn require_permission(&self, required: &str) -> Result<(), AuthError> {
        if self.permissions()?.iter().any(|p| p == required) {
            Ok(())
        } else {
            Err(AuthError::PermissionNotFound)
        }
    }
}
