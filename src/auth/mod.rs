//! Token verification and permission-based authorization
//!
//! Incoming requests carry a bearer JWT issued by an external signing
//! authority. This module validates the token against the authority's
//! published key set and checks the permission strings embedded in it.

mod jwks;
mod types;
mod verifier;

pub use jwks::{JwksError, JwksProvider};
pub use types::{AuthError, Claims};
pub use verifier::{extract_bearer_token, TokenVerifier};

/// Permission required to read full drink representations.
pub const PERM_GET_DRINKS_DETAIL: &str = "get:drinks-detail";
/// Permission required to create drinks.
pub const PERM_POST_DRINKS: &str = "post:drinks";
/// Permission required to update drinks.
pub const PERM_PATCH_DRINKS: &str = "patch:drinks";
/// Permission required to delete drinks.
pub const PERM_DELETE_DRINKS: &str = "delete:drinks";
