use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atelier_core::Username;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// Timestamps travel as standard numeric `iat` / `exp` seconds so tokens stay
/// interoperable with any JWT library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the username the token was issued to.
    pub sub: Username,

    /// Single role granted at issuance.
    pub role: Role,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,
}

/// Deterministically validate JWT claims against the verifier's clock.
///
/// Validity depends on `expires_at` alone: a token is valid while
/// `now < expires_at`, with no leeway. Signature verification happens in the
/// codec before this is called.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
