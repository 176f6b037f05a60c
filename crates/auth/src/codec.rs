//! Self-contained signed credentials (HS256 JWT).
//!
//! The server never stores issued tokens; verification is a signature check
//! plus an expiry comparison against the caller-supplied clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use atelier_core::Username;

use crate::{JwtClaims, Role, TokenValidationError, validate_claims};

/// Default credential lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token lifetime must be positive")]
    InvalidLifetime,

    #[error("failed to encode token: {0}")]
    Encoding(String),

    #[error("malformed token")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
        }
    }
}

/// A freshly issued credential and the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
}

/// Issue and verify credentials without session state.
///
/// `verify` reports *why* a token failed for logging; callers must not pass
/// the reason on to clients.
pub trait TokenCodec: Send + Sync {
    fn issue(
        &self,
        username: &Username,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError>;

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// HMAC-SHA256 codec keyed by a server-held secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidLifetime);
        }

        // Expiry is checked against our own clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn with_default_ttl(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        Self::new(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(
        &self,
        username: &Username,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = JwtClaims {
            sub: username.clone(),
            role,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                _ => TokenError::Malformed,
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
