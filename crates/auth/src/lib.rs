//! `atelier-auth`: credential, revocation and authorization primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: callers pass
//! the clock (`now`) in explicitly and own every shared component.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod credentials;
pub mod principal;
pub mod revocation;
pub mod roles;

pub use authorize::{Access, AuthzError, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use codec::{DEFAULT_TOKEN_TTL_HOURS, Hs256TokenCodec, IssuedToken, TokenCodec, TokenError};
pub use credentials::{CredentialDirectory, InMemoryCredentialDirectory, LoginError, hash_password};
pub use principal::Principal;
pub use revocation::{InMemoryRevocationStore, RevocationStore};
pub use roles::{Role, UnknownRole};
