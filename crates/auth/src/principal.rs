use serde::Serialize;

use atelier_core::Username;

use crate::{JwtClaims, Role};

/// Authenticated identity attached to a single request.
///
/// Only ever derived from a verified, unexpired, non-revoked credential.
/// It is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: Username,
    pub role: Role,
}

impl Principal {
    pub fn new(username: Username, role: Role) -> Self {
        Self { username, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self {
            username: claims.sub,
            role: claims.role,
        }
    }
}
