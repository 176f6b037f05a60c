use chrono::{DateTime, Utc};

use atelier_auth::{Principal, Role};
use atelier_core::Username;

/// Principal context for a request (authenticated identity + role).
///
/// Inserted by the gate at most once per request; handlers receive it as an
/// extractor argument instead of looking it up globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn username(&self) -> &Username {
        &self.principal.username
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }
}

/// The raw bearer credential that authenticated this request.
///
/// Kept alongside the principal so logout can revoke exactly what was
/// presented. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    raw: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(raw: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            raw: raw.into(),
            expires_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BearerToken")
            .field("raw", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
