//! Per-request access gate.
//!
//! Evaluation order is fixed:
//! 1. maintenance check (admins and allow-listed paths pass),
//! 2. bearer extraction,
//! 3. revocation check (hard 401, before any signature work),
//! 4. signature/expiry verification (failure downgrades to anonymous).
//!
//! The gate is synchronous and transport-agnostic; `middleware.rs` adapts it
//! to axum.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use atelier_auth::{Principal, RevocationStore, TokenCodec};
use atelier_maintenance::{MaintenanceState, MaintenanceStatus};

use crate::allowlist::AllowList;
use crate::context::BearerToken;

/// A caller whose credential verified and is not revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedCaller {
    pub principal: Principal,
    pub token: BearerToken,
}

/// Result of steps 2–4 for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// No credential, or one that failed verification.
    Anonymous,
    /// A credential that was explicitly revoked.
    Revoked,
    Authenticated(AuthenticatedCaller),
}

impl Authentication {
    fn is_admin(&self) -> bool {
        matches!(self, Authentication::Authenticated(c) if c.principal.is_admin())
    }
}

/// Final decision for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Continue to authorization, with or without an identity.
    Admit(Option<AuthenticatedCaller>),
    /// Revoked credential.
    Unauthorized,
    /// Blocked by the maintenance window.
    Unavailable(MaintenanceStatus),
}

/// Extract the token from an `Authorization` header value.
///
/// Only the `Bearer <token>` form is recognised; anything else (including an
/// empty token) is treated as no credential at all.
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    let value = authorization?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

pub struct RequestGate {
    codec: Arc<dyn TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
    maintenance: Arc<MaintenanceState>,
    allow_list: AllowList,
}

impl RequestGate {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        revocations: Arc<dyn RevocationStore>,
        maintenance: Arc<MaintenanceState>,
        allow_list: AllowList,
    ) -> Self {
        Self {
            codec,
            revocations,
            maintenance,
            allow_list,
        }
    }

    /// Steps 2–4: extraction, revocation, verification.
    pub fn authenticate(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Authentication {
        let Some(token) = bearer_token(authorization) else {
            return Authentication::Anonymous;
        };

        if self.revocations.is_revoked(token) {
            return Authentication::Revoked;
        }

        match self.codec.verify(token, now) {
            Ok(claims) => {
                let token = BearerToken::new(token, claims.expires_at);
                Authentication::Authenticated(AuthenticatedCaller {
                    principal: Principal::from(claims),
                    token,
                })
            }
            Err(reason) => {
                tracing::debug!(%reason, "credential rejected; continuing as anonymous");
                Authentication::Anonymous
            }
        }
    }

    pub fn evaluate(
        &self,
        path: &str,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> GateDecision {
        // Step 1. Authentication runs early only to spot admins; its result
        // is reused below so the token is verified once.
        // The atomic flag is only a fast filter; the block decision and the
        // 503 body come from one status snapshot.
        let mut early = None;
        if self.maintenance.is_enabled() && !self.allow_list.permits(path) {
            let status = self.maintenance.status();
            if status.enabled {
                let auth = self.authenticate(authorization, now);
                if !auth.is_admin() {
                    tracing::warn!(path, "request blocked by maintenance window");
                    return GateDecision::Unavailable(status);
                }
                early = Some(auth);
            }
        }

        match early.unwrap_or_else(|| self.authenticate(authorization, now)) {
            Authentication::Revoked => {
                tracing::warn!(path, "revoked credential presented");
                GateDecision::Unauthorized
            }
            Authentication::Anonymous => GateDecision::Admit(None),
            Authentication::Authenticated(caller) => {
                tracing::debug!(
                    username = %caller.principal.username,
                    role = %caller.principal.role,
                    "request authenticated"
                );
                GateDecision::Admit(Some(caller))
            }
        }
    }
}
