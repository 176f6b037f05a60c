use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use atelier_auth::{AuthzError, authorize};
use atelier_maintenance::MaintenanceStatus;

use crate::app::errors;
use crate::authz;
use crate::context::{BearerToken, PrincipalContext};
use crate::gate::{GateDecision, RequestGate};

#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<RequestGate>,
    pub retry_after: Duration,
}

/// Maintenance gate + authentication filter.
///
/// Hard-stops revoked credentials (401) and maintenance-blocked callers
/// (503); otherwise attaches the principal, if any, and continues.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let decision = {
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        state.gate.evaluate(req.uri().path(), authorization, Utc::now())
    };

    match decision {
        GateDecision::Unavailable(status) => maintenance_response(status, state.retry_after),
        GateDecision::Unauthorized => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "invalid or revoked credential",
        ),
        GateDecision::Admit(caller) => {
            if let Some(caller) = caller {
                // Re-entrant filtering never replaces an established identity.
                if req.extensions().get::<PrincipalContext>().is_none() {
                    req.extensions_mut().insert(PrincipalContext::new(caller.principal));
                    req.extensions_mut().insert::<BearerToken>(caller.token);
                }
            }
            next.run(req).await
        }
    }
}

/// Per-route role check against the static authorization table.
pub async fn authorize_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let access = authz::required_access(req.method(), req.uri().path());
    let principal = req.extensions().get::<PrincipalContext>().map(|c| c.principal());

    match authorize(principal, &access) {
        Ok(()) => next.run(req).await,
        Err(AuthzError::Unauthenticated) => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "authentication required",
        ),
        Err(e @ AuthzError::Forbidden(_)) => {
            errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
        }
    }
}

fn maintenance_response(status: MaintenanceStatus, retry_after: Duration) -> Response {
    let secs = retry_after.as_secs();
    let mut res = (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "maintenance",
            "message": if status.message.is_empty() {
                "service is under maintenance".to_string()
            } else {
                status.message.clone()
            },
            "maintenance": status,
            "retryAfterSeconds": secs,
        })),
    )
        .into_response();
    res.headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    res
}
