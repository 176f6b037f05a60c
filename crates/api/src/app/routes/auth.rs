//! Login, logout and identity echo.

use std::sync::Arc;

use axum::{
    Json,
    Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use atelier_auth::LoginError;
use atelier_core::Username;
use atelier_infra::audit::{AuditAction, AuditEntry};

use crate::app::dto::{LoginRequest, LoginResponse, WhoAmIResponse};
use crate::app::{errors, services::AppServices};
use crate::context::{BearerToken, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

/// POST /api/auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    // A malformed username is reported exactly like a wrong password.
    let Ok(username) = Username::parse(&body.username) else {
        return errors::login_error_to_response(LoginError::InvalidCredentials);
    };

    // Argon2 verification is CPU-bound.
    let credentials = services.credentials.clone();
    let lookup = username.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        credentials.authenticate(&lookup, &body.password)
    })
    .await;

    let principal = match outcome {
        Ok(Ok(principal)) => principal,
        Ok(Err(e)) => {
            if e == LoginError::InvalidCredentials {
                tracing::info!(%username, "login rejected");
            }
            return errors::login_error_to_response(e);
        }
        Err(join) => {
            tracing::error!(error = %join, "login task failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            );
        }
    };

    let now = Utc::now();
    let issued = match services.codec.issue(&principal.username, principal.role, now) {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            );
        }
    };

    services
        .audit
        .record(AuditEntry::new(principal.username.clone(), AuditAction::Login, now));

    (
        StatusCode::OK,
        Json(LoginResponse {
            token: issued.token,
            username: principal.username,
            role: principal.role,
            expires_at: issued.claims.expires_at,
        }),
    )
        .into_response()
}

/// POST /api/auth/logout
///
/// Revokes exactly the credential presented with this request.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(token): Extension<BearerToken>,
) -> StatusCode {
    services.revocations.revoke_until(token.as_str(), token.expires_at());

    services.audit.record(AuditEntry::new(
        principal.username().clone(),
        AuditAction::Logout,
        Utc::now(),
    ));
    tracing::info!(username = %principal.username(), "credential revoked on logout");

    StatusCode::NO_CONTENT
}

/// GET /api/auth/me
pub async fn me(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(WhoAmIResponse {
        username: principal.username().clone(),
        role: principal.role(),
    })
}
