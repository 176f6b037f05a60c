use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use atelier_auth::LoginError;
use atelier_maintenance::MaintenanceError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn login_error_to_response(err: LoginError) -> axum::response::Response {
    match err {
        LoginError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid credentials")
        }
        LoginError::Hashing(msg) => {
            tracing::error!(error = %msg, "password verification failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn maintenance_error_to_response(err: MaintenanceError) -> axum::response::Response {
    match err {
        MaintenanceError::Domain(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        MaintenanceError::Store(msg) => {
            tracing::error!(error = %msg, "maintenance toggle failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "failed to persist maintenance state",
            )
        }
    }
}
