//! Stand-ins for the business service behind the gate.
//!
//! Each handler acknowledges the call and names the caller, which is all the
//! access pipeline needs to be observable end to end.

use axum::{
    Json,
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::app::dto::ContactRequest;
use crate::app::errors;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/:id", get(get_project))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", get(get_task))
        .route("/api/users", get(list_users))
        .route("/api/analytics/dashboard", get(dashboard))
        .route("/api/contact", post(contact))
        .route("/api/public/projects/:id", get(public_project))
        .route("/api/public/projects/:id/qr", get(public_project_qr))
}

fn ack(resource: &str, principal: Option<&PrincipalContext>) -> Json<serde_json::Value> {
    let caller = principal.map(|p| json!({ "username": p.username(), "role": p.role() }));
    Json(json!({
        "resource": resource,
        "principal": caller,
    }))
}

pub async fn list_projects(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    ack("projects", Some(&principal))
}

pub async fn create_project(
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    (StatusCode::CREATED, ack("projects", Some(&principal)))
}

pub async fn get_project(
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    ack(&format!("projects/{id}"), Some(&principal))
}

pub async fn list_tasks(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    ack("tasks", Some(&principal))
}

pub async fn create_task(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    (StatusCode::CREATED, ack("tasks", Some(&principal)))
}

pub async fn get_task(
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    ack(&format!("tasks/{id}"), Some(&principal))
}

pub async fn list_users(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    ack("users", Some(&principal))
}

pub async fn dashboard(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    ack("analytics/dashboard", Some(&principal))
}

pub async fn contact(
    principal: Option<Extension<PrincipalContext>>,
    Json(body): Json<ContactRequest>,
) -> axum::response::Response {
    if body.name.trim().is_empty() || body.message.trim().is_empty() || !body.email.contains('@') {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "name, email and message are required",
        );
    }
    (
        StatusCode::ACCEPTED,
        ack("contact", principal.as_ref().map(|Extension(p)| p)),
    )
        .into_response()
}

pub async fn public_project(
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    ack(
        &format!("public/projects/{id}"),
        principal.as_ref().map(|Extension(p)| p),
    )
}

pub async fn public_project_qr(
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    ack(
        &format!("public/projects/{id}/qr"),
        principal.as_ref().map(|Extension(p)| p),
    )
}
