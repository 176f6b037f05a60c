//! Maintenance window: public status plus admin toggle.

use std::sync::Arc;

use axum::{
    Json,
    Router,
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use atelier_infra::audit::{AuditAction, AuditEntry};
use atelier_maintenance::ToggleMaintenance;

use crate::app::dto::ToggleMaintenanceRequest;
use crate::app::{errors, services::AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/api/maintenance/status", get(status))
        .route("/api/maintenance/toggle", post(toggle))
        .route("/api/maintenance/disable", post(disable))
}

/// GET /api/maintenance/status
pub async fn status(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.maintenance.status())
}

/// POST /api/maintenance/toggle
pub async fn toggle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ToggleMaintenanceRequest>,
) -> axum::response::Response {
    apply(&services, &principal, body.enabled, body.message).await
}

/// POST /api/maintenance/disable
///
/// Allow-listed so an admin can always end a window, even one that blocks
/// the regular toggle route for everybody else.
pub async fn disable(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    apply(&services, &principal, false, String::new()).await
}

async fn apply(
    services: &AppServices,
    principal: &PrincipalContext,
    enabled: bool,
    message: String,
) -> axum::response::Response {
    let cmd = ToggleMaintenance {
        enabled,
        message,
        actor: principal.username().clone(),
        occurred_at: Utc::now(),
    };
    let occurred_at = cmd.occurred_at;

    match services.maintenance.toggle(cmd).await {
        Ok(status) => {
            let action = if status.enabled {
                AuditAction::MaintenanceEnabled
            } else {
                AuditAction::MaintenanceDisabled
            };
            let mut entry = AuditEntry::new(principal.username().clone(), action, occurred_at);
            if !status.message.is_empty() {
                entry = entry.with_detail(status.message.clone());
            }
            services.audit.record(entry);
            Json(status).into_response()
        }
        Err(e) => errors::maintenance_error_to_response(e),
    }
}
