//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: owned components (codec, revocations, maintenance, audit)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services, build_services_with_audit};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every request passes the gate (maintenance, then authentication) and then
/// the authorization table before reaching a handler.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let gate_state = middleware::GateState {
        gate: Arc::new(services.request_gate()),
        retry_after: services.maintenance_retry_after,
    };

    routes::router()
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    gate_state,
                    middleware::gate_middleware,
                ))
                .layer(axum::middleware::from_fn(middleware::authorize_middleware))
                .layer(Extension(services)),
        )
}
