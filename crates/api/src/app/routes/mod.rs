use axum::{Router, routing::get};

pub mod auth;
pub mod business;
pub mod maintenance;
pub mod system;

/// Every route the service exposes, registered under full paths so the gate
/// and the authorization table see the same path the client sent. Access
/// control is applied by the middleware stack in `app::build_app`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(auth::router())
        .merge(maintenance::router())
        .merge(business::router())
}
