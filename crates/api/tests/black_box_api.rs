use std::collections::HashMap;
use std::sync::Arc;

use atelier_api::app::{self, AppServices};
use atelier_api::config::AppConfig;
use atelier_api::context::PrincipalContext;
use atelier_auth::{Principal, Role};
use atelier_core::Username;
use atelier_infra::audit::{AuditAction, InMemoryAuditSink};
use atelier_maintenance::ToggleMaintenance;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    audit: Arc<InMemoryAuditSink>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(&[], |router| router).await
    }

    /// `seed` entries use the `user:password:ROLE` config format.
    async fn spawn_with(
        seed: &[&str],
        wrap: impl FnOnce(axum::Router) -> axum::Router,
    ) -> Self {
        let mut env = HashMap::new();
        env.insert("JWT_SECRET", SECRET.to_string());
        env.insert("ATELIER_MAINTENANCE_RETRY_AFTER_SECS", "120".to_string());
        if !seed.is_empty() {
            env.insert("ATELIER_SEED_USERS", seed.join(","));
        }
        let config = AppConfig::from_lookup(|key| env.get(key).cloned()).expect("config");

        let audit = Arc::new(InMemoryAuditSink::new());
        let services = Arc::new(
            app::build_services_with_audit(&config, audit.clone())
                .await
                .expect("services"),
        );

        // Same router as prod, bound to an ephemeral port.
        let router = wrap(app::build_app(services.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            services,
            audit,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn set_maintenance(&self, enabled: bool, message: &str) {
        self.services
            .maintenance
            .toggle(ToggleMaintenance {
                enabled,
                message: message.to_string(),
                actor: Username::parse("ops").unwrap(),
                occurred_at: Utc::now(),
            })
            .await
            .expect("toggle");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Mint a token without going through the service's own codec.
fn mint_jwt(username: &str, role: &str, lifetime: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": username,
        "role": role,
        "iat": now.timestamp(),
        "exp": (now + lifetime).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token(username: &str, role: &str) -> String {
    mint_jwt(username, role, ChronoDuration::minutes(10))
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/api/projects")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn externally_minted_token_establishes_identity() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(srv.url("/api/auth/me"))
        .bearer_auth(token("bob", "DEVELOPPEUR"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "bob");
    assert_eq!(body["role"], "DEVELOPPEUR");
}

#[tokio::test]
async fn head_requests_follow_get_access_rules() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/api/maintenance/status", "/api/public/projects/1"] {
        let res = client.head(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "HEAD {path}");
    }
    let res = client.head(srv.url("/api/projects")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_forbidden_not_unauthorized() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/api/users"))
        .bearer_auth(token("bob", "DEVELOPPEUR"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/api/tasks"))
        .bearer_auth(token("carol", "CLIENT"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/api/tasks"))
        .bearer_auth(token("bob", "DEVELOPPEUR"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn forged_or_expired_tokens_degrade_to_anonymous() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "mallory", "role": "ADMIN", "iat": 0, "exp": 4_000_000_000i64 }),
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();
    let expired = mint_jwt("alice", "ADMIN", ChronoDuration::minutes(-5));

    for bad in [forged.as_str(), expired.as_str(), "not-a-jwt"] {
        // Public routes still serve anonymous callers.
        let res = client
            .get(srv.url("/api/public/projects/7"))
            .bearer_auth(bad)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert!(body["principal"].is_null());

        // Protected ones see no identity at all.
        let res = client
            .get(srv.url("/api/projects"))
            .bearer_auth(bad)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn revoked_token_is_rejected_before_business_logic() {
    let srv = TestServer::spawn().await;
    let bob = token("bob", "DEVELOPPEUR");
    srv.services.revocations.revoke(&bob);

    let res = reqwest::Client::new()
        .get(srv.url("/api/tasks"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.get("resource").is_none());

    // Even public routes refuse a revoked credential.
    let res = reqwest::Client::new()
        .get(srv.url("/api/public/projects/1"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_logout_round_trip_revokes_the_token() {
    let srv = TestServer::spawn_with(&["alice:wonderland:ADMIN"], |r| r).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "username": "alice", "password": "wonderland" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "ADMIN");
    assert!(body["expiresAt"].is_string());
    let issued = body["token"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/users"))
        .bearer_auth(&issued)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/api/auth/logout"))
        .bearer_auth(&issued)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url("/api/users"))
        .bearer_auth(&issued)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let actions: Vec<_> = srv.audit.entries().into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Login, AuditAction::Logout]);
    assert!(srv
        .audit
        .entries()
        .iter()
        .all(|e| e.actor.as_str() == "alice"));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let srv = TestServer::spawn_with(&["alice:wonderland:ADMIN"], |r| r).await;
    let client = reqwest::Client::new();

    let mut bodies = Vec::new();
    for (user, pass) in [("alice", "wrong"), ("nobody", "wonderland"), ("has space", "x")] {
        let res = client
            .post(srv.url("/api/auth/login"))
            .json(&json!({ "username": user, "password": pass }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        bodies.push(res.json::<serde_json::Value>().await.unwrap());
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    assert!(srv.audit.entries().is_empty());
}

#[tokio::test]
async fn maintenance_admits_admin_and_blocks_anonymous() {
    let srv = TestServer::spawn().await;
    srv.set_maintenance(true, "database upgrade").await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/api/tasks"))
        .bearer_auth(token("alice", "ADMIN"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["principal"]["username"], "alice");

    let res = client.get(srv.url("/api/tasks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.headers().get("retry-after").unwrap().to_str().unwrap(),
        "120"
    );
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "maintenance");
    assert_eq!(body["message"], "database upgrade");
    assert_eq!(body["maintenance"]["enabled"], true);
    assert_eq!(body["retryAfterSeconds"], 120);
}

#[tokio::test]
async fn maintenance_blocks_non_admin_roles() {
    let srv = TestServer::spawn().await;
    srv.set_maintenance(true, "").await;

    let res = reqwest::Client::new()
        .get(srv.url("/api/tasks"))
        .bearer_auth(token("bob", "DEVELOPPEUR"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn maintenance_allow_list_keeps_login_and_status_reachable() {
    let srv = TestServer::spawn_with(&["bob:builder:DEVELOPPEUR"], |r| r).await;
    srv.set_maintenance(true, "back soon").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "username": "bob", "password": "builder" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(srv.url("/api/maintenance/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["enabled"], true);
    assert_eq!(body["message"], "back soon");
    assert!(body["startedAt"].is_string());

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/api/contact"))
        .json(&json!({ "name": "Dana", "email": "dana@example.com", "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = client.get(srv.url("/api/tasks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn admin_toggles_maintenance_through_the_api() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = token("alice", "ADMIN");

    let res = client
        .post(srv.url("/api/maintenance/toggle"))
        .bearer_auth(&alice)
        .json(&json!({ "enabled": true, "message": "patching" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["enabled"], true);
    assert_eq!(body["message"], "patching");
    assert!(srv.services.maintenance.is_enabled());

    let res = client
        .get(srv.url("/api/projects"))
        .bearer_auth(token("carol", "CLIENT"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = client
        .post(srv.url("/api/maintenance/disable"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["enabled"], false);
    assert!(!srv.services.maintenance.is_enabled());

    let actions: Vec<_> = srv.audit.entries().into_iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::MaintenanceEnabled, AuditAction::MaintenanceDisabled]
    );
}

#[tokio::test]
async fn non_admin_cannot_toggle_maintenance() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/maintenance/toggle"))
        .bearer_auth(token("bob", "DEVELOPPEUR"))
        .json(&json!({ "enabled": true, "message": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/maintenance/disable"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(!srv.services.maintenance.is_enabled());
}

#[tokio::test]
async fn invalid_maintenance_message_is_a_bad_request() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url("/api/maintenance/toggle"))
        .bearer_auth(token("alice", "ADMIN"))
        .json(&json!({ "enabled": true, "message": "x".repeat(1001) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(!srv.services.maintenance.is_enabled());
}

#[tokio::test]
async fn established_principal_is_never_replaced() {
    async fn preset(
        mut req: axum::http::Request<axum::body::Body>,
        next: axum::middleware::Next,
    ) -> axum::response::Response {
        req.extensions_mut().insert(PrincipalContext::new(Principal::new(
            Username::parse("carol").unwrap(),
            Role::Client,
        )));
        next.run(req).await
    }

    let srv = TestServer::spawn_with(&[], |router| {
        router.layer(axum::middleware::from_fn(preset))
    })
    .await;

    let res = reqwest::Client::new()
        .get(srv.url("/api/auth/me"))
        .bearer_auth(token("alice", "ADMIN"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "carol");
    assert_eq!(body["role"], "CLIENT");
}
