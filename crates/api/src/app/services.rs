//! Service wiring: codec, revocation store, maintenance switch, credential
//! directory and audit sink, each owned here and injected into the router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

use atelier_auth::{
    CredentialDirectory, Hs256TokenCodec, InMemoryCredentialDirectory, InMemoryRevocationStore,
    RevocationStore, TokenCodec,
};
use atelier_infra::audit::{AuditSink, TracingAuditSink};
use atelier_maintenance::{InMemoryMaintenanceRepository, MaintenanceRepository, MaintenanceState};

use crate::allowlist::AllowList;
use crate::config::AppConfig;
use crate::gate::RequestGate;

/// Everything a handler or middleware may need, shared behind one `Arc`.
pub struct AppServices {
    pub codec: Arc<dyn TokenCodec>,
    pub revocations: Arc<dyn RevocationStore>,
    pub maintenance: Arc<MaintenanceState>,
    pub credentials: Arc<dyn CredentialDirectory>,
    pub audit: Arc<dyn AuditSink>,
    pub maintenance_retry_after: Duration,
    pub revocation_sweep_interval: Duration,
    pub maintenance_refresh_interval: Duration,
}

impl AppServices {
    /// The gate over this instance's components and the default allow-list.
    pub fn request_gate(&self) -> RequestGate {
        RequestGate::new(
            self.codec.clone(),
            self.revocations.clone(),
            self.maintenance.clone(),
            AllowList::default(),
        )
    }

    /// Periodically evict revocation entries whose tokens have expired anyway.
    pub fn spawn_revocation_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let revocations = self.revocations.clone();
        let period = self.revocation_sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged = revocations.purge_expired(Utc::now());
                if purged > 0 {
                    tracing::debug!(purged, remaining = revocations.len(), "revocation sweep");
                }
            }
        })
    }

    /// Periodically re-read the maintenance record so windows opened or
    /// ended by other instances sharing the repository take effect here.
    pub fn spawn_maintenance_refresher(&self) -> tokio::task::JoinHandle<()> {
        let maintenance = self.maintenance.clone();
        let period = self.maintenance_refresh_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately and the state was just loaded.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = maintenance.refresh().await {
                    tracing::warn!(error = %e, "maintenance refresh failed; keeping cached state");
                }
            }
        })
    }
}

/// Build services from configuration.
///
/// Maintenance records persist to Postgres when the `postgres` feature is
/// enabled and `DATABASE_URL` is set; otherwise they live in memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    build_services_with_audit(config, Arc::new(TracingAuditSink)).await
}

pub async fn build_services_with_audit(
    config: &AppConfig,
    audit: Arc<dyn AuditSink>,
) -> anyhow::Result<AppServices> {
    let codec = Hs256TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl)
        .context("invalid token codec configuration")?;

    let credentials = InMemoryCredentialDirectory::new();
    for seed in &config.seed_users {
        credentials
            .register(seed.username.clone(), &seed.password, seed.role)
            .with_context(|| format!("failed to seed user '{}'", seed.username))?;
    }
    if credentials.is_empty() {
        tracing::warn!("no users seeded; login will always fail");
    }

    let repository = maintenance_repository(config).await?;
    let maintenance = MaintenanceState::load(repository)
        .await
        .context("failed to load maintenance state")?;

    Ok(AppServices {
        codec: Arc::new(codec),
        revocations: Arc::new(InMemoryRevocationStore::new()),
        maintenance: Arc::new(maintenance),
        credentials: Arc::new(credentials),
        audit,
        maintenance_retry_after: config.maintenance_retry_after,
        revocation_sweep_interval: config.revocation_sweep_interval,
        maintenance_refresh_interval: config.maintenance_refresh_interval,
    })
}

#[cfg(feature = "postgres")]
async fn maintenance_repository(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn MaintenanceRepository>> {
    use atelier_infra::maintenance_store::PostgresMaintenanceRepository;

    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; maintenance records kept in memory");
        return Ok(Arc::new(InMemoryMaintenanceRepository::new()));
    };

    let pool = sqlx::PgPool::connect(url)
        .await
        .context("failed to connect to Postgres")?;
    let repository = PostgresMaintenanceRepository::new(pool);
    repository
        .ensure_schema()
        .await
        .context("failed to prepare maintenance schema")?;
    tracing::info!("maintenance records persisted in Postgres");
    Ok(Arc::new(repository))
}

#[cfg(not(feature = "postgres"))]
async fn maintenance_repository(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn MaintenanceRepository>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL set but built without the `postgres` feature; using memory");
    }
    Ok(Arc::new(InMemoryMaintenanceRepository::new()))
}
