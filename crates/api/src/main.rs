use std::sync::Arc;

use anyhow::Context;

use atelier_api::app;
use atelier_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atelier_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(app::build_services(&config).await?);
    let _sweeper = services.spawn_revocation_sweeper();
    let _refresher = services.spawn_maintenance_refresher();

    let router = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
