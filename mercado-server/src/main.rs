//! Mercado marketplace backend: order lifecycle and settlement API

mod api;
mod auth;
mod config;
mod db;
mod envia;
mod error;
mod invoice;
mod money;
mod shipping;
mod state;
mod stripe;

use std::time::Duration;

use config::Config;
use shared::util::now_millis;
use state::AppState;
use tracing_subscriber::EnvFilter;

/// Idempotency claims older than this are purged
const IDEMPOTENCY_TTL_MS: i64 = 24 * 60 * 60 * 1000;
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn spawn_idempotency_purge(pool: sqlx::PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff = now_millis() - IDEMPOTENCY_TTL_MS;
            match db::idempotency::purge_expired(&pool, cutoff).await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "purged expired idempotency keys"),
                Err(e) => tracing::warn!(error = %e, "idempotency purge failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mercado_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.http_port,
        environment = %config.environment,
        "starting mercado-server"
    );

    let state = AppState::new(&config).await?;
    spawn_idempotency_purge(state.pool.clone());

    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
