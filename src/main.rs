mod api;
mod config;
mod detector;
mod error;
mod gateway;
mod notifier;
mod poller;
mod roster;
mod store;
mod types;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::gateway::{MlbStatsClient, StatsGateway};
use crate::notifier::{LogNotifier, Notifier, WebhookNotifier};
use crate::poller::{PollSettings, Poller};
use crate::store::{JsonFileStore, MemoryStore, SqliteStore, TrackerStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Roster / marker store ---
    let store: Arc<dyn TrackerStore> = match cfg.store_backend {
        StoreBackend::Json => {
            info!("Using JSON store in {}", cfg.data_dir);
            Arc::new(JsonFileStore::new(&cfg.data_dir))
        }
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&cfg.db_path).await?),
        StoreBackend::Memory => {
            warn!("STORE_BACKEND=memory: roster and markers are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let roster = store.roster().await?;
    info!("Tracking {} player(s)", roster.len());

    // --- Collaborators ---
    let gateway: Arc<dyn StatsGateway> = Arc::new(MlbStatsClient::new(&cfg)?);

    let notifier: Arc<dyn Notifier> = match &cfg.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone(), cfg.http_timeout)?),
        None => {
            warn!("WEBHOOK_URL not set: notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    // --- Poller (background, every POLL_INTERVAL_SECS) ---
    let health = Arc::new(HealthState::new());
    let poller = Arc::new(Poller::new(
        Arc::clone(&gateway),
        notifier,
        Arc::clone(&store),
        Arc::clone(&health),
        PollSettings::from(&cfg),
    ));
    let poll_task = tokio::spawn(Arc::clone(&poller).run());

    // --- HTTP API server ---
    if cfg.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set: roster mutations are unauthenticated");
    }
    let app = router(ApiState {
        store,
        gateway,
        poller,
        health,
        admin_token: cfg.admin_token.clone(),
    });
    let bind_addr = format!("{}:{}", cfg.api_bind, cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poll_task.abort();
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
