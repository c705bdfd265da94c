use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::RazorpayClient,
    app_state::AppState,
    auth,
    config::{Config, StorageBackend},
    store::{MemoryStore, PgStore, Store},
};

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads `.env` if present. A missing file is not an error.
pub fn init_env() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Failed to read .env: {}", e);
        }
    }
}

pub async fn connect_store(config: &Config) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Postgres => Arc::new(
            PgStore::connect(&config.database.url, config.database.max_connections).await?,
        ),
        StorageBackend::Memory => {
            info!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

pub fn build_state(config: &Config, store: Arc<dyn Store>) -> AppState {
    let http_client = Client::new();
    let provider = Arc::new(RazorpayClient::new(http_client.clone(), &config.razorpay));
    let sessions = auth::from_config(http_client, &config.session);
    AppState::new(store, provider, sessions, &config.razorpay, &config.orders)
}

/// Serves `app` until Ctrl-C.
pub async fn bootstrap(service_name: &str, app: Router, config: &Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("{} listening on {}", service_name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;
    Ok(())
}
