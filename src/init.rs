use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::{
    config::Config,
    routes,
    store::{self, MemoryStore, SqliteStore, StorageBackend, Store},
    telemetry, Data,
};

async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.backend {
        StorageBackend::Sqlite => {
            tracing::info!("initializing database connection...");
            let store = SqliteStore::connect(&config.database_url, config.max_connections)
                .await
                .with_context(|| format!("failed to open database at {}", config.database_url))?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("using the in-memory store. quotes will be lost on restart.");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_quotes {
        store::seed_defaults(store.as_ref())
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when seeding quotes"))?;
    }

    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(err = ?e, "failed to listen for ctrl-c");
        return;
    }

    tracing::info!("received ctrl-c, shutting down...");
}

pub async fn init() -> anyhow::Result<()> {
    telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize telemetry")?;

    tracing::info!("initializing... please wait warmly.");

    let config = Config::from_env()?;
    let store = init_store(&config).await?;

    let data = Data {
        store,
        backend: config.backend,
    };

    let app = routes::router(data, &config.cors_origins);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %addr, backend = %config.backend, "finished initializing!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
