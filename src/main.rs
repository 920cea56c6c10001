use std::sync::Arc;

use constants::STARTUP_TIME;
use store::{StorageBackend, Store};

mod config;
mod constants;
mod error;
mod init;
mod models;
mod routes;
mod store;
mod telemetry;

#[derive(Clone)]
pub(crate) struct Data {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) backend: StorageBackend,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = &*STARTUP_TIME;

    init::init().await
}
