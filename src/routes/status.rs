use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    constants::{version::get_version, STARTUP_TIME},
    error::Result,
    Data,
};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub rust: String,
    pub backend: String,
    pub uptime_secs: u64,
    pub quotes: i64,
    pub authors: i64,
}

/// get the service's status.
#[tracing::instrument(skip_all)]
pub async fn status(State(data): State<Data>) -> Result<Json<StatusResponse>> {
    let quotes = data.store.count_quotes().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when counting quotes"),
    )?;
    let authors = data.store.count_authors().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when counting authors"),
    )?;

    Ok(Json(StatusResponse {
        version: get_version(),
        rust: rustc_version_runtime::version().to_string(),
        backend: data.backend.to_string(),
        uptime_secs: STARTUP_TIME.elapsed().unwrap_or_default().as_secs(),
        quotes,
        authors,
    }))
}
