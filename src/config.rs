use anyhow::Context;
use axum::http::{HeaderValue, Uri};

use crate::store::StorageBackend;

const DEFAULT_DATABASE_URL: &str = "sqlite://quotes.db?mode=rwc";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<HeaderValue>,
    pub seed_quotes: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw
                .parse::<StorageBackend>()
                .map_err(anyhow::Error::msg)
                .context("invalid STORAGE_BACKEND")?,
            None => StorageBackend::Sqlite,
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(anyhow::Error::from)
                .and_then(|n| match n {
                    0 => Err(anyhow::anyhow!("pool needs at least one connection")),
                    n => Ok(n),
                })
                .context("invalid DATABASE_MAX_CONNECTIONS")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().context("invalid PORT")?,
            None => DEFAULT_PORT,
        };

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_origin)
                .collect::<anyhow::Result<Vec<_>>>()
                .context("invalid CORS_ORIGINS")?,
            None => Vec::new(),
        };

        let seed_quotes = lookup("SEED_QUOTES")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            backend,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            max_connections,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            cors_origins,
            seed_quotes,
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts `scheme://host[:port]`, the only shape a browser sends in `Origin`.
fn parse_origin(raw: &str) -> anyhow::Result<HeaderValue> {
    let uri: Uri = raw
        .parse()
        .with_context(|| format!("{raw:?} is not a valid origin"))?;

    let bare = uri.scheme().is_some()
        && uri.authority().is_some()
        && matches!(uri.path(), "" | "/")
        && uri.query().is_none();
    if !bare {
        anyhow::bail!("{raw:?} is not a valid origin, expected scheme://host[:port]");
    }

    Ok(HeaderValue::from_str(raw.trim_end_matches('/'))?)
}
