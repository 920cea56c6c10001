//! Storage for quotes and authors.
//!
//! Handlers only ever see an `Arc<dyn Store>`; which backend sits behind it is
//! picked once at startup from `STORAGE_BACKEND`.

use std::{fmt, str::FromStr};

use async_trait::async_trait;

use crate::models::{
    Author, AuthorChanges, NewAuthor, NewQuote, Quote, QuoteChanges, QuoteFilter, RandomStrategy,
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("author with name {0:?} already exists")]
    DuplicateAuthor(String),

    #[error("author with id {0} does not exist")]
    UnknownAuthor(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Sqlite => f.write_str("sqlite"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend {other:?}")),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_quotes(&self) -> StoreResult<Vec<Quote>>;
    async fn get_quote(&self, id: i64) -> StoreResult<Option<Quote>>;
    async fn filter_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>>;
    async fn count_quotes(&self) -> StoreResult<i64>;
    async fn random_quote(&self, strategy: RandomStrategy) -> StoreResult<Option<Quote>>;
    async fn create_quote(&self, quote: NewQuote) -> StoreResult<Quote>;
    /// Returns `None` when no quote has this id.
    async fn update_quote(&self, id: i64, changes: QuoteChanges) -> StoreResult<Option<Quote>>;
    /// Returns whether a quote was actually removed.
    async fn delete_quote(&self, id: i64) -> StoreResult<bool>;

    async fn list_authors(&self) -> StoreResult<Vec<Author>>;
    async fn get_author(&self, id: i64) -> StoreResult<Option<Author>>;
    async fn count_authors(&self) -> StoreResult<i64>;
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author>;
    async fn update_author(&self, id: i64, changes: AuthorChanges)
        -> StoreResult<Option<Author>>;
    /// Removes the author and every quote linked to it.
    async fn delete_author(&self, id: i64) -> StoreResult<bool>;
    /// Returns `None` when the author itself does not exist.
    async fn quotes_of(&self, author_id: i64) -> StoreResult<Option<Vec<Quote>>>;
}

/// Inserts the default quotes when the store holds none. Returns how many were added.
#[tracing::instrument(skip_all)]
pub async fn seed_defaults(store: &dyn Store) -> StoreResult<usize> {
    if store.count_quotes().await? > 0 {
        tracing::debug!("store already has quotes, skipping seed.");
        return Ok(0);
    }

    for (author, text, rating) in crate::constants::DEFAULT_QUOTES {
        store
            .create_quote(NewQuote {
                author: author.to_string(),
                text: text.to_string(),
                rating,
                author_id: None,
            })
            .await?;
    }

    tracing::info!(count = crate::constants::DEFAULT_QUOTES.len(), "seeded default quotes");
    Ok(crate::constants::DEFAULT_QUOTES.len())
}
