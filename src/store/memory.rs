use std::collections::BTreeMap;

use async_trait::async_trait;
use rand::seq::IteratorRandom;
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Author, AuthorChanges, NewAuthor, NewQuote, Quote, QuoteChanges, QuoteFilter, RandomStrategy,
};

#[derive(Debug, Default)]
struct Inner {
    quotes: BTreeMap<i64, Quote>,
    authors: BTreeMap<i64, Author>,
    // last id handed out; ids are never reused after a delete
    last_quote_id: i64,
    last_author_id: i64,
}

impl Inner {
    /// Display name a quote linked to `author_id` must carry, if it is linked at all.
    fn linked_name(&self, author_id: Option<i64>) -> StoreResult<Option<String>> {
        match author_id {
            Some(id) => self
                .authors
                .get(&id)
                .map(|a| Some(a.display_name()))
                .ok_or(StoreError::UnknownAuthor(id)),
            None => Ok(None),
        }
    }

    fn ensure_unique_name(&self, name: &str, except: Option<i64>) -> StoreResult<()> {
        let taken = self
            .authors
            .values()
            .any(|a| a.name == name && Some(a.id) != except);

        if taken {
            return Err(StoreError::DuplicateAuthor(name.to_string()));
        }
        Ok(())
    }
}

/// Process-local store. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_quotes(&self) -> StoreResult<Vec<Quote>> {
        Ok(self.inner.read().await.quotes.values().cloned().collect())
    }

    async fn get_quote(&self, id: i64) -> StoreResult<Option<Quote>> {
        Ok(self.inner.read().await.quotes.get(&id).cloned())
    }

    async fn filter_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>> {
        Ok(self
            .inner
            .read()
            .await
            .quotes
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    async fn count_quotes(&self) -> StoreResult<i64> {
        Ok(self.inner.read().await.quotes.len() as i64)
    }

    async fn random_quote(&self, strategy: RandomStrategy) -> StoreResult<Option<Quote>> {
        let inner = self.inner.read().await;
        let mut rng = rand::thread_rng();

        let quote = match strategy {
            RandomStrategy::PickId => inner
                .quotes
                .keys()
                .choose(&mut rng)
                .and_then(|id| inner.quotes.get(id)),
            RandomStrategy::Sample => inner.quotes.values().choose(&mut rng),
        };

        Ok(quote.cloned())
    }

    async fn create_quote(&self, quote: NewQuote) -> StoreResult<Quote> {
        let mut inner = self.inner.write().await;
        let linked_name = inner.linked_name(quote.author_id)?;

        inner.last_quote_id += 1;
        let quote = Quote {
            id: inner.last_quote_id,
            author: linked_name.unwrap_or(quote.author),
            text: quote.text,
            rating: quote.rating,
            author_id: quote.author_id,
        };
        inner.quotes.insert(quote.id, quote.clone());

        Ok(quote)
    }

    async fn update_quote(&self, id: i64, changes: QuoteChanges) -> StoreResult<Option<Quote>> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.quotes.get(&id) else {
            return Ok(None);
        };
        let linked_name = inner.linked_name(changes.author_id.or(current.author_id))?;

        let Some(quote) = inner.quotes.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(quote);
        if let Some(name) = linked_name {
            quote.author = name;
        }

        Ok(Some(quote.clone()))
    }

    async fn delete_quote(&self, id: i64) -> StoreResult<bool> {
        Ok(self.inner.write().await.quotes.remove(&id).is_some())
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        Ok(self.inner.read().await.authors.values().cloned().collect())
    }

    async fn get_author(&self, id: i64) -> StoreResult<Option<Author>> {
        Ok(self.inner.read().await.authors.get(&id).cloned())
    }

    async fn count_authors(&self) -> StoreResult<i64> {
        Ok(self.inner.read().await.authors.len() as i64)
    }

    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        let mut inner = self.inner.write().await;
        inner.ensure_unique_name(&author.name, None)?;

        inner.last_author_id += 1;
        let author = Author {
            id: inner.last_author_id,
            name: author.name,
            surname: author.surname,
        };
        inner.authors.insert(author.id, author.clone());

        Ok(author)
    }

    async fn update_author(
        &self,
        id: i64,
        changes: AuthorChanges,
    ) -> StoreResult<Option<Author>> {
        let mut inner = self.inner.write().await;
        if !inner.authors.contains_key(&id) {
            return Ok(None);
        }
        if let Some(name) = &changes.name {
            inner.ensure_unique_name(name, Some(id))?;
        }

        let Some(author) = inner.authors.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(author);
        let author = author.clone();

        let display_name = author.display_name();
        for quote in inner.quotes.values_mut() {
            if quote.author_id == Some(id) {
                quote.author = display_name.clone();
            }
        }

        Ok(Some(author))
    }

    async fn delete_author(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.authors.remove(&id).is_none() {
            return Ok(false);
        }

        inner.quotes.retain(|_, q| q.author_id != Some(id));
        Ok(true)
    }

    async fn quotes_of(&self, author_id: i64) -> StoreResult<Option<Vec<Quote>>> {
        let inner = self.inner.read().await;
        if !inner.authors.contains_key(&author_id) {
            return Ok(None);
        }

        Ok(Some(
            inner
                .quotes
                .values()
                .filter(|q| q.author_id == Some(author_id))
                .cloned()
                .collect(),
        ))
    }
}
