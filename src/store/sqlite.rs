use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Author, AuthorChanges, NewAuthor, NewQuote, Quote, QuoteChanges, QuoteFilter, RandomStrategy,
};

const QUOTE_COLUMNS: &str = "id, author, text, rating, author_id";

// must agree with `Author::display_name`
const AUTHOR_DISPLAY_NAME: &str =
    "CASE WHEN surname IS NULL OR surname = '' THEN name ELSE name || ' ' || surname END";

/// Store backed by a single SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens the pool and brings the schema up to date.
    pub async fn connect(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(db_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        // every connection to an in-memory url gets its own database, so keep exactly one alive
        let pool = if db_url.contains(":memory:") || db_url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(opts)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(opts)
                .await?
        };

        tracing::info!("running migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("finished running migrations!");

        Ok(Self { db: pool })
    }
}

fn map_author_write(err: sqlx::Error, name: Option<&str>) -> StoreError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateAuthor(name.unwrap_or_default().to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn map_quote_write(err: sqlx::Error, author_id: Option<i64>) -> StoreError {
    match (err.as_database_error(), author_id) {
        (Some(db_err), Some(id)) if db_err.is_foreign_key_violation() => {
            StoreError::UnknownAuthor(id)
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_quotes(&self) -> StoreResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY id;"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(quotes)
    }

    async fn get_quote(&self, id: i64) -> StoreResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1;"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(quote)
    }

    async fn filter_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(&format!(
            r#"
                SELECT {QUOTE_COLUMNS}
                FROM quotes
                WHERE ($1 IS NULL OR author = $1)
                  AND ($2 IS NULL OR rating = $2)
                ORDER BY id;
            "#
        ))
        .bind(filter.author.as_deref())
        .bind(filter.rating)
        .fetch_all(&self.db)
        .await?;

        Ok(quotes)
    }

    async fn count_quotes(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes;")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    async fn random_quote(&self, strategy: RandomStrategy) -> StoreResult<Option<Quote>> {
        match strategy {
            RandomStrategy::PickId => {
                let ids: Vec<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM quotes;")
                    .fetch_all(&self.db)
                    .await?;

                let picked = ids.choose(&mut rand::thread_rng()).copied();
                match picked {
                    Some(id) => self.get_quote(id).await,
                    None => Ok(None),
                }
            }
            RandomStrategy::Sample => {
                let quote = sqlx::query_as::<_, Quote>(&format!(
                    "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY RANDOM() LIMIT 1;"
                ))
                .fetch_optional(&self.db)
                .await?;

                Ok(quote)
            }
        }
    }

    async fn create_quote(&self, quote: NewQuote) -> StoreResult<Quote> {
        let created = sqlx::query_as::<_, Quote>(&format!(
            r#"
                INSERT INTO
                    quotes (author, text, rating, author_id)
                VALUES
                    (
                        COALESCE((SELECT {AUTHOR_DISPLAY_NAME} FROM authors WHERE id = $4), $1),
                        $2,
                        $3,
                        $4
                    )
                RETURNING {QUOTE_COLUMNS};
            "#
        ))
        .bind(quote.author.as_str())
        .bind(quote.text.as_str())
        .bind(quote.rating)
        .bind(quote.author_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_quote_write(e, quote.author_id))?;

        Ok(created)
    }

    async fn update_quote(&self, id: i64, changes: QuoteChanges) -> StoreResult<Option<Quote>> {
        let updated = sqlx::query_as::<_, Quote>(&format!(
            r#"
                UPDATE quotes
                SET
                    author = COALESCE(
                        (
                            SELECT {AUTHOR_DISPLAY_NAME}
                            FROM authors
                            WHERE id = COALESCE($4, quotes.author_id)
                        ),
                        $1,
                        author
                    ),
                    text = COALESCE($2, text),
                    rating = COALESCE($3, rating),
                    author_id = COALESCE($4, author_id)
                WHERE id = $5
                RETURNING {QUOTE_COLUMNS};
            "#
        ))
        .bind(changes.author.as_deref())
        .bind(changes.text.as_deref())
        .bind(changes.rating)
        .bind(changes.author_id)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_quote_write(e, changes.author_id))?;

        Ok(updated)
    }

    async fn delete_quote(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1;")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let authors =
            sqlx::query_as::<_, Author>("SELECT id, name, surname FROM authors ORDER BY id;")
                .fetch_all(&self.db)
                .await?;

        Ok(authors)
    }

    async fn get_author(&self, id: i64) -> StoreResult<Option<Author>> {
        let author =
            sqlx::query_as::<_, Author>("SELECT id, name, surname FROM authors WHERE id = $1;")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(author)
    }

    async fn count_authors(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM authors;")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
                INSERT INTO
                    authors (name, surname)
                VALUES
                    ($1, $2)
                RETURNING id, name, surname;
            "#,
        )
        .bind(author.name.as_str())
        .bind(author.surname.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_author_write(e, Some(author.name.as_str())))?;

        Ok(created)
    }

    async fn update_author(
        &self,
        id: i64,
        changes: AuthorChanges,
    ) -> StoreResult<Option<Author>> {
        // linked quotes carry the display name, so they change together with the author
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, Author>(
            r#"
                UPDATE authors
                SET
                    name = COALESCE($1, name),
                    surname = COALESCE($2, surname)
                WHERE id = $3
                RETURNING id, name, surname;
            "#,
        )
        .bind(changes.name.as_deref())
        .bind(changes.surname.as_deref())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_author_write(e, changes.name.as_deref()))?;

        if let Some(author) = &updated {
            sqlx::query("UPDATE quotes SET author = $1 WHERE author_id = $2;")
                .bind(author.display_name())
                .bind(author.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_author(&self, id: i64) -> StoreResult<bool> {
        // quotes go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM authors WHERE id = $1;")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn quotes_of(&self, author_id: i64) -> StoreResult<Option<Vec<Quote>>> {
        if self.get_author(author_id).await?.is_none() {
            return Ok(None);
        }

        let quotes = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE author_id = $1 ORDER BY id;"
        ))
        .bind(author_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(quotes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    fn new_quote(author: &str, rating: i64) -> NewQuote {
        NewQuote {
            author: author.to_string(),
            text: format!("something {author} said"),
            rating,
            author_id: None,
        }
    }

    #[tokio::test]
    async fn create_get_delete() {
        let store = store().await;
        let created = store.create_quote(new_quote("Rick Cook", 4)).await.unwrap();

        assert_eq!(store.get_quote(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(store.count_quotes().await.unwrap(), 1);

        assert!(store.delete_quote(created.id).await.unwrap());
        assert!(!store.delete_quote(created.id).await.unwrap());
        assert!(store.get_quote(created.id).await.unwrap().is_none());
        assert_eq!(store.count_quotes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn autoincrement_never_reuses_ids() {
        let store = store().await;
        let first = store.create_quote(new_quote("a", 1)).await.unwrap();
        assert!(store.delete_quote(first.id).await.unwrap());

        let second = store.create_quote(new_quote("b", 1)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn filter_and_count_agree_with_listing() {
        let store = store().await;
        for (author, rating) in [("A", 1), ("B", 5), ("A", 5)] {
            store.create_quote(new_quote(author, rating)).await.unwrap();
        }

        let all = store.list_quotes().await.unwrap();
        assert_eq!(all.len() as i64, store.count_quotes().await.unwrap());

        let by_a = store
            .filter_quotes(&QuoteFilter {
                author: Some("A".into()),
                rating: None,
            })
            .await
            .unwrap();
        let expected: Vec<_> = all.iter().filter(|q| q.author == "A").cloned().collect();
        assert_eq!(by_a, expected);

        let by_rating = store
            .filter_quotes(&QuoteFilter {
                author: None,
                rating: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(by_rating.len(), 2);

        let unfiltered = store.filter_quotes(&QuoteFilter::default()).await.unwrap();
        assert_eq!(unfiltered, all);
    }

    #[tokio::test]
    async fn random_strategies() {
        let store = store().await;
        assert!(store
            .random_quote(RandomStrategy::PickId)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .random_quote(RandomStrategy::Sample)
            .await
            .unwrap()
            .is_none());

        for i in 0..3 {
            store.create_quote(new_quote(&i.to_string(), 3)).await.unwrap();
        }
        let all = store.list_quotes().await.unwrap();

        for strategy in [RandomStrategy::PickId, RandomStrategy::Sample] {
            let picked = store.random_quote(strategy).await.unwrap().unwrap();
            assert!(all.contains(&picked));
        }
    }

    #[tokio::test]
    async fn update_applies_partial_changes() {
        let store = store().await;
        let q = store.create_quote(new_quote("Rick Cook", 4)).await.unwrap();

        let updated = store
            .update_quote(
                q.id,
                QuoteChanges {
                    text: Some("rewritten".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "rewritten");
        assert_eq!(updated.rating, 4);
        assert_eq!(updated.author, "Rick Cook");

        let missing = store
            .update_quote(
                q.id + 1,
                QuoteChanges {
                    text: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn author_delete_cascades() {
        let store = store().await;
        let author = store
            .create_author(NewAuthor {
                name: "Waldi".into(),
                surname: Some("Ravens".into()),
            })
            .await
            .unwrap();
        let linked = store
            .create_quote(NewQuote {
                author_id: Some(author.id),
                ..new_quote("Waldi Ravens", 3)
            })
            .await
            .unwrap();
        let other = store.create_quote(new_quote("Rick Cook", 4)).await.unwrap();

        assert_eq!(
            store.quotes_of(author.id).await.unwrap(),
            Some(vec![linked.clone()])
        );

        assert!(store.delete_author(author.id).await.unwrap());
        assert!(store.get_quote(linked.id).await.unwrap().is_none());
        assert!(store.get_quote(other.id).await.unwrap().is_some());
        assert!(store.quotes_of(author.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn constraint_violations_map_to_store_errors() {
        let store = store().await;
        store
            .create_author(NewAuthor {
                name: "Rick".into(),
                surname: None,
            })
            .await
            .unwrap();

        let duplicate = store
            .create_author(NewAuthor {
                name: "Rick".into(),
                surname: None,
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateAuthor(name)) if name == "Rick"));

        let dangling = store
            .create_quote(NewQuote {
                author_id: Some(999),
                ..new_quote("Ghost", 2)
            })
            .await;
        assert!(matches!(dangling, Err(StoreError::UnknownAuthor(999))));
    }

    #[tokio::test]
    async fn quotes_of_existing_author_without_quotes_is_empty() {
        let store = store().await;
        let author = store
            .create_author(NewAuthor {
                name: "Yogi".into(),
                surname: None,
            })
            .await
            .unwrap();

        assert_eq!(store.quotes_of(author.id).await.unwrap(), Some(vec![]));
        assert_eq!(store.count_authors().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_with_dangling_author_is_rejected() {
        let store = store().await;
        let q = store.create_quote(new_quote("Rick Cook", 4)).await.unwrap();

        let result = store
            .update_quote(
                q.id,
                QuoteChanges {
                    author_id: Some(12345),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::UnknownAuthor(12345))));

        // the failed statement left the row untouched
        assert_eq!(store.get_quote(q.id).await.unwrap(), Some(q));

        let missing = store
            .update_quote(
                999,
                QuoteChanges {
                    author_id: Some(12345),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn linked_quotes_follow_their_author() {
        let store = store().await;
        let author = store
            .create_author(NewAuthor {
                name: "Yogi".into(),
                surname: Some("Berra".into()),
            })
            .await
            .unwrap();

        let created = store
            .create_quote(NewQuote {
                author_id: Some(author.id),
                ..new_quote("Not Yogi", 5)
            })
            .await
            .unwrap();
        assert_eq!(created.author, "Yogi Berra");

        let q = store.create_quote(new_quote("A", 3)).await.unwrap();
        let relinked = store
            .update_quote(
                q.id,
                QuoteChanges {
                    author_id: Some(author.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(relinked.author, "Yogi Berra");

        let edited = store
            .update_quote(
                q.id,
                QuoteChanges {
                    author: Some("Someone Else".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.author, "Yogi Berra");

        store
            .update_author(
                author.id,
                AuthorChanges {
                    name: Some("Lawrence".into()),
                    surname: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        let linked = store.quotes_of(author.id).await.unwrap().unwrap();
        assert_eq!(linked.len(), 2);
        assert!(linked.iter().all(|q| q.author == "Lawrence Berra"));

        let by_name = store
            .filter_quotes(&QuoteFilter {
                author: Some("Lawrence Berra".into()),
                rating: None,
            })
            .await
            .unwrap();
        assert_eq!(by_name, linked);
    }

    #[tokio::test]
    async fn failed_rename_leaves_quotes_alone() {
        let store = store().await;
        store
            .create_author(NewAuthor {
                name: "Rick".into(),
                surname: None,
            })
            .await
            .unwrap();
        let waldi = store
            .create_author(NewAuthor {
                name: "Waldi".into(),
                surname: None,
            })
            .await
            .unwrap();
        let q = store
            .create_quote(NewQuote {
                author_id: Some(waldi.id),
                ..new_quote("Waldi", 3)
            })
            .await
            .unwrap();

        let rename = store
            .update_author(
                waldi.id,
                AuthorChanges {
                    name: Some("Rick".into()),
                    surname: None,
                },
            )
            .await;
        assert!(matches!(rename, Err(StoreError::DuplicateAuthor(name)) if name == "Rick"));
        assert_eq!(store.get_quote(q.id).await.unwrap().unwrap().author, "Waldi");
    }
}
