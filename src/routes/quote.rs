use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    models::{
        quotes::{is_valid_rating, rating_or_default},
        CreateQuote, NewQuote, Quote, QuoteChanges, QuoteFilter, RandomStrategy,
    },
    Data,
};

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[tracing::instrument(skip_all)]
pub async fn list_quotes(State(data): State<Data>) -> Result<Json<Vec<Quote>>> {
    let quotes = data.store.list_quotes().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when fetching quotes from database"),
    )?;

    Ok(Json(quotes))
}

#[tracing::instrument(skip(data))]
pub async fn get_quote(State(data): State<Data>, Path(id): Path<i64>) -> Result<Json<Quote>> {
    let quote = data.store.get_quote(id).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when fetching quote"),
    )?;

    quote.map(Json).ok_or_else(|| Error::quote_not_found(id))
}

#[tracing::instrument(skip(data))]
pub async fn filter_quotes(
    State(data): State<Data>,
    Query(filter): Query<QuoteFilter>,
) -> Result<Json<Vec<Quote>>> {
    let quotes = data.store.filter_quotes(&filter).await.inspect_err(
        |e| tracing::error!(err = ?e, ?filter, "an error occurred when filtering quotes"),
    )?;

    Ok(Json(quotes))
}

#[tracing::instrument(skip_all)]
pub async fn count_quotes(State(data): State<Data>) -> Result<Json<CountResponse>> {
    let count = data.store.count_quotes().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when counting quotes"),
    )?;

    Ok(Json(CountResponse { count }))
}

async fn pick_random(data: &Data, strategy: RandomStrategy) -> Result<Json<Quote>> {
    let quote = data.store.random_quote(strategy).await.inspect_err(
        |e| tracing::error!(err = ?e, ?strategy, "an error occurred when picking a random quote"),
    )?;

    quote
        .map(Json)
        .ok_or_else(|| Error::NotFound("Quotes not found".into()))
}

#[tracing::instrument(skip_all)]
pub async fn random_quote(State(data): State<Data>) -> Result<Json<Quote>> {
    pick_random(&data, RandomStrategy::Sample).await
}

#[tracing::instrument(skip_all)]
pub async fn random_quote_v1(State(data): State<Data>) -> Result<Json<Quote>> {
    pick_random(&data, RandomStrategy::PickId).await
}

#[tracing::instrument(skip_all)]
pub async fn random_quote_v2(State(data): State<Data>) -> Result<Json<Quote>> {
    pick_random(&data, RandomStrategy::Sample).await
}

#[tracing::instrument(skip_all)]
pub async fn create_quote(
    State(data): State<Data>,
    payload: std::result::Result<Json<CreateQuote>, JsonRejection>,
) -> Result<(StatusCode, Json<Quote>)> {
    let Json(payload) = payload?;

    let linked_author = match payload.author_id {
        Some(author_id) => Some(
            data.store
                .get_author(author_id)
                .await
                .inspect_err(|e| {
                    tracing::error!(err = ?e, author_id = %author_id, "an error occurred when fetching author");
                })?
                .ok_or_else(|| Error::author_not_found(author_id))?,
        ),
        None => None,
    };

    // a linked quote always carries its author's display name
    let author = match (&linked_author, payload.author.filter(|a| !a.is_empty())) {
        (Some(linked), _) => linked.display_name(),
        (None, Some(author)) => author,
        (None, None) => return Err(Error::BadRequest("New quote must have 'author'".into())),
    };

    let text = payload
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::BadRequest("New quote must have 'text'".into()))?;

    let quote = data
        .store
        .create_quote(NewQuote {
            author,
            text,
            rating: rating_or_default(payload.rating),
            author_id: payload.author_id,
        })
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when adding quote"))?;

    tracing::info!(id = %quote.id, author = %quote.author, "added quote");
    Ok((StatusCode::CREATED, Json(quote)))
}

#[tracing::instrument(skip(data, payload))]
pub async fn update_quote(
    State(data): State<Data>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<QuoteChanges>, JsonRejection>,
) -> Result<Json<Quote>> {
    let Json(changes) = payload?;
    let changes = changes.normalized();

    if changes.is_empty() {
        return Err(Error::BadRequest("No data to change".into()));
    }

    if changes.rating.is_some_and(|r| !is_valid_rating(r)) {
        return Err(Error::BadRequest("Rating must be between 1 and 5".into()));
    }

    let quote = data.store.update_quote(id, changes).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when updating quote"),
    )?;

    quote.map(Json).ok_or_else(|| Error::quote_not_found(id))
}

#[tracing::instrument(skip(data))]
pub async fn delete_quote(State(data): State<Data>, Path(id): Path<i64>) -> Result<String> {
    let deleted = data.store.delete_quote(id).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when deleting quote"),
    )?;

    if !deleted {
        return Err(Error::quote_not_found(id));
    }

    tracing::info!(id = %id, "deleted quote");
    Ok(format!("Quote with id={id} is deleted."))
}
