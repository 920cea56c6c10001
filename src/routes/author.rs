use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{Error, Result},
    models::{Author, AuthorChanges, CreateAuthor, NewAuthor, Quote},
    Data,
};

#[tracing::instrument(skip_all)]
pub async fn list_authors(State(data): State<Data>) -> Result<Json<Vec<Author>>> {
    let authors = data.store.list_authors().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when fetching authors from database"),
    )?;

    Ok(Json(authors))
}

#[tracing::instrument(skip(data))]
pub async fn get_author(State(data): State<Data>, Path(id): Path<i64>) -> Result<Json<Author>> {
    let author = data.store.get_author(id).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when fetching author"),
    )?;

    author.map(Json).ok_or_else(|| Error::author_not_found(id))
}

#[tracing::instrument(skip_all)]
pub async fn create_author(
    State(data): State<Data>,
    payload: std::result::Result<Json<CreateAuthor>, JsonRejection>,
) -> Result<(StatusCode, Json<Author>)> {
    let Json(payload) = payload?;

    let name = payload
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::BadRequest("New author must have 'name'".into()))?;

    let author = data
        .store
        .create_author(NewAuthor {
            name,
            surname: payload.surname.filter(|s| !s.is_empty()),
        })
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when adding author"))?;

    tracing::info!(id = %author.id, name = %author.name, "added author");
    Ok((StatusCode::CREATED, Json(author)))
}

#[tracing::instrument(skip(data, payload))]
pub async fn update_author(
    State(data): State<Data>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<AuthorChanges>, JsonRejection>,
) -> Result<Json<Author>> {
    let Json(changes) = payload?;
    let changes = changes.normalized();

    if changes.is_empty() {
        return Err(Error::BadRequest("No data to change".into()));
    }

    let author = data.store.update_author(id, changes).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when updating author"),
    )?;

    author.map(Json).ok_or_else(|| Error::author_not_found(id))
}

#[tracing::instrument(skip(data))]
pub async fn delete_author(State(data): State<Data>, Path(id): Path<i64>) -> Result<String> {
    let deleted = data.store.delete_author(id).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when deleting author"),
    )?;

    if !deleted {
        return Err(Error::author_not_found(id));
    }

    tracing::info!(id = %id, "deleted author and their quotes");
    Ok(format!("Author with id={id} is deleted."))
}

#[tracing::instrument(skip(data))]
pub async fn quotes_of_author(
    State(data): State<Data>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Quote>>> {
    let quotes = data.store.quotes_of(id).await.inspect_err(
        |e| tracing::error!(err = ?e, id = %id, "an error occurred when fetching quotes of author"),
    )?;

    quotes.map(Json).ok_or_else(|| Error::author_not_found(id))
}
