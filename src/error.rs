use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::store::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors a handler can answer with. Every variant renders as a plain-text body.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn quote_not_found(id: i64) -> Self {
        Error::NotFound(format!("Quote with id={id} not found"))
    }

    pub fn author_not_found(id: i64) -> Self {
        Error::NotFound(format!("Author with id={id} not found"))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateAuthor(name) => {
                Error::Conflict(format!("Author with name={name} already exists"))
            }
            StoreError::UnknownAuthor(id) => Error::author_not_found(id),
            StoreError::Database(e) => Error::Internal(e.into()),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Error::Internal(e) => {
                tracing::error!(err = ?e, "an error occurred while handling request");
                (status, "Internal server error").into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
