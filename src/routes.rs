//! HTTP surface of the service.
//!
//! Every route maps onto exactly one store operation. Successful reads answer
//! with JSON, failures with a plain-text sentence and a matching status code.

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::Data;

pub mod author;
pub mod quote;
pub mod status;

fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    // no configured origins means development mode
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.to_vec()))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(data: Data, cors_origins: &[HeaderValue]) -> Router {
    Router::new()
        .route("/quotes/", get(quote::list_quotes).post(quote::create_quote))
        .route("/quotes/filter/", get(quote::filter_quotes))
        .route("/quotes/count/", get(quote::count_quotes))
        .route("/quotes/random/", get(quote::random_quote))
        .route("/quotes/random/v1/", get(quote::random_quote_v1))
        .route("/quotes/random/v2/", get(quote::random_quote_v2))
        .route(
            "/quotes/:id/",
            get(quote::get_quote)
                .put(quote::update_quote)
                .delete(quote::delete_quote),
        )
        .route(
            "/authors/",
            get(author::list_authors).post(author::create_author),
        )
        .route(
            "/authors/:id/",
            get(author::get_author)
                .put(author::update_author)
                .delete(author::delete_author),
        )
        .route("/authors/:id/quotes/", get(author::quotes_of_author))
        .route("/status/", get(status::status))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(data)
}
