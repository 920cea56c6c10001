use serde::{de, Deserialize, Deserializer, Serialize};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
pub const DEFAULT_RATING: i64 = MIN_RATING;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Quote {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
}

/// A quote that has passed request validation and is ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuote {
    pub author: String,
    pub text: String,
    pub rating: i64,
    pub author_id: Option<i64>,
}

/// Body of `POST /quotes/`. Every field is optional here so the handler can
/// name the missing one in its reply.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateQuote {
    pub author: Option<String>,
    pub text: Option<String>,
    #[serde(alias = "rate")]
    pub rating: Option<i64>,
    pub author_id: Option<i64>,
}

/// Fields of a quote that may be changed after creation. Anything else in an
/// update body is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct QuoteChanges {
    pub author: Option<String>,
    pub text: Option<String>,
    #[serde(alias = "rate")]
    pub rating: Option<i64>,
    pub author_id: Option<i64>,
}

impl QuoteChanges {
    /// Drops empty strings so they leave the stored value untouched.
    pub fn normalized(self) -> Self {
        Self {
            author: self.author.filter(|s| !s.is_empty()),
            text: self.text.filter(|s| !s.is_empty()),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.text.is_none()
            && self.rating.is_none()
            && self.author_id.is_none()
    }

    pub fn apply(&self, quote: &mut Quote) {
        if let Some(author) = &self.author {
            quote.author = author.clone();
        }
        if let Some(text) = &self.text {
            quote.text = text.clone();
        }
        if let Some(rating) = self.rating {
            quote.rating = rating;
        }
        if let Some(author_id) = self.author_id {
            quote.author_id = Some(author_id);
        }
    }
}

/// Query of `GET /quotes/filter/`. Empty parameters (`?rating=`) count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct QuoteFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub rating: Option<i64>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

impl QuoteFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        self.author.as_ref().map_or(true, |a| *a == quote.author)
            && self.rating.map_or(true, |r| r == quote.rating)
    }
}

/// How a random quote gets picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomStrategy {
    /// Read every id, choose one, then fetch that row.
    PickId,
    /// Let the backend sample a row directly.
    Sample,
}

pub fn is_valid_rating(rating: i64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Ratings outside the accepted range fall back to the default on create.
pub fn rating_or_default(rating: Option<i64>) -> i64 {
    rating.filter(|r| is_valid_rating(*r)).unwrap_or(DEFAULT_RATING)
}
