pub mod authors;
pub mod quotes;

pub use authors::{Author, AuthorChanges, CreateAuthor, NewAuthor};
pub use quotes::{CreateQuote, NewQuote, Quote, QuoteChanges, QuoteFilter, RandomStrategy};
