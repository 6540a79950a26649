use serde::Deserialize;
use thiserror::Error;

use crate::model::{Block, Comment, Container, Page};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid API token header: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Listing<T> {
    /// A listing with nothing after it.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            has_more: false,
            next_cursor: None,
        }
    }
}

/// Follows cursors until the listing reports no more pages, returning every
/// item in the order the pages arrived.
pub fn drain<T, E, F>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<&str>) -> Result<Listing<T>, E>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.as_deref())?;
        items.extend(page.results);

        match (page.has_more, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            _ => break,
        }
    }

    Ok(items)
}

/// The remote document store, as far as an export needs it.
///
/// The `list_*` and `query_*` methods return a single page; the `all_*`
/// helpers drain them.
pub trait Source {
    fn retrieve_page(&self, id: &str) -> Result<Page, SourceError>;

    fn retrieve_container(&self, id: &str) -> Result<Container, SourceError>;

    fn list_children(&self, id: &str, cursor: Option<&str>) -> Result<Listing<Block>, SourceError>;

    fn query_records(&self, id: &str, cursor: Option<&str>) -> Result<Listing<Page>, SourceError>;

    fn list_comments(&self, id: &str, cursor: Option<&str>)
    -> Result<Listing<Comment>, SourceError>;

    fn all_children(&self, id: &str) -> Result<Vec<Block>, SourceError> {
        drain(|cursor| self.list_children(id, cursor))
    }

    fn all_records(&self, id: &str) -> Result<Vec<Page>, SourceError> {
        drain(|cursor| self.query_records(id, cursor))
    }

    fn all_comments(&self, id: &str) -> Result<Vec<Comment>, SourceError> {
        drain(|cursor| self.list_comments(id, cursor))
    }
}
