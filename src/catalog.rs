//! Catalog client for the remote book search.
//!
//! The client turns a free-text query into a GET request against the search
//! endpoint and normalizes the response into [`CatalogEntry`] values. The
//! upstream response mixes books with movies, music and other card types;
//! only `type == "book"` cards survive.
//!
//! ## Response shape
//!
//! ```json
//! {
//!   "q": "dune",
//!   "words": ["dune"],
//!   "cards": [
//!     { "type": "movie", "title": "Dune", ... },
//!     { "type": "book", "title": "Dune", "url": "...", "abstract": "...",
//!       "cover_url": "...", "card_subtitle": "..." }
//!   ]
//! }
//! ```
//!
//! Nothing here retries. Superseded queries and stale results are the
//! caller's business.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::book_model::{CatalogEntry, BOOK_KIND};
use crate::config::LibraryConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Search query is empty")]
    InvalidQuery,

    #[error("Remote search failed: {0}")]
    RemoteSearchFailed(String),

    #[error("Unexpected search response: {0}")]
    RemoteParseFailed(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A ready-to-send search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Trimmed query text.
    pub query: String,
    /// Full URL including the percent-encoded `q` parameter.
    pub url: String,
}

impl SearchRequest {
    pub fn method(&self) -> &'static str {
        "GET"
    }
}

/// Builds the search request for `query` against `endpoint`.
///
/// Fails with [`CatalogError::InvalidQuery`] when the query is blank. Callers
/// must not hit the network in that case.
///
/// ```rust
/// use shelf_core::catalog::build_search_request;
///
/// let request = build_search_request("https://example.org/search", "  三体 ")?;
/// assert_eq!(request.url, "https://example.org/search?q=%E4%B8%89%E4%BD%93");
/// # Ok::<(), shelf_core::catalog::CatalogError>(())
/// ```
pub fn build_search_request(endpoint: &str, query: &str) -> CatalogResult<SearchRequest> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidQuery);
    }

    Ok(SearchRequest {
        query: trimmed.to_string(),
        url: format!("{endpoint}?q={}", urlencoding::encode(trimmed)),
    })
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    cards: Vec<JsonValue>,
}

/// Parses a raw search response body into book entries.
///
/// Non-book cards are dropped before their fields are looked at, so an odd
/// movie card never fails the parse. A book card missing one of the expected
/// fields does. Upstream order is kept.
pub fn parse_search_response(body: &str) -> CatalogResult<Vec<CatalogEntry>> {
    let envelope: SearchEnvelope = serde_json::from_str(body)
        .map_err(|e| CatalogError::RemoteParseFailed(format!("invalid response body: {e}")))?;

    let total = envelope.cards.len();
    let books = envelope
        .cards
        .into_iter()
        .filter(|card| card.get("type").and_then(JsonValue::as_str) == Some(BOOK_KIND))
        .map(|card| {
            serde_json::from_value::<CatalogEntry>(card)
                .map_err(|e| CatalogError::RemoteParseFailed(format!("invalid book card: {e}")))
        })
        .collect::<CatalogResult<Vec<_>>>()?;

    debug!("Search response: {} cards, {} books", total, books.len());
    Ok(books)
}

/// Carries a [`SearchRequest`] to the endpoint and returns the raw body.
pub trait CatalogTransport {
    fn fetch(&self, request: &SearchRequest) -> CatalogResult<String>;
}

/// Blocking HTTP transport.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &LibraryConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build();
        Self { agent }
    }
}

impl CatalogTransport for UreqTransport {
    fn fetch(&self, request: &SearchRequest) -> CatalogResult<String> {
        let response = self
            .agent
            .request(request.method(), &request.url)
            .call()
            .map_err(|e: ureq::Error| CatalogError::RemoteSearchFailed(e.to_string()))?;

        if response.status() != 200 {
            return Err(CatalogError::RemoteSearchFailed(format!(
                "server returned status {}",
                response.status()
            )));
        }

        response
            .into_string()
            .map_err(|e| CatalogError::RemoteSearchFailed(format!("read body: {e}")))
    }
}

/// Search front-end: build, fetch, parse.
pub struct CatalogClient<T: CatalogTransport> {
    endpoint: String,
    transport: T,
}

impl CatalogClient<UreqTransport> {
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(config.search_endpoint.clone(), UreqTransport::new(config))
    }
}

impl<T: CatalogTransport> CatalogClient<T> {
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn build_request(&self, query: &str) -> CatalogResult<SearchRequest> {
        build_search_request(&self.endpoint, query)
    }

    pub fn search(&self, query: &str) -> CatalogResult<Vec<CatalogEntry>> {
        let request = self.build_request(query)?;
        info!("Searching catalog for '{}'", request.query);

        let body = self.transport.fetch(&request).inspect_err(|e| {
            warn!("Catalog request for '{}' failed: {e}", request.query);
        })?;

        parse_search_response(&body)
    }
}
