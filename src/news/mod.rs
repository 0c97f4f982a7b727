//! News search seam.
//!
//! DESIGN
//! ======
//! `NewsSearch` is the provider-neutral contract used by the feed service;
//! `NewsApiClient` implements it against NewsAPI.org. Article records are
//! reduced to the fields the views render.

pub mod newsapi;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// ARTICLE
// =============================================================================

/// One article as returned by the search API, in API order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub source_name: String,
    pub url: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    /// The search keyword was blank.
    #[error("search query is empty")]
    EmptyQuery,

    /// The HTTP request to the news API failed.
    #[error("news request failed: {0}")]
    Request(String),

    /// The news API returned an error payload.
    #[error("news API error ({code}): {message}")]
    Api { status: u16, code: String, message: String },

    /// The response body could not be deserialized.
    #[error("news response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for NewsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "E_EMPTY_QUERY",
            Self::Request(_) => "E_NEWS_REQUEST",
            Self::Api { .. } => "E_NEWS_API",
            Self::Parse(_) => "E_NEWS_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Api { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// SEARCH TRAIT
// =============================================================================

/// Provider-neutral async trait for article retrieval. Enables mocking in tests.
#[async_trait::async_trait]
pub trait NewsSearch: Send + Sync {
    /// Articles matching `query`, in the provider's order.
    ///
    /// # Errors
    ///
    /// Returns a [`NewsError`] if the request fails or the response is malformed.
    async fn search(&self, query: &str) -> Result<Vec<Article>, NewsError>;

    /// Current top headlines for a two-letter country code.
    ///
    /// # Errors
    ///
    /// Returns a [`NewsError`] if the request fails or the response is malformed.
    async fn top_headlines(&self, country: &str) -> Result<Vec<Article>, NewsError>;
}
