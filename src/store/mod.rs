//! Per-user document store seam.
//!
//! DESIGN
//! ======
//! Documents live under `users/{uid}/{collection}`. Fields are flat JSON
//! objects; the Firestore client translates them to and from Firestore's
//! typed value encoding.

pub mod firestore;
mod value;

use serde_json::{Map, Value};

/// Flat field map of one document.
pub type Fields = Map<String, Value>;

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No ID token available for the request.
    #[error("document store requires a signed-in user")]
    Unauthenticated,

    /// The HTTP request failed.
    #[error("document store request failed: {0}")]
    Request(String),

    /// The store returned a non-success status.
    #[error("document store error: status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized.
    #[error("document store parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "E_STORE_UNAUTHENTICATED",
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Api { .. } => "E_STORE_API",
            Self::Parse(_) => "E_STORE_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Api { status: 429 | 500..=599, .. })
    }
}

/// Source of bearer tokens for authenticated store requests.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    /// A currently valid token, or `None` when no user is signed in.
    async fn bearer_token(&self) -> Option<String>;

    /// A new token replacing `stale` after the store rejected it.
    async fn refreshed_bearer_token(&self, stale: &str) -> Option<String>;
}

#[async_trait::async_trait]
impl TokenSource for crate::identity::firebase::FirebaseAuth {
    async fn bearer_token(&self) -> Option<String> {
        self.fresh_id_token()
            .await
            .inspect_err(|e| tracing::debug!(error = %e, "store: no bearer token"))
            .ok()
    }

    async fn refreshed_bearer_token(&self, stale: &str) -> Option<String> {
        self.refresh(stale)
            .await
            .inspect_err(|e| tracing::debug!(error = %e, "store: token refresh failed"))
            .ok()
    }
}

/// Provider-neutral async document store. Enables mocking in tests.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, user_id: &str, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Create a document with a store-assigned id and return that id.
    async fn add_document(&self, user_id: &str, collection: &str, fields: Fields) -> Result<String, StoreError>;

    async fn delete_document(&self, user_id: &str, collection: &str, id: &str) -> Result<(), StoreError>;
}
