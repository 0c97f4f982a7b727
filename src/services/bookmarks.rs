//! Saved articles in the signed-in user's `bookmarks` collection.
//!
//! DESIGN
//! ======
//! Every operation reads the uid from the session snapshot at call time, so
//! a sign-out between two calls turns the second into `NoActiveSession`
//! instead of writing under a stale uid. Documents that fail to decode are
//! skipped with a warning rather than failing the whole list.

use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use super::session::SessionStore;
use crate::news::Article;
use crate::store::{Document, DocumentStore, Fields, StoreError};

pub const BOOKMARKS_COLLECTION: &str = "bookmarks";

// =============================================================================
// TYPES
// =============================================================================

/// One saved article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// Store-assigned document id.
    pub id: String,
    pub title: String,
    pub source_name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: OffsetDateTime,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum BookmarkError {
    #[error("no signed-in user")]
    NoActiveSession,

    /// A timestamp could not be rendered for storage.
    #[error("bookmark encode failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl crate::error::ErrorCode for BookmarkError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoActiveSession => "E_NO_ACTIVE_SESSION",
            Self::Encode(_) => "E_BOOKMARK_ENCODE",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// SERVICE
// =============================================================================

#[derive(Clone)]
pub struct Bookmarks {
    session: Arc<SessionStore>,
    documents: Arc<dyn DocumentStore>,
}

impl Bookmarks {
    #[must_use]
    pub fn new(session: Arc<SessionStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { session, documents }
    }

    fn uid(&self) -> Result<String, BookmarkError> {
        self.session
            .snapshot()
            .uid()
            .map(str::to_string)
            .ok_or(BookmarkError::NoActiveSession)
    }

    /// Saved articles, newest first.
    ///
    /// # Errors
    ///
    /// `NoActiveSession` when signed out, otherwise the store's error.
    pub async fn list(&self) -> Result<Vec<Bookmark>, BookmarkError> {
        let uid = self.uid()?;
        let documents = self.documents.list_documents(&uid, BOOKMARKS_COLLECTION).await?;

        let mut bookmarks: Vec<Bookmark> = documents
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                from_document(doc)
                    .inspect_err(|reason| warn!(%uid, %id, %reason, "bookmarks: skipping malformed document"))
                    .ok()
            })
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookmarks)
    }

    /// Save `article` and return the bookmark id. An article whose URL is
    /// already saved returns the existing id.
    ///
    /// # Errors
    ///
    /// `NoActiveSession` when signed out, otherwise the store's error.
    pub async fn add(&self, article: &Article) -> Result<String, BookmarkError> {
        if let Some(existing) = self.list().await?.into_iter().find(|b| b.url == article.url) {
            return Ok(existing.id);
        }

        let uid = self.uid()?;
        let created_at = unix_millis(OffsetDateTime::now_utc());
        let fields = to_fields(article, created_at)?;
        let id = self
            .documents
            .add_document(&uid, BOOKMARKS_COLLECTION, fields)
            .await?;
        info!(%uid, %id, url = %article.url, "bookmarks: saved");
        Ok(id)
    }

    /// Delete the bookmark with document id `id`.
    ///
    /// # Errors
    ///
    /// `NoActiveSession` when signed out, otherwise the store's error.
    pub async fn remove(&self, id: &str) -> Result<(), BookmarkError> {
        let uid = self.uid()?;
        self.documents
            .delete_document(&uid, BOOKMARKS_COLLECTION, id)
            .await?;
        info!(%uid, %id, "bookmarks: removed");
        Ok(())
    }
}

// =============================================================================
// FIELD MAPPING
// =============================================================================

fn unix_millis(at: OffsetDateTime) -> i64 {
    i64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

fn to_fields(article: &Article, created_at: i64) -> Result<Fields, BookmarkError> {
    let published_at = article
        .published_at
        .format(&Rfc3339)
        .map_err(|e| BookmarkError::Encode(e.to_string()))?;

    let mut fields = Fields::new();
    fields.insert("title".into(), Value::from(article.title.as_str()));
    fields.insert("sourceName".into(), Value::from(article.source_name.as_str()));
    fields.insert("url".into(), Value::from(article.url.as_str()));
    if let Some(image_url) = &article.image_url {
        fields.insert("imageUrl".into(), Value::from(image_url.as_str()));
    }
    fields.insert("publishedAt".into(), Value::from(published_at));
    fields.insert("createdAt".into(), Value::from(created_at));
    Ok(fields)
}

fn from_document(doc: Document) -> Result<Bookmark, String> {
    let text = |key: &str| -> Result<String, String> {
        doc.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("missing {key}"))
    };

    let published_raw = text("publishedAt")?;
    let published_at = OffsetDateTime::parse(&published_raw, &Rfc3339).map_err(|e| format!("publishedAt: {e}"))?;
    let created_at = doc
        .fields
        .get("createdAt")
        .and_then(Value::as_i64)
        .ok_or_else(|| "missing createdAt".to_string())?;

    Ok(Bookmark {
        title: text("title")?,
        source_name: text("sourceName").unwrap_or_default(),
        url: text("url")?,
        image_url: doc.fields.get("imageUrl").and_then(Value::as_str).map(str::to_string),
        published_at,
        created_at,
        id: doc.id,
    })
}

impl Bookmark {
    /// The saved article, for rendering alongside feed results.
    #[must_use]
    pub fn article(&self) -> Article {
        Article {
            title: self.title.clone(),
            source_name: self.source_name.clone(),
            url: self.url.clone(),
            image_url: self.image_url.clone(),
            published_at: self.published_at,
        }
    }
}

#[cfg(test)]
#[path = "bookmarks_test.rs"]
mod tests;
