//! Cloud Firestore REST client.
//!
//! Thin HTTP wrapper over the `documents` endpoints, authenticated with the
//! signed-in user's ID token. Pure parsing in `parse_list_response` and
//! `parse_document` for testability.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::value::{decode_fields, encode_fields};
use super::{Document, DocumentStore, Fields, StoreError, TokenSource};
use crate::config::{FirebaseConfig, HttpTimeouts};

const LIST_PAGE_SIZE: u32 = 300;

// =============================================================================
// CLIENT
// =============================================================================

pub struct FirestoreClient {
    http: reqwest::Client,
    documents_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl FirestoreClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &FirebaseConfig, timeouts: HttpTimeouts, tokens: Arc<dyn TokenSource>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, documents_url: documents_url(&config.firestore_base_url, &config.project_id), tokens })
    }

    fn collection_url(&self, user_id: &str, collection: &str) -> String {
        format!("{}/users/{user_id}/{collection}", self.documents_url)
    }

    /// Send with bearer auth. A 401 is retried once with a refreshed token.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .ok_or(StoreError::Unauthenticated)?;
        let retry = request.try_clone();
        let (mut status, mut text) = execute(request.bearer_auth(&token)).await?;

        if status == 401 {
            if let Some(retry) = retry {
                debug!("firestore: token rejected; refreshing");
                let token = self
                    .tokens
                    .refreshed_bearer_token(&token)
                    .await
                    .ok_or(StoreError::Unauthenticated)?;
                (status, text) = execute(retry.bearer_auth(&token)).await?;
            }
        }

        if !(200..300).contains(&status) {
            return Err(StoreError::Api { status, message: error_message(&text) });
        }
        Ok(text)
    }
}

async fn execute(request: reqwest::RequestBuilder) -> Result<(u16, String), StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))?;
    Ok((status, text))
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_documents(&self, user_id: &str, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = self.collection_url(user_id, collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page = parse_list_response(&self.send(request).await?)?;
            documents.extend(page.documents);
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        debug!(%user_id, collection, count = documents.len(), "firestore: listed documents");
        Ok(documents)
    }

    async fn add_document(&self, user_id: &str, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let body = serde_json::json!({ "fields": encode_fields(&fields) });
        let request = self
            .http
            .post(self.collection_url(user_id, collection))
            .json(&body);
        let document = parse_document(&self.send(request).await?)?;
        debug!(%user_id, collection, id = %document.id, "firestore: added document");
        Ok(document.id)
    }

    async fn delete_document(&self, user_id: &str, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{id}", self.collection_url(user_id, collection));
        self.send(self.http.delete(url)).await?;
        debug!(%user_id, collection, %id, "firestore: deleted document");
        Ok(())
    }
}

fn documents_url(base_url: &str, project_id: &str) -> String {
    format!("{base_url}/projects/{project_id}/databases/(default)/documents")
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct RawDocument {
    /// Full resource name; the document id is its last path segment.
    name: String,
    #[serde(default)]
    fields: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawList {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

struct Page {
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn into_document(raw: RawDocument) -> Result<Document, StoreError> {
    let id = raw
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Parse(format!("document name has no id: {}", raw.name)))?
        .to_string();
    Ok(Document { id, fields: decode_fields(raw.fields.as_ref())? })
}

fn parse_document(json: &str) -> Result<Document, StoreError> {
    let raw: RawDocument = serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
    into_document(raw)
}

fn parse_list_response(json: &str) -> Result<Page, StoreError> {
    let raw: RawList = serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
    let documents = raw
        .documents
        .into_iter()
        .map(into_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page { documents, next_page_token: raw.next_page_token })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(|_| body.to_string(), |e| e.error.message)
}

#[cfg(test)]
#[path = "firestore_test.rs"]
mod tests;
