use std::sync::Mutex;

use super::*;
use crate::config::DEFAULT_FIRESTORE_BASE_URL;
use crate::test_helpers::StubServer;

struct NoToken;

#[async_trait::async_trait]
impl TokenSource for NoToken {
    async fn bearer_token(&self) -> Option<String> {
        None
    }

    async fn refreshed_bearer_token(&self, _stale: &str) -> Option<String> {
        None
    }
}

/// Hands out `stale` first and `fresh` once asked to refresh.
struct RotatingToken {
    refreshed_from: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl TokenSource for RotatingToken {
    async fn bearer_token(&self) -> Option<String> {
        Some("stale".into())
    }

    async fn refreshed_bearer_token(&self, stale: &str) -> Option<String> {
        self.refreshed_from.lock().unwrap().push(stale.to_string());
        Some("fresh".into())
    }
}

fn config(firestore_base_url: &str) -> FirebaseConfig {
    FirebaseConfig {
        api_key: "k".into(),
        project_id: "cybernews-app".into(),
        identity_base_url: "http://unused".into(),
        secure_token_base_url: "http://unused".into(),
        firestore_base_url: firestore_base_url.into(),
    }
}

fn signed_out_client() -> FirestoreClient {
    FirestoreClient::new(&config(DEFAULT_FIRESTORE_BASE_URL), HttpTimeouts::default(), Arc::new(NoToken)).unwrap()
}

#[test]
fn collection_url_nests_under_user() {
    let client = signed_out_client();
    assert_eq!(
        client.collection_url("uid-1", "bookmarks"),
        "https://firestore.googleapis.com/v1/projects/cybernews-app/databases/(default)/documents/users/uid-1/bookmarks"
    );
}

#[test]
fn parse_document_takes_id_from_name() {
    let json = serde_json::json!({
        "name": "projects/p/databases/(default)/documents/users/uid-1/bookmarks/abc123",
        "fields": { "title": { "stringValue": "Zero-day" } },
        "createTime": "2024-05-01T08:00:00.000000Z",
        "updateTime": "2024-05-01T08:00:00.000000Z"
    })
    .to_string();

    let doc = parse_document(&json).unwrap();
    assert_eq!(doc.id, "abc123");
    assert_eq!(doc.fields["title"], "Zero-day");
}

#[test]
fn parse_document_without_fields_is_empty() {
    let doc = parse_document(r#"{"name":"projects/p/databases/(default)/documents/users/u/todos/x"}"#).unwrap();
    assert_eq!(doc.id, "x");
    assert!(doc.fields.is_empty());
}

#[test]
fn parse_document_rejects_trailing_slash_name() {
    assert!(parse_document(r#"{"name":"projects/p/"}"#).is_err());
}

#[test]
fn parse_list_response_with_page_token() {
    let json = serde_json::json!({
        "documents": [
            { "name": ".../bookmarks/a", "fields": { "n": { "integerValue": "1" } } },
            { "name": ".../bookmarks/b", "fields": { "n": { "integerValue": "2" } } }
        ],
        "nextPageToken": "page-2"
    })
    .to_string();

    let page = parse_list_response(&json).unwrap();
    let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
}

#[test]
fn parse_empty_collection() {
    let page = parse_list_response("{}").unwrap();
    assert!(page.documents.is_empty());
    assert!(page.next_page_token.is_none());
}

#[test]
fn error_message_prefers_envelope() {
    let body = r#"{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#;
    assert_eq!(error_message(body), "Missing or insufficient permissions.");
    assert_eq!(error_message("plain failure"), "plain failure");
}

#[tokio::test]
async fn requests_without_token_fail_before_sending() {
    let client = signed_out_client();
    let err = client.list_documents("uid-1", "bookmarks").await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));

    let err = client
        .add_document("uid-1", "bookmarks", Fields::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_retried_once() {
    let server = StubServer::start(vec![
        (401, r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#.into()),
        (200, r#"{"documents":[{"name":".../bookmarks/a"}]}"#.into()),
    ])
    .await;
    let tokens = Arc::new(RotatingToken { refreshed_from: Mutex::new(Vec::new()) });
    let client = FirestoreClient::new(
        &config(&server.url),
        HttpTimeouts::default(),
        Arc::clone(&tokens) as Arc<dyn TokenSource>,
    )
    .unwrap();

    let docs = client.list_documents("uid-1", "bookmarks").await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(*tokens.refreshed_from.lock().unwrap(), vec!["stale".to_string()]);

    let requests = server.requests().await;
    assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer stale"));
    assert!(requests[1].to_ascii_lowercase().contains("authorization: bearer fresh"));
    assert!(requests[1].contains("/projects/cybernews-app/databases/(default)/documents/users/uid-1/bookmarks"));
}

#[tokio::test]
async fn second_rejection_is_reported() {
    let denied = r#"{"error":{"code":401,"message":"still denied"}}"#.to_string();
    let server = StubServer::start(vec![(401, denied.clone()), (401, denied)]).await;
    let tokens = Arc::new(RotatingToken { refreshed_from: Mutex::new(Vec::new()) });
    let client = FirestoreClient::new(&config(&server.url), HttpTimeouts::default(), tokens).unwrap();

    let err = client.delete_document("uid-1", "bookmarks", "a").await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 401, ref message } if message == "still denied"));
    assert_eq!(server.requests().await.len(), 2);
}
