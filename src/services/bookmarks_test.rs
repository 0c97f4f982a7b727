use serde_json::json;
use time::macros::datetime;

use super::*;
use crate::identity::test_helpers::MockIdentity;
use crate::identity::{Identity, IdentityProvider};
use crate::store::test_helpers::MemoryStore;

fn setup() -> (Arc<MockIdentity>, Arc<MemoryStore>, Bookmarks) {
    let mock = Arc::new(MockIdentity::new());
    let session = Arc::new(SessionStore::new(Arc::clone(&mock) as Arc<dyn IdentityProvider>));
    session.initialize().unwrap();
    let memory = Arc::new(MemoryStore::new());
    let bookmarks = Bookmarks::new(session, Arc::clone(&memory) as Arc<dyn DocumentStore>);
    (mock, memory, bookmarks)
}

fn article(url: &str) -> Article {
    Article {
        title: "Critical OpenSSH flaw".into(),
        source_name: "The Record".into(),
        url: url.into(),
        image_url: Some("https://img.example/1.png".into()),
        published_at: datetime!(2024-07-01 12:30 UTC),
    }
}

fn stored(title: &str, created_at: i64) -> Fields {
    json!({
        "title": title,
        "sourceName": "Wire",
        "url": format!("https://news.example/{title}"),
        "publishedAt": "2024-05-01T08:00:00Z",
        "createdAt": created_at,
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[tokio::test]
async fn signed_out_operations_are_rejected() {
    let (mock, memory, bookmarks) = setup();
    mock.emit(Ok(None));

    assert!(matches!(bookmarks.list().await, Err(BookmarkError::NoActiveSession)));
    assert!(matches!(bookmarks.add(&article("https://a")).await, Err(BookmarkError::NoActiveSession)));
    assert!(matches!(bookmarks.remove("doc-1").await, Err(BookmarkError::NoActiveSession)));
    assert_eq!(memory.count("u1", BOOKMARKS_COLLECTION), 0);
}

#[tokio::test]
async fn add_stores_fields_under_user() {
    let (mock, memory, bookmarks) = setup();
    mock.emit(Ok(Some(Identity::with_uid("u1"))));

    let id = bookmarks.add(&article("https://a")).await.unwrap();
    assert_eq!(memory.count("u1", BOOKMARKS_COLLECTION), 1);

    let docs = memory.list_documents("u1", BOOKMARKS_COLLECTION).await.unwrap();
    let fields = &docs[0].fields;
    assert_eq!(docs[0].id, id);
    assert_eq!(fields["title"], "Critical OpenSSH flaw");
    assert_eq!(fields["sourceName"], "The Record");
    assert_eq!(fields["imageUrl"], "https://img.example/1.png");
    assert_eq!(fields["publishedAt"], "2024-07-01T12:30:00Z");
    assert!(fields["createdAt"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn add_same_url_twice_keeps_one() {
    let (mock, memory, bookmarks) = setup();
    mock.emit(Ok(Some(Identity::with_uid("u1"))));

    let first = bookmarks.add(&article("https://a")).await.unwrap();
    let second = bookmarks.add(&article("https://a")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(memory.count("u1", BOOKMARKS_COLLECTION), 1);
}

#[tokio::test]
async fn list_is_newest_first_and_skips_malformed() {
    let (mock, memory, bookmarks) = setup();
    mock.emit(Ok(Some(Identity::with_uid("u1"))));

    memory.add_document("u1", BOOKMARKS_COLLECTION, stored("old", 1_000)).await.unwrap();
    memory.add_document("u1", BOOKMARKS_COLLECTION, stored("new", 3_000)).await.unwrap();
    memory.add_document("u1", BOOKMARKS_COLLECTION, stored("mid", 2_000)).await.unwrap();
    let mut broken = stored("broken", 4_000);
    broken.remove("url");
    memory.add_document("u1", BOOKMARKS_COLLECTION, broken).await.unwrap();

    let listed = bookmarks.list().await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["new", "mid", "old"]);
    assert_eq!(listed[0].image_url, None);
    assert_eq!(listed[0].published_at, datetime!(2024-05-01 08:00 UTC));
}

#[tokio::test]
async fn bookmarks_are_per_user() {
    let (mock, memory, bookmarks) = setup();
    mock.emit(Ok(Some(Identity::with_uid("u1"))));
    bookmarks.add(&article("https://a")).await.unwrap();

    mock.emit(Ok(Some(Identity::with_uid("u2"))));
    assert!(bookmarks.list().await.unwrap().is_empty());
    assert_eq!(memory.count("u1", BOOKMARKS_COLLECTION), 1);
}

#[tokio::test]
async fn remove_deletes_by_id() {
    let (mock, memory, bookmarks) = setup();
    mock.emit(Ok(Some(Identity::with_uid("u1"))));

    let id = bookmarks.add(&article("https://a")).await.unwrap();
    bookmarks.add(&article("https://b")).await.unwrap();
    bookmarks.remove(&id).await.unwrap();

    let remaining = bookmarks.list().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].url, "https://b");
    assert_eq!(remaining[0].article().url, "https://b");
    assert_eq!(memory.count("u1", BOOKMARKS_COLLECTION), 1);
}
