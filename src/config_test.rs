use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

const REQUIRED: &[(&str, &str)] = &[
    ("FIREBASE_API_KEY", "fb-key"),
    ("FIREBASE_PROJECT_ID", "cybernews-app"),
    ("NEWS_API_KEY", "news-key"),
];

#[test]
fn from_lookup_applies_defaults() {
    let cfg = AppConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
    assert_eq!(cfg.firebase.api_key, "fb-key");
    assert_eq!(cfg.firebase.project_id, "cybernews-app");
    assert_eq!(cfg.firebase.identity_base_url, DEFAULT_IDENTITY_BASE_URL);
    assert_eq!(cfg.firebase.secure_token_base_url, DEFAULT_SECURE_TOKEN_BASE_URL);
    assert_eq!(cfg.firebase.firestore_base_url, DEFAULT_FIRESTORE_BASE_URL);
    assert_eq!(cfg.news.base_url, DEFAULT_NEWS_BASE_URL);
    assert_eq!(cfg.news.country, "us");
    assert_eq!(cfg.news.home_feed_limit, 5);
    assert_eq!(cfg.timeouts, HttpTimeouts::default());
}

#[test]
fn from_lookup_parses_overrides() {
    let mut pairs = REQUIRED.to_vec();
    pairs.extend_from_slice(&[
        ("NEWS_COUNTRY", " GB "),
        ("HOME_FEED_LIMIT", "12"),
        ("IDENTITY_BASE_URL", "http://127.0.0.1:9099/v1/"),
        ("SECURE_TOKEN_BASE_URL", "http://127.0.0.1:9099/securetoken/v1/"),
        ("NEWS_BASE_URL", "https://news.example.test/v2/"),
        ("HTTP_REQUEST_TIMEOUT_SECS", "42"),
        ("HTTP_CONNECT_TIMEOUT_SECS", "7"),
    ]);

    let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(cfg.news.country, "gb");
    assert_eq!(cfg.news.home_feed_limit, 12);
    assert_eq!(cfg.firebase.identity_base_url, "http://127.0.0.1:9099/v1");
    assert_eq!(cfg.firebase.secure_token_base_url, "http://127.0.0.1:9099/securetoken/v1");
    assert_eq!(cfg.news.base_url, "https://news.example.test/v2");
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 42, connect_secs: 7 });
}

#[test]
fn missing_required_var_names_it() {
    let err = AppConfig::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
    assert!(matches!(&err, ConfigError::MissingVar { var } if var == "NEWS_API_KEY"));
}

#[test]
fn blank_required_var_counts_as_missing() {
    let mut pairs = REQUIRED.to_vec();
    pairs[0] = ("FIREBASE_API_KEY", "   ");
    let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
    assert!(err.to_string().contains("FIREBASE_API_KEY"));
}

#[test]
fn unparsable_numbers_fall_back_to_defaults() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("HTTP_REQUEST_TIMEOUT_SECS", "soon"));
    pairs.push(("HOME_FEED_LIMIT", "many"));
    let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_HTTP_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.news.home_feed_limit, DEFAULT_HOME_FEED_LIMIT);
}

#[test]
fn zero_feed_limit_is_rejected() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("HOME_FEED_LIMIT", "0"));
    let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
