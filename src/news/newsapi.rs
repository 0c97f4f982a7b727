//! NewsAPI.org client.
//!
//! Thin HTTP wrapper for `/everything` and `/top-headlines`. Pure parsing in
//! `parse_response` for testability. Articles with a missing URL or an
//! unparsable timestamp are skipped rather than failing the whole page.

use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use super::{Article, NewsError, NewsSearch};
use crate::config::{HttpTimeouts, NewsConfig};

const API_KEY_HEADER: &str = "X-Api-Key";
const USER_AGENT: &str = "cybernews";
const PAGE_SIZE: u32 = 50;

// =============================================================================
// CLIENT
// =============================================================================

pub struct NewsApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &NewsConfig, timeouts: HttpTimeouts) -> Result<Self, NewsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NewsError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key: config.api_key.clone(), base_url: config.base_url.clone() })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<Article>, NewsError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .query(&[("pageSize", page_size.as_str())])
            .send()
            .await
            .map_err(|e| NewsError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| NewsError::Request(e.to_string()))?;

        let articles = parse_response(status, &text)?;
        debug!(endpoint, count = articles.len(), "news: fetched articles");
        Ok(articles)
    }
}

#[async_trait::async_trait]
impl NewsSearch for NewsApiClient {
    async fn search(&self, query: &str) -> Result<Vec<Article>, NewsError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NewsError::EmptyQuery);
        }
        self.get("everything", &[("q", query), ("sortBy", "publishedAt")])
            .await
    }

    async fn top_headlines(&self, country: &str) -> Result<Vec<Article>, NewsError> {
        self.get("top-headlines", &[("country", country)]).await
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    source: ApiSource,
    title: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct ApiSource {
    name: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(status: u16, json: &str) -> Result<Vec<Article>, NewsError> {
    let api: ApiResponse = match serde_json::from_str(json) {
        Ok(api) => api,
        Err(e) if (200..300).contains(&status) => return Err(NewsError::Parse(e.to_string())),
        Err(_) => {
            return Err(NewsError::Api { status, code: format!("http_{status}"), message: json.to_string() });
        }
    };

    if api.status != "ok" || !(200..300).contains(&status) {
        return Err(NewsError::Api {
            status,
            code: api.code.unwrap_or_else(|| "unknown".into()),
            message: api.message.unwrap_or_default(),
        });
    }

    Ok(api.articles.into_iter().filter_map(into_article).collect())
}

fn into_article(raw: ApiArticle) -> Option<Article> {
    let url = raw.url.filter(|u| !u.is_empty())?;
    let published_raw = raw.published_at.unwrap_or_default();
    let Ok(published_at) = OffsetDateTime::parse(&published_raw, &Rfc3339) else {
        warn!(%url, published_at = %published_raw, "news: skipping article with bad timestamp");
        return None;
    };
    Some(Article {
        title: raw.title.unwrap_or_default(),
        source_name: raw.source.name.unwrap_or_default(),
        url,
        image_url: raw.url_to_image.filter(|u| !u.is_empty()),
        published_at,
    })
}

#[cfg(test)]
#[path = "newsapi_test.rs"]
mod tests;
