//! Home feed and keyword search over a [`NewsSearch`] provider.

use tracing::{debug, info};

use crate::news::{Article, NewsError, NewsSearch};

/// Title NewsAPI substitutes for articles pulled by the publisher.
const REMOVED_TITLE: &str = "[Removed]";

/// Top headlines for `country`, cleaned and truncated to `limit`.
///
/// # Errors
///
/// Propagates the provider's [`NewsError`].
pub async fn home_feed(news: &dyn NewsSearch, country: &str, limit: usize) -> Result<Vec<Article>, NewsError> {
    let mut articles = displayable(news.top_headlines(country).await?);
    articles.truncate(limit);
    info!(country, count = articles.len(), "feed: loaded home feed");
    Ok(articles)
}

/// Keyword search, cleaned but not truncated.
///
/// # Errors
///
/// [`NewsError::EmptyQuery`] for a blank keyword, otherwise the provider's error.
pub async fn search(news: &dyn NewsSearch, query: &str) -> Result<Vec<Article>, NewsError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(NewsError::EmptyQuery);
    }
    let articles = displayable(news.search(query).await?);
    debug!(query, count = articles.len(), "feed: search complete");
    Ok(articles)
}

fn displayable(articles: Vec<Article>) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|a| {
            let title = a.title.trim();
            !title.is_empty() && title != REMOVED_TITLE
        })
        .collect()
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
