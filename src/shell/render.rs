//! Plain-text rendering of articles, bookmarks and the profile card.

use std::fmt::Write as _;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::news::Article;
use crate::route::{Screen, TABS};
use crate::services::bookmarks::Bookmark;
use crate::services::profile::ProfileCard;

#[must_use]
pub fn header(screen: Screen) -> String {
    format!("== {} ==", screen.title())
}

/// Signed-in tab strip, in tab order.
#[must_use]
pub fn tab_bar() -> String {
    let titles: Vec<&str> = TABS.iter().map(|tab| tab.title()).collect();
    format!("Tabs: {}", titles.join(" | "))
}

fn date(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| at.to_string())
}

/// Numbered listing; an empty slice renders `empty`.
#[must_use]
pub fn article_list(articles: &[Article], empty: &str) -> String {
    if articles.is_empty() {
        return empty.to_string();
    }
    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}", i + 1, article.title);
        let _ = writeln!(out, "    {} | {}", article.source_name, date(article.published_at));
    }
    out.trim_end().to_string()
}

#[must_use]
pub fn bookmark_list(bookmarks: &[Bookmark]) -> String {
    if bookmarks.is_empty() {
        return "No saved articles yet.".to_string();
    }
    let mut out = String::new();
    for (i, bookmark) in bookmarks.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}", i + 1, bookmark.title);
        let _ = writeln!(out, "    {} | {}", bookmark.source_name, bookmark.url);
    }
    out.trim_end().to_string()
}

#[must_use]
pub fn article_detail(article: &Article) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "Source:    {}", article.source_name);
    let _ = writeln!(out, "Published: {}", date(article.published_at));
    if let Some(image) = &article.image_url {
        let _ = writeln!(out, "Image:     {image}");
    }
    let _ = write!(out, "Read more: {}", article.url);
    out
}

#[must_use]
pub fn profile(card: &ProfileCard) -> String {
    format!(
        "[{}] {}\n    {}\n    Member since {}",
        card.avatar_initial, card.name, card.email, card.member_since
    )
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.into(),
            source_name: "Krebs".into(),
            url: "https://krebsonsecurity.com/x".into(),
            image_url: None,
            published_at: datetime!(2024-02-09 17:45 UTC),
        }
    }

    #[test]
    fn numbered_listing() {
        let text = article_list(&[article("First"), article("Second")], "none");
        assert_eq!(text, " 1. First\n    Krebs | 2024-02-09\n 2. Second\n    Krebs | 2024-02-09");
    }

    #[test]
    fn tab_bar_follows_tab_order() {
        assert_eq!(tab_bar(), "Tabs: CyberNews | Discover | Bookmarks | Profile");
    }

    #[test]
    fn empty_listing_uses_placeholder() {
        assert_eq!(article_list(&[], "No articles found."), "No articles found.");
        assert_eq!(bookmark_list(&[]), "No saved articles yet.");
    }

    #[test]
    fn detail_omits_missing_image() {
        let text = article_detail(&article("Story"));
        assert!(!text.contains("Image:"));
        assert!(text.ends_with("Read more: https://krebsonsecurity.com/x"));
    }

    #[test]
    fn profile_card_lines() {
        let card = ProfileCard {
            name: "User".into(),
            email: "No email provided".into(),
            avatar_initial: 'U',
            member_since: "Recently".into(),
            photo_url: None,
        };
        assert_eq!(profile(&card), "[U] User\n    No email provided\n    Member since Recently");
    }
}
