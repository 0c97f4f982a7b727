//! Profile card presentation for the signed-in identity.

use time::OffsetDateTime;

use crate::identity::Identity;

const FALLBACK_NAME: &str = "User";
const FALLBACK_EMAIL: &str = "No email provided";
const FALLBACK_INITIAL: char = 'U';
const UNKNOWN_MEMBER_SINCE: &str = "Recently";

/// Display-ready profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard {
    pub name: String,
    pub email: String,
    pub avatar_initial: char,
    pub member_since: String,
    pub photo_url: Option<String>,
}

impl ProfileCard {
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        let name = non_blank(identity.display_name.as_deref());
        let email = non_blank(identity.email.as_deref());

        let avatar_initial = name
            .or(email)
            .and_then(|s| s.chars().next())
            .map_or(FALLBACK_INITIAL, |c| c.to_uppercase().next().unwrap_or(c));

        Self {
            name: name.unwrap_or(FALLBACK_NAME).to_string(),
            email: email.unwrap_or(FALLBACK_EMAIL).to_string(),
            avatar_initial,
            member_since: member_since(identity.created_at),
            photo_url: identity.photo_url.clone(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `"<Month> <Year>"`, e.g. `"March 2024"`.
#[must_use]
pub fn member_since(created_at: Option<OffsetDateTime>) -> String {
    created_at.map_or_else(
        || UNKNOWN_MEMBER_SINCE.to_string(),
        |at| format!("{} {}", at.month(), at.year()),
    )
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
