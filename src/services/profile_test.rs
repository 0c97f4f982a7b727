use time::macros::datetime;

use super::*;

#[test]
fn full_identity() {
    let identity = Identity {
        display_name: Some("ada lovelace".into()),
        email: Some("ada@example.com".into()),
        photo_url: Some("https://img.example/ada.png".into()),
        created_at: Some(datetime!(2024-03-15 10:00 UTC)),
        ..Identity::with_uid("u1")
    };

    let card = ProfileCard::from_identity(&identity);
    assert_eq!(card.name, "ada lovelace");
    assert_eq!(card.email, "ada@example.com");
    assert_eq!(card.avatar_initial, 'A');
    assert_eq!(card.member_since, "March 2024");
    assert_eq!(card.photo_url.as_deref(), Some("https://img.example/ada.png"));
}

#[test]
fn initial_falls_back_to_email() {
    let identity = Identity { email: Some("zed@example.com".into()), ..Identity::with_uid("u1") };
    let card = ProfileCard::from_identity(&identity);
    assert_eq!(card.name, "User");
    assert_eq!(card.avatar_initial, 'Z');
}

#[test]
fn bare_identity_uses_placeholders() {
    let identity = Identity { display_name: Some("   ".into()), ..Identity::with_uid("u1") };
    let card = ProfileCard::from_identity(&identity);
    assert_eq!(card.name, "User");
    assert_eq!(card.email, "No email provided");
    assert_eq!(card.avatar_initial, 'U');
    assert_eq!(card.member_since, "Recently");
}

#[test]
fn member_since_uses_full_month_name() {
    assert_eq!(member_since(Some(datetime!(2023-12-31 23:59 UTC))), "December 2023");
    assert_eq!(member_since(None), "Recently");
}
