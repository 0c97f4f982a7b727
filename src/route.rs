//! Route gate: which top-level view to present for a session snapshot.
//!
//! Signed-in users get the tab shell (home, discover, bookmarks, profile)
//! with an article detail screen stacked on top; everyone else gets the
//! login stack.

use crate::state::Session;

/// Top-level UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Map a session snapshot to its UI mode. Pure and deterministic.
#[must_use]
pub fn compute_mode(session: &Session) -> Mode {
    if session.loading {
        Mode::Loading
    } else if session.identity.is_some() {
        Mode::Authenticated
    } else {
        Mode::Unauthenticated
    }
}

/// Screens reachable in each mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Discover,
    Bookmarks,
    Profile,
    ArticleDetail,
}

impl Screen {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign In",
            Self::Home => "CyberNews",
            Self::Discover => "Discover",
            Self::Bookmarks => "Bookmarks",
            Self::Profile => "Profile",
            Self::ArticleDetail => "Article Details",
        }
    }
}

/// Tab order of the signed-in shell.
pub const TABS: [Screen; 4] = [Screen::Home, Screen::Discover, Screen::Bookmarks, Screen::Profile];

/// Screens a mode may show. `Loading` shows nothing.
#[must_use]
pub fn screens_for(mode: Mode) -> &'static [Screen] {
    match mode {
        Mode::Loading => &[],
        Mode::Unauthenticated => &[Screen::Login],
        Mode::Authenticated => {
            &[Screen::Home, Screen::Discover, Screen::Bookmarks, Screen::Profile, Screen::ArticleDetail]
        }
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
