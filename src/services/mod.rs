//! Domain services used by the terminal shell.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session state and provider orchestration so the
//! shell can stay focused on parsing commands and rendering results.

pub mod actions;
pub mod bookmarks;
pub mod feed;
pub mod profile;
pub mod session;
