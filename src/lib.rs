//! CyberNews client core.
//!
//! ARCHITECTURE
//! ============
//! `services::session::SessionStore` owns the sign-in state and is fed only
//! by the identity provider's change notifications. `route` maps a session
//! snapshot to the view mode, `services::actions` is the facade the views
//! call, and `shell` is the terminal view layer. `identity`, `store` and
//! `news` wrap the external REST services behind traits so services can be
//! tested against in-memory implementations.

pub mod config;
pub mod error;
pub mod identity;
pub mod news;
pub mod route;
pub mod services;
pub mod shell;
pub mod state;
pub mod store;
#[cfg(test)]
pub mod test_helpers;
