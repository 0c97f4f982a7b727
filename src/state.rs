//! Shared session state.
//!
//! DESIGN
//! ======
//! `Session` is the value published by the session store. Readers always get
//! an owned copy, so `identity` and `loading` are observed together and never
//! as a half-applied write.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Local representation of the current sign-in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Option<Identity>,
    /// True only until the first provider notification arrives.
    pub loading: bool,
}

impl Session {
    /// State at store creation: no identity yet, waiting for the provider.
    #[must_use]
    pub fn loading() -> Self {
        Self { identity: None, loading: true }
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self { identity: Some(identity), loading: false }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { identity: None, loading: false }
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.uid.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::loading()
    }
}
