//! Session store: the single owner of the local sign-in state.
//!
//! ARCHITECTURE
//! ============
//! `initialize` registers exactly one observer with the identity provider.
//! Every notification replaces the whole identity record and clears the
//! loading flag, so the flag is only ever true before the first
//! notification. The subscription handle lives inside the store and is
//! released when the store is dropped or shut down.
//!
//! State is published through a `tokio::sync::watch` channel. Writes are
//! serialized by the sender, readers get owned snapshots, and views can
//! await changes instead of polling.
//!
//! RECONCILIATION
//! ==============
//! Provider notifications are authoritative and always overwrite. The only
//! local write is the display-name merge after a successful profile edit,
//! which applies only while the snapshot still holds the uid the edit was
//! issued for. A sign-out or account switch that lands while the edit is in
//! flight therefore wins.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::identity::{AuthCallback, AuthChange, AuthSubscription, IdentityProvider, ProviderError};
use crate::route::{Mode, compute_mode};
use crate::state::Session;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `initialize` was called on a store that already subscribed.
    #[error("session store already initialized")]
    AlreadyInitialized,

    /// The action needs a signed-in identity and there is none.
    #[error("no signed-in user")]
    NoActiveSession,

    /// Re-authentication was rejected by the provider.
    #[error("re-authentication rejected ({code})")]
    InvalidCredential { code: String },

    /// Input rejected before any provider call.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "E_ALREADY_INITIALIZED",
            Self::NoActiveSession => "E_NO_ACTIVE_SESSION",
            Self::InvalidCredential { .. } => "E_INVALID_CREDENTIAL",
            Self::Validation(_) => "E_VALIDATION",
            Self::Provider(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

enum Lifecycle {
    Uninitialized,
    Subscribed(AuthSubscription),
    Closed,
}

pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<Session>>,
    lifecycle: Mutex<Lifecycle>,
}

impl SessionStore {
    /// Create a store in the loading state. Nothing is subscribed until
    /// [`SessionStore::initialize`].
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { provider, state: Arc::new(state), lifecycle: Mutex::new(Lifecycle::Uninitialized) }
    }

    /// Subscribe to the provider's auth-state notifications.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyInitialized`] on any call after the first.
    pub fn initialize(&self) -> Result<(), SessionError> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*lifecycle, Lifecycle::Uninitialized) {
            return Err(SessionError::AlreadyInitialized);
        }

        let state = Arc::clone(&self.state);
        let callback: AuthCallback = Arc::new(move |change| apply_change(&state, change));
        *lifecycle = Lifecycle::Subscribed(self.provider.subscribe(callback));
        info!("session: subscribed to auth changes");
        Ok(())
    }

    /// Release the provider subscription. The last published state stays readable.
    pub fn shutdown(&self) {
        let previous = std::mem::replace(
            &mut *self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner),
            Lifecycle::Closed,
        );
        if let Lifecycle::Subscribed(subscription) = previous {
            subscription.unsubscribe();
            info!("session: unsubscribed from auth changes");
        }
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        matches!(
            *self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner),
            Lifecycle::Subscribed(_)
        )
    }

    /// Owned copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Route gate applied to the current session.
    #[must_use]
    pub fn mode(&self) -> Mode {
        compute_mode(&self.state.borrow())
    }

    /// Change stream of session snapshots.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Wait for the first provider notification and return the session it produced.
    pub async fn ready(&self) -> Session {
        let mut rx = self.watch();
        match rx.wait_for(|s| !s.loading).await {
            Ok(session) => session.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.snapshot(),
        }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Merge a confirmed display-name edit into the snapshot.
    ///
    /// Returns `false` when the identity was cleared or replaced meanwhile.
    pub(crate) fn merge_display_name(&self, uid: &str, display_name: &str) -> bool {
        let mut merged = false;
        self.state.send_if_modified(|session| match session.identity.as_mut() {
            Some(identity) if identity.uid == uid => {
                identity.display_name = Some(display_name.to_string());
                merged = true;
                true
            }
            _ => false,
        });
        merged
    }
}

fn apply_change(state: &watch::Sender<Session>, change: AuthChange) {
    let identity = match change {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "session: auth notification failed; treating as signed out");
            None
        }
    };
    match &identity {
        Some(identity) => debug!(uid = %identity.uid, "session: identity notification"),
        None => debug!("session: signed-out notification"),
    }
    state.send_modify(|session| {
        session.identity = identity;
        session.loading = false;
    });
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
