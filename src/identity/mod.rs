//! Identity provider seam.
//!
//! DESIGN
//! ======
//! The session store and action facade only talk to the provider through the
//! [`IdentityProvider`] trait, so tests can substitute an in-memory provider.
//! `FirebaseAuth` is the production implementation over the Firebase REST API.
//!
//! Change notifications are delivered through observer callbacks registered
//! with [`IdentityProvider::subscribe`]. The returned [`AuthSubscription`]
//! unregisters its callback when dropped.

pub mod firebase;
mod observers;
#[cfg(test)]
pub mod test_helpers;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use observers::{AuthObservers, AuthSubscription};

// =============================================================================
// IDENTITY
// =============================================================================

/// The authenticated user's profile record as known to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Identity {
    /// A bare identity with only a uid. Used by tests and placeholder views.
    #[must_use]
    pub fn with_uid(uid: impl Into<String>) -> Self {
        Self { uid: uid.into(), display_name: None, email: None, photo_url: None, created_at: None }
    }
}

/// Email/password credential used for sign-in and re-authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    #[must_use]
    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial profile edit. `None` fields are left untouched by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

// =============================================================================
// ERROR
// =============================================================================

/// Provider-side failures. Rejections keep the provider's code verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request never produced a response.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider answered with an error code.
    #[error("provider rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The provider response body could not be deserialized.
    #[error("provider response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The provider holds no signed-in user for an operation that needs one.
    #[error("provider has no signed-in user")]
    NoCurrentUser,
}

/// Rejection codes that mean "these credentials are wrong".
const CREDENTIAL_CODES: &[&str] = &[
    "INVALID_PASSWORD",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_CREDENTIAL",
    "EMAIL_NOT_FOUND",
    "MISSING_PASSWORD",
    "USER_MISMATCH",
];

impl ProviderError {
    /// Provider error code, if the provider supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// `true` when the provider rejected the supplied credentials.
    #[must_use]
    pub fn is_credential_rejection(&self) -> bool {
        self.code().is_some_and(|code| CREDENTIAL_CODES.contains(&code))
    }
}

impl crate::error::ErrorCode for ProviderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_PROVIDER_REQUEST",
            Self::Rejected { .. } => "E_PROVIDER_REJECTED",
            Self::Parse(_) => "E_PROVIDER_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::NoCurrentUser => "E_PROVIDER_NO_USER",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_))
            || self.code().is_some_and(|code| code == "TOO_MANY_ATTEMPTS_TRY_LATER")
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// One auth-state notification: the current identity, absence, or a provider fault.
pub type AuthChange = Result<Option<Identity>, ProviderError>;

/// Observer callback registered with [`IdentityProvider::subscribe`].
pub type AuthCallback = Arc<dyn Fn(AuthChange) + Send + Sync>;

/// Provider-neutral async identity contract. Enables mocking in tests.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register an auth-state observer.
    ///
    /// The callback receives the current state once on registration and then
    /// every change, until the returned handle is dropped.
    fn subscribe(&self, callback: AuthCallback) -> AuthSubscription;

    async fn sign_in_with_password(&self, credential: &Credential) -> Result<Identity, ProviderError>;

    async fn sign_up(&self, credential: &Credential) -> Result<Identity, ProviderError>;

    /// Exchange a Google OAuth ID token for a provider session.
    async fn sign_in_with_google(&self, id_token: &str) -> Result<Identity, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Apply a profile edit. Providers are not required to notify observers.
    async fn update_profile(&self, identity: &Identity, update: &ProfileUpdate) -> Result<(), ProviderError>;

    async fn reauthenticate(&self, identity: &Identity, credential: &Credential) -> Result<(), ProviderError>;

    async fn delete_account(&self, identity: &Identity) -> Result<(), ProviderError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
