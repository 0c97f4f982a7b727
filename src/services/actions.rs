//! Action facade: session-mutating operations for the view layer.
//!
//! Every operation returns `Result<_, SessionError>`. Sign-in, sign-out and
//! account deletion never write the session directly; the provider's
//! notification does. The display-name edit is the one exception because
//! the provider does not notify for profile edits.

use std::sync::Arc;

use tracing::{info, warn};

use super::session::{SessionError, SessionStore};
use crate::identity::{Credential, Identity, ProfileUpdate};

const MISSING_LOGIN_FIELDS: &str = "Please enter both email and password";

#[derive(Clone)]
pub struct SessionActions {
    store: Arc<SessionStore>,
}

impl SessionActions {
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    fn current_identity(&self) -> Result<Identity, SessionError> {
        self.store
            .snapshot()
            .identity
            .ok_or(SessionError::NoActiveSession)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// `Validation` when either field is blank, `Provider` on rejection.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let credential = login_credential(email, password)?;
        let identity = self
            .store
            .provider()
            .sign_in_with_password(&credential)
            .await
            .inspect_err(|e| warn!(error = %e, "actions: sign-in failed"))?;
        info!(uid = %identity.uid, "actions: signed in");
        Ok(identity)
    }

    /// Create an account with email and password.
    ///
    /// # Errors
    ///
    /// `Validation` when either field is blank, `Provider` on rejection.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let credential = login_credential(email, password)?;
        let identity = self
            .store
            .provider()
            .sign_up(&credential)
            .await
            .inspect_err(|e| warn!(error = %e, "actions: sign-up failed"))?;
        info!(uid = %identity.uid, "actions: account created");
        Ok(identity)
    }

    /// Sign in with a Google OAuth ID token.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank token, `Provider` on rejection.
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<Identity, SessionError> {
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Err(SessionError::Validation("Google ID token is required".into()));
        }
        let identity = self
            .store
            .provider()
            .sign_in_with_google(id_token)
            .await
            .inspect_err(|e| warn!(error = %e, "actions: google sign-in failed"))?;
        info!(uid = %identity.uid, "actions: signed in with google");
        Ok(identity)
    }

    /// Ask the provider to sign out. The session clears on its next notification.
    ///
    /// # Errors
    ///
    /// `Provider` when the provider call fails.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.store
            .provider()
            .sign_out()
            .await
            .inspect_err(|e| warn!(error = %e, "actions: sign-out failed"))?;
        info!("actions: sign-out requested");
        Ok(())
    }

    /// Rename the signed-in user and merge the name into the session at once.
    ///
    /// # Errors
    ///
    /// `NoActiveSession` when signed out, `Validation` for a blank name,
    /// `Provider` when the profile update fails.
    pub async fn update_display_name(&self, new_name: &str) -> Result<(), SessionError> {
        let identity = self.current_identity()?;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(SessionError::Validation("Display name cannot be empty".into()));
        }

        let update = ProfileUpdate { display_name: Some(new_name.to_string()), photo_url: None };
        self.store
            .provider()
            .update_profile(&identity, &update)
            .await
            .inspect_err(|e| warn!(uid = %identity.uid, error = %e, "actions: profile update failed"))?;

        if self.store.merge_display_name(&identity.uid, new_name) {
            info!(uid = %identity.uid, "actions: display name updated");
        } else {
            warn!(uid = %identity.uid, "actions: session changed during profile update; merge dropped");
        }
        Ok(())
    }

    /// Re-authenticate with `password`, then delete the signed-in account.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty password (checked before anything else),
    /// `NoActiveSession` when signed out, `InvalidCredential` when
    /// re-authentication is rejected, `Provider` for any other failure.
    pub async fn delete_account(&self, password: &str) -> Result<(), SessionError> {
        if password.is_empty() {
            return Err(SessionError::Validation("Password is required to delete the account".into()));
        }
        let identity = self.current_identity()?;
        let email = identity
            .email
            .clone()
            .ok_or_else(|| SessionError::Validation("Account has no email to re-authenticate with".into()))?;

        let credential = Credential::email_password(email, password);
        let provider = self.store.provider();
        if let Err(e) = provider.reauthenticate(&identity, &credential).await {
            warn!(uid = %identity.uid, error = %e, "actions: re-authentication failed");
            return Err(if e.is_credential_rejection() {
                SessionError::InvalidCredential { code: e.code().unwrap_or_default().to_string() }
            } else {
                SessionError::Provider(e)
            });
        }

        provider
            .delete_account(&identity)
            .await
            .inspect_err(|e| warn!(uid = %identity.uid, error = %e, "actions: account deletion failed"))?;
        info!(uid = %identity.uid, "actions: account deleted");
        Ok(())
    }
}

fn login_credential(email: &str, password: &str) -> Result<Credential, SessionError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(SessionError::Validation(MISSING_LOGIN_FIELDS.into()));
    }
    Ok(Credential::email_password(email, password))
}

/// Display string for a failed sign-in, keyed on the provider's code.
#[must_use]
pub fn login_error_message(err: &SessionError) -> String {
    match err {
        SessionError::Validation(msg) => msg.clone(),
        SessionError::Provider(e) => match e.code() {
            Some("INVALID_LOGIN_CREDENTIALS" | "INVALID_CREDENTIAL") => "Incorrect email or password".into(),
            Some("INVALID_EMAIL") => "Invalid email address".into(),
            Some("USER_DISABLED") => "This account has been disabled".into(),
            Some("EMAIL_NOT_FOUND") => "No account found with this email".into(),
            Some("INVALID_PASSWORD") => "Incorrect password".into(),
            _ => "Login failed. Please try again.".into(),
        },
        _ => "Login failed. Please try again.".into(),
    }
}

#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;
