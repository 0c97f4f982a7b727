//! In-memory identity provider for tests.
//!
//! Notifications are never sent implicitly: tests call [`MockIdentity::emit`]
//! to play the provider's role, so ordering between actions and
//! notifications is explicit in each test.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{
    AuthCallback, AuthChange, AuthObservers, AuthSubscription, Credential, Identity, IdentityProvider,
    ProfileUpdate, ProviderError,
};

type Hook = Box<dyn FnOnce() + Send>;

pub struct MockIdentity {
    observers: AuthObservers,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ProviderError>>,
    hooks: Mutex<HashMap<&'static str, Hook>>,
    reauth_credentials: Mutex<Vec<Credential>>,
}

impl MockIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: AuthObservers::new(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            hooks: Mutex::new(HashMap::new()),
            reauth_credentials: Mutex::new(Vec::new()),
        }
    }

    /// Play a provider notification to every subscriber.
    pub fn emit(&self, change: AuthChange) {
        self.observers.notify(&change);
    }

    /// Make the next call to `method` fail with `err`.
    pub fn fail_next(&self, method: &'static str, err: ProviderError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, err);
    }

    /// Run `hook` inside the next call to `method`, before it returns.
    pub fn on_next(&self, method: &'static str, hook: impl FnOnce() + Send + 'static) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, Box::new(hook));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn reauth_credentials(&self) -> Vec<Credential> {
        self.reauth_credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn record(&self, method: &'static str) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method.to_string());
        let hook = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(method);
        if let Some(hook) = hook {
            hook();
        }
        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(method)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentity {
    fn subscribe(&self, callback: AuthCallback) -> AuthSubscription {
        self.observers.register(callback)
    }

    async fn sign_in_with_password(&self, credential: &Credential) -> Result<Identity, ProviderError> {
        self.record("sign_in_with_password")?;
        Ok(Identity { email: Some(credential.email.clone()), ..Identity::with_uid("mock-uid") })
    }

    async fn sign_up(&self, credential: &Credential) -> Result<Identity, ProviderError> {
        self.record("sign_up")?;
        Ok(Identity { email: Some(credential.email.clone()), ..Identity::with_uid("mock-uid") })
    }

    async fn sign_in_with_google(&self, _id_token: &str) -> Result<Identity, ProviderError> {
        self.record("sign_in_with_google")?;
        Ok(Identity::with_uid("mock-google-uid"))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.record("sign_out")
    }

    async fn update_profile(&self, _identity: &Identity, _update: &ProfileUpdate) -> Result<(), ProviderError> {
        self.record("update_profile")
    }

    async fn reauthenticate(&self, _identity: &Identity, credential: &Credential) -> Result<(), ProviderError> {
        self.reauth_credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(credential.clone());
        self.record("reauthenticate")
    }

    async fn delete_account(&self, _identity: &Identity) -> Result<(), ProviderError> {
        self.record("delete_account")
    }
}
