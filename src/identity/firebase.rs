//! Firebase Authentication REST client.
//!
//! Thin HTTP wrapper for the Identity Toolkit `accounts:*` endpoints and the
//! Secure Token `token` endpoint. The client holds the signed-in user and its
//! tokens, and notifies observers when the signed-in user changes. Pure
//! parsing lives in the `parse_*` functions for testability.
//!
//! ID tokens live for about an hour. `fresh_id_token` refreshes a token that
//! is within [`REFRESH_MARGIN`] of expiry, and token-bearing calls retry once
//! after a refresh when the provider reports the token expired. A refresh the
//! provider rejects ends the session and notifies observers with `Ok(None)`.
//!
//! Profile edits refresh the held user but do not notify observers. Callers
//! that need the edit reflected immediately must merge it locally.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{
    AuthCallback, AuthObservers, AuthSubscription, Credential, Identity, IdentityProvider, ProfileUpdate,
    ProviderError,
};
use crate::config::{FirebaseConfig, HttpTimeouts};

const GOOGLE_PROVIDER_ID: &str = "google.com";
const IDP_REQUEST_URI: &str = "http://localhost";

/// Lifetime assumed when a grant omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Tokens closer than this to expiry are refreshed before use.
pub const REFRESH_MARGIN: time::Duration = time::Duration::minutes(5);

/// Rejections meaning the ID token itself is no longer accepted.
const EXPIRED_TOKEN_CODES: &[&str] = &["TOKEN_EXPIRED", "INVALID_ID_TOKEN"];

// =============================================================================
// CLIENT
// =============================================================================

struct SignedInUser {
    identity: Identity,
    id_token: String,
    refresh_token: String,
    expires_at: OffsetDateTime,
}

pub struct FirebaseAuth {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    secure_token_base_url: String,
    current: Mutex<Option<SignedInUser>>,
    /// Serializes refreshes so concurrent callers share one exchange.
    refresh_lock: tokio::sync::Mutex<()>,
    observers: AuthObservers,
}

impl FirebaseAuth {
    /// Build a client from the Firebase section of the app config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &FirebaseConfig, timeouts: HttpTimeouts) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ProviderError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.identity_base_url.clone(),
            secure_token_base_url: config.secure_token_base_url.clone(),
            current: Mutex::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
            observers: AuthObservers::new(),
        })
    }

    /// Stored ID token of the signed-in user, possibly expired.
    #[must_use]
    pub fn id_token(&self) -> Option<String> {
        self.lock_current().as_ref().map(|u| u.id_token.clone())
    }

    /// Refresh token of the signed-in user.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.lock_current().as_ref().map(|u| u.refresh_token.clone())
    }

    /// Snapshot of the signed-in user.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.lock_current().as_ref().map(|u| u.identity.clone())
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<SignedInUser>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ID token of the signed-in user, refreshed first when near expiry.
    ///
    /// # Errors
    ///
    /// `NoCurrentUser` when signed out; otherwise the refresh error. A
    /// rejected refresh also signs the user out.
    pub async fn fresh_id_token(&self) -> Result<String, ProviderError> {
        let (token, expires_at) = self
            .lock_current()
            .as_ref()
            .map(|u| (u.id_token.clone(), u.expires_at))
            .ok_or(ProviderError::NoCurrentUser)?;
        if expires_at - OffsetDateTime::now_utc() > REFRESH_MARGIN {
            return Ok(token);
        }
        self.refresh(&token).await
    }

    /// Exchange the refresh token for a new ID token replacing `stale`.
    ///
    /// Returns the current token without a request when another caller
    /// already replaced `stale`.
    ///
    /// # Errors
    ///
    /// `NoCurrentUser` when signed out; otherwise the provider error. A
    /// rejection signs the user out before returning.
    pub async fn refresh(&self, stale: &str) -> Result<String, ProviderError> {
        let _serialized = self.refresh_lock.lock().await;
        let (uid, refresh_token) = {
            let current = self.lock_current();
            let user = current.as_ref().ok_or(ProviderError::NoCurrentUser)?;
            if user.id_token != stale {
                return Ok(user.id_token.clone());
            }
            (user.identity.uid.clone(), user.refresh_token.clone())
        };

        let url = format!("{}/token", self.secure_token_base_url);
        let body = serde_json::json!({ "grant_type": "refresh_token", "refresh_token": refresh_token });
        let grant = match self
            .post(&url, &body)
            .await
            .and_then(|text| parse_refresh_response(&text))
        {
            Ok(grant) => grant,
            Err(e) if ends_session(&e) => {
                warn!(%uid, error = %e, "firebase: token refresh rejected; signing out");
                self.clear();
                return Err(e);
            }
            Err(e) => {
                warn!(%uid, error = %e, "firebase: token refresh failed");
                return Err(e);
            }
        };

        let id_token = grant.id_token.clone();
        if !self.store_grant(grant) {
            return Err(ProviderError::NoCurrentUser);
        }
        debug!(%uid, "firebase: token refreshed");
        Ok(id_token)
    }

    /// Replace the tokens of the signed-in user the grant was issued to.
    fn store_grant(&self, grant: TokenGrant) -> bool {
        let expires_at = grant.expires_at(OffsetDateTime::now_utc());
        match self.lock_current().as_mut() {
            Some(user) if user.identity.uid == grant.local_id => {
                user.id_token = grant.id_token;
                if !grant.refresh_token.is_empty() {
                    user.refresh_token = grant.refresh_token;
                }
                user.expires_at = expires_at;
                true
            }
            _ => false,
        }
    }

    /// Fresh token of the signed-in user, checked against the identity the caller holds.
    async fn token_for(&self, identity: &Identity) -> Result<String, ProviderError> {
        let matches = self
            .lock_current()
            .as_ref()
            .is_some_and(|user| user.identity.uid == identity.uid);
        if !matches {
            return Err(ProviderError::NoCurrentUser);
        }
        self.fresh_id_token().await
    }

    /// Token-bearing `accounts:*` call, retried once after a refresh when
    /// the provider reports the token expired.
    async fn authed_call<F>(&self, identity: &Identity, method: &str, body: F) -> Result<String, ProviderError>
    where
        F: Fn(&str) -> serde_json::Value + Send + Sync,
    {
        let token = self.token_for(identity).await?;
        match self.call(method, &body(&token)).await {
            Err(e) if is_expired_token(&e) => {
                debug!(uid = %identity.uid, method, "firebase: token expired mid-call; refreshing");
                let token = self.refresh(&token).await?;
                self.call(method, &body(&token)).await
            }
            other => other,
        }
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<String, ProviderError> {
        let url = format!("{}/accounts:{method}", self.base_url);
        self.post(&url, body)
            .await
            .inspect_err(|err| debug!(method, error = %err, "firebase: call rejected"))
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(parse_error_body(status, &text));
        }
        Ok(text)
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, ProviderError> {
        let body = self
            .call("lookup", &serde_json::json!({ "idToken": id_token }))
            .await?;
        parse_lookup_response(&body)
    }

    /// Complete a sign-in: fetch the full profile, store the session, notify.
    async fn establish(&self, grant: TokenGrant) -> Result<Identity, ProviderError> {
        let identity = self.lookup(&grant.id_token).await?;
        if identity.uid != grant.local_id {
            return Err(ProviderError::Parse(format!(
                "lookup returned uid {} for token issued to {}",
                identity.uid, grant.local_id
            )));
        }
        let expires_at = grant.expires_at(OffsetDateTime::now_utc());
        *self.lock_current() = Some(SignedInUser {
            identity: identity.clone(),
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
            expires_at,
        });
        info!(uid = %identity.uid, "firebase: signed in");
        self.observers.notify(&Ok(Some(identity.clone())));
        Ok(identity)
    }

    fn clear(&self) {
        let previous = self.lock_current().take();
        if let Some(user) = previous {
            info!(uid = %user.identity.uid, "firebase: signed out");
            self.observers.notify(&Ok(None));
        }
    }
}

fn is_expired_token(err: &ProviderError) -> bool {
    err.code().is_some_and(|code| EXPIRED_TOKEN_CODES.contains(&code))
}

/// A refresh failure that invalidates the session. Transport errors, rate
/// limits and gateway failures leave the session in place.
fn ends_session(err: &ProviderError) -> bool {
    match err {
        ProviderError::Rejected { code, .. } => {
            code != "TOO_MANY_ATTEMPTS_TRY_LATER" && !code.starts_with("HTTP_5")
        }
        _ => false,
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseAuth {
    fn subscribe(&self, callback: AuthCallback) -> AuthSubscription {
        self.observers.register(callback)
    }

    async fn sign_in_with_password(&self, credential: &Credential) -> Result<Identity, ProviderError> {
        let body = self
            .call("signInWithPassword", &password_body(credential))
            .await?;
        self.establish(parse_token_response(&body)?).await
    }

    async fn sign_up(&self, credential: &Credential) -> Result<Identity, ProviderError> {
        let body = self.call("signUp", &password_body(credential)).await?;
        self.establish(parse_token_response(&body)?).await
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<Identity, ProviderError> {
        let request = serde_json::json!({
            "postBody": format!("id_token={id_token}&providerId={GOOGLE_PROVIDER_ID}"),
            "requestUri": IDP_REQUEST_URI,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        let body = self.call("signInWithIdp", &request).await?;
        self.establish(parse_token_response(&body)?).await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.clear();
        Ok(())
    }

    async fn update_profile(&self, identity: &Identity, update: &ProfileUpdate) -> Result<(), ProviderError> {
        let body = self
            .authed_call(identity, "update", |id_token| {
                let mut request = serde_json::json!({ "idToken": id_token, "returnSecureToken": false });
                if let Some(name) = &update.display_name {
                    request["displayName"] = serde_json::json!(name);
                }
                if let Some(url) = &update.photo_url {
                    request["photoUrl"] = serde_json::json!(url);
                }
                request
            })
            .await?;
        let updated = parse_update_response(&body)?;

        if let Some(user) = self.lock_current().as_mut() {
            if user.identity.uid == updated.local_id {
                updated.apply_to(&mut user.identity);
            }
        }
        Ok(())
    }

    async fn reauthenticate(&self, identity: &Identity, credential: &Credential) -> Result<(), ProviderError> {
        let body = self
            .call("signInWithPassword", &password_body(credential))
            .await?;
        let grant = parse_token_response(&body)?;
        if grant.local_id != identity.uid {
            return Err(ProviderError::Rejected {
                code: "USER_MISMATCH".into(),
                message: "credential belongs to a different user".into(),
            });
        }
        self.store_grant(grant);
        Ok(())
    }

    async fn delete_account(&self, identity: &Identity) -> Result<(), ProviderError> {
        self.authed_call(identity, "delete", |id_token| serde_json::json!({ "idToken": id_token }))
            .await?;
        info!(uid = %identity.uid, "firebase: account deleted");
        self.clear();
        Ok(())
    }
}

fn password_body(credential: &Credential) -> serde_json::Value {
    serde_json::json!({
        "email": credential.email,
        "password": credential.password,
        "returnSecureToken": true,
    })
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenGrant {
    local_id: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Token lifetime in seconds, encoded as a string.
    #[serde(default)]
    expires_in: Option<String>,
}

impl TokenGrant {
    fn expires_at(&self, issued_at: OffsetDateTime) -> OffsetDateTime {
        let secs = self
            .expires_in
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        issued_at + time::Duration::seconds(secs)
    }
}

/// Secure Token response; field names are snake_case unlike `accounts:*`.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    /// Milliseconds since the Unix epoch, encoded as a string.
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl UpdateResponse {
    fn apply_to(self, identity: &mut Identity) {
        if self.display_name.is_some() {
            identity.display_name = self.display_name;
        }
        if self.photo_url.is_some() {
            identity.photo_url = self.photo_url;
        }
        if self.email.is_some() {
            identity.email = self.email;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_token_response(json: &str) -> Result<TokenGrant, ProviderError> {
    serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))
}

fn parse_refresh_response(json: &str) -> Result<TokenGrant, ProviderError> {
    let resp: RefreshResponse = serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(TokenGrant {
        local_id: resp.user_id,
        id_token: resp.id_token,
        refresh_token: resp.refresh_token,
        expires_in: resp.expires_in,
    })
}

fn parse_lookup_response(json: &str) -> Result<Identity, ProviderError> {
    let resp: LookupResponse = serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let user = resp
        .users
        .into_iter()
        .next()
        .ok_or(ProviderError::NoCurrentUser)?;

    Ok(Identity {
        uid: user.local_id,
        display_name: user.display_name.filter(|n| !n.is_empty()),
        email: user.email,
        photo_url: user.photo_url.filter(|u| !u.is_empty()),
        created_at: user.created_at.as_deref().and_then(parse_epoch_millis),
    })
}

fn parse_update_response(json: &str) -> Result<UpdateResponse, ProviderError> {
    serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))
}

fn parse_epoch_millis(raw: &str) -> Option<OffsetDateTime> {
    let millis: i128 = raw.trim().parse().ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000).ok()
}

/// Map an error body to a rejection.
///
/// Firebase encodes the code and an optional detail in one string:
/// `"WEAK_PASSWORD : Password should be at least 6 characters"`.
fn parse_error_body(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let raw = envelope.error.message;
            match raw.split_once(" : ") {
                Some((code, detail)) => {
                    ProviderError::Rejected { code: code.trim().to_string(), message: detail.trim().to_string() }
                }
                None => ProviderError::Rejected { code: raw.trim().to_string(), message: String::new() },
            }
        }
        Err(_) => ProviderError::Rejected { code: format!("HTTP_{status}"), message: body.to_string() },
    }
}

#[cfg(test)]
#[path = "firebase_test.rs"]
mod tests;
