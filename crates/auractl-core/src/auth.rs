//! OAuth2 client-credentials token management
//!
//! [`TokenManager`] hands out a bearer token for one named credential. A
//! cached token is reused while it outlives the expiry margin; otherwise a
//! fresh one is obtained from the auth endpoint and written back to the
//! [`CredentialStore`].

use chrono::{TimeDelta, Utc};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::credentials::{CachedToken, CredentialError, CredentialStore};
use crate::error::{CoreError, Result};

/// Tokens expiring within this many seconds are treated as expired
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the grant response omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Serialize)]
struct GrantRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct GrantResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Obtains and refreshes bearer tokens for a single credential
#[derive(Debug, Clone)]
pub struct TokenManager {
    store: CredentialStore,
    credential_name: String,
    auth_url: String,
    http: Client,
    margin: TimeDelta,
}

impl TokenManager {
    pub fn new(
        store: CredentialStore,
        credential_name: impl Into<String>,
        auth_url: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            store,
            credential_name: credential_name.into(),
            auth_url: auth_url.into(),
            http,
            margin: TimeDelta::seconds(TOKEN_EXPIRY_MARGIN_SECS),
        }
    }

    /// Override the expiry safety margin
    pub fn with_margin(mut self, margin: TimeDelta) -> Self {
        self.margin = margin;
        self
    }

    pub fn credential_name(&self) -> &str {
        &self.credential_name
    }

    /// Return a token that is valid beyond the safety margin.
    ///
    /// Makes no network call when the cached token is still good.
    pub fn get_valid_token(&self) -> Result<String> {
        let credentials = self.store.load()?;
        let credential = credentials
            .get(&self.credential_name)
            .ok_or_else(|| self.missing_credential())?;

        if let Some(token) = &credential.token
            && token.is_valid_at(Utc::now(), self.margin)
        {
            trace!(
                "Using cached token for '{}' (expires {})",
                self.credential_name, token.expires_at
            );
            return Ok(token.access_token.clone());
        }

        debug!("Token for '{}' missing or expiring, refreshing", self.credential_name);
        self.refresh()
    }

    /// Obtain a new token regardless of the cached one
    pub fn force_refresh(&self) -> Result<String> {
        debug!("Forcing token refresh for '{}'", self.credential_name);
        self.refresh()
    }

    fn refresh(&self) -> Result<String> {
        let credentials = self.store.load()?;
        let credential = credentials
            .get(&self.credential_name)
            .ok_or_else(|| self.missing_credential())?;

        let token = self.request_token(&credential.client_id, &credential.client_secret)?;
        let access_token = token.access_token.clone();
        self.store.store_token(&self.credential_name, token)?;
        Ok(access_token)
    }

    fn request_token(&self, client_id: &str, client_secret: &str) -> Result<CachedToken> {
        let form = serde_urlencoded::to_string(GrantRequest {
            grant_type: "client_credentials",
            client_id,
            client_secret,
        })
        .map_err(|e| CoreError::Auth(format!("could not encode token request: {e}")))?;

        debug!("Requesting token from {}", self.auth_url);
        let requested_at = Utc::now();
        let response = self
            .http
            .post(&self.auth_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .map_err(|e| CoreError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CoreError::Auth(format!("failed to read token response: {e}")))?;

        if !status.is_success() {
            return Err(CoreError::Auth(format!(
                "token request rejected with HTTP {}{}",
                status.as_u16(),
                grant_error_suffix(&body)
            )));
        }

        let grant: GrantResponse = serde_json::from_str(&body)
            .map_err(|e| CoreError::Auth(format!("malformed token response: {e}")))?;
        if grant.access_token.is_empty() {
            return Err(CoreError::Auth(
                "token response did not contain an access token".to_string(),
            ));
        }
        if let Some(kind) = &grant.token_type
            && !kind.eq_ignore_ascii_case("bearer")
        {
            debug!("Token endpoint returned token_type '{}'", kind);
        }

        let expires_in = grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = TimeDelta::try_seconds(expires_in)
            .filter(|_| expires_in > 0)
            .and_then(|lifetime| requested_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                CoreError::Auth("token response has an invalid expires_in".to_string())
            })?;
        debug!("Obtained token valid for {}s", expires_in);
        Ok(CachedToken {
            access_token: grant.access_token,
            expires_at,
        })
    }

    fn missing_credential(&self) -> CoreError {
        CoreError::Credentials(CredentialError::NotFound {
            name: self.credential_name.clone(),
        })
    }
}

/// OAuth error bodies look like `{"error": "...", "error_description": "..."}`
fn grant_error_suffix(body: &str) -> String {
    #[derive(Deserialize)]
    struct OAuthError {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    }

    match serde_json::from_str::<OAuthError>(body) {
        Ok(OAuthError {
            error,
            error_description: Some(description),
        }) => format!(": {error} ({description})"),
        Ok(OAuthError { error, .. }) => format!(": {error}"),
        Err(_) => String::new(),
    }
}
