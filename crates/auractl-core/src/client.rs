//! Authenticated JSON client for the management API

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::auth::TokenManager;
use crate::error::{ApiErrorPayload, CoreError, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("auractl/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful (2xx) response: status and raw body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Deserialize the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Body as a JSON value; an empty body (e.g. 202/204) becomes `null`
    pub fn json_value(&self) -> serde_json::Result<serde_json::Value> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&self.body)
    }
}

/// Sends bearer-authenticated requests relative to the API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    tokens: TokenManager,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenManager, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            tokens,
        }
    }

    /// Blocking HTTP client with the auractl user agent and request timeout
    pub fn build_http_client() -> Result<Client> {
        http_client_with_agent(USER_AGENT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Send a request, refreshing the token and retrying once on a 401.
    ///
    /// A second 401 is reported as [`CoreError::Auth`]. Other non-2xx
    /// responses become [`CoreError::Api`] and are never retried.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        let payload = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(CoreError::Serialize)?;
        if let Some(payload) = &payload {
            trace!("Request body: {}", payload);
        }

        let token = self.tokens.get_valid_token()?;
        let response = self.send(&method, &url, payload.as_deref(), &token)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return finish(path, response);
        }

        debug!("{} {} returned 401, refreshing token and retrying", method, url);
        let token = self.tokens.force_refresh()?;
        let response = self.send(&method, &url, payload.as_deref(), &token)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("{} {} still unauthorized after token refresh", method, url);
            return Err(CoreError::Auth(
                "request unauthorized after refreshing the access token".to_string(),
            ));
        }
        finish(path, response)
    }

    pub fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request::<()>(Method::GET, path, None)
    }

    pub fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.request(Method::POST, path, Some(body))
    }

    pub fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.request(Method::PATCH, path, Some(body))
    }

    pub fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request::<()>(Method::DELETE, path, None)
    }

    /// GET and deserialize the body
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path)?;
        response.json().map_err(|e| CoreError::UnexpectedResponse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn send(
        &self,
        method: &Method,
        url: &str,
        payload: Option<&str>,
        token: &str,
    ) -> Result<reqwest::blocking::Response> {
        debug!("{} {}", method, url);
        let mut builder: RequestBuilder = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json");
        if let Some(payload) = payload {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload.to_string());
        }

        let response = builder.send().map_err(|e| CoreError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        debug!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn finish(path: &str, response: reqwest::blocking::Response) -> Result<ApiResponse> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response
        .text()
        .map_err(|e| CoreError::Transport { url, source: e })?;
    trace!("Response body: {}", body);

    if status.is_success() {
        return Ok(ApiResponse { status, body });
    }

    let errors = serde_json::from_str::<ApiErrorPayload>(&body)
        .map(|p| p.errors)
        .unwrap_or_default();
    debug!("{} failed with HTTP {}", path, status.as_u16());
    Err(CoreError::Api {
        status: status.as_u16(),
        errors,
        body,
    })
}

fn http_client_with_agent(user_agent: &str) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(CoreError::HttpClient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;

    fn client(base_url: &str) -> ApiClient {
        let http = Client::new();
        let tokens = TokenManager::new(
            CredentialStore::new("/nonexistent/credentials.json"),
            "default",
            "http://localhost/oauth/token",
            http.clone(),
        );
        ApiClient::new(base_url, tokens, http)
    }

    #[test]
    fn test_client_build_failure_is_not_a_transport_error() {
        let err = http_client_with_agent("auractl\nbroken").unwrap_err();
        assert!(matches!(err, CoreError::HttpClient(_)));
        assert!(!err.is_transport());
        assert!(err.to_string().starts_with("Failed to build HTTP client: "));
    }

    #[test]
    fn test_url_joining() {
        let c = client("https://api.neo4j.io/v1/");
        assert_eq!(c.url("/instances"), "https://api.neo4j.io/v1/instances");
        assert_eq!(c.url("tenants/abc"), "https://api.neo4j.io/v1/tenants/abc");

        let c = client("https://api.neo4j.io/v1");
        assert_eq!(c.url("/instances/x"), "https://api.neo4j.io/v1/instances/x");
    }

    #[test]
    fn test_empty_body_is_null() {
        let response = ApiResponse {
            status: StatusCode::ACCEPTED,
            body: String::new(),
        };
        assert_eq!(response.json_value().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_user_agent_has_version() {
        assert!(USER_AGENT.starts_with("auractl/"));
    }
}
