//! Unified error handling for auractl-core
//!
//! Every layer below the command boundary reports failures through
//! [`CoreError`]. Errors pass through unchanged; the only place a failure is
//! acted upon instead of propagated is the single 401 retry in
//! [`ApiClient::request`](crate::ApiClient::request).
//!
//! # Example
//!
//! ```rust
//! use auractl_core::{ApiErrorDetail, CoreError};
//!
//! let err = CoreError::Api {
//!     status: 400,
//!     errors: vec![ApiErrorDetail {
//!         message: "You must provide billing details".to_string(),
//!         reason: "missing-billing-details".to_string(),
//!         field: None,
//!     }],
//!     body: String::new(),
//! };
//! assert!(err.is_bad_request());
//! assert!(err.to_string().contains("billing details"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::credentials::CredentialError;

/// One entry of the management API's structured error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// `{"errors": [...]}` as returned on 4xx/5xx.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorPayload {
    pub errors: Vec<ApiErrorDetail>,
}

/// Core error type for credentials, token management, requests and polling
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid or missing credentials, unreachable auth endpoint, or a
    /// request that was still rejected after one forced token refresh
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Structured (or unstructured) 4xx/5xx from the management API
    #[error("{}", describe_api_error(.status, .errors, .body))]
    Api {
        status: u16,
        errors: Vec<ApiErrorDetail>,
        body: String,
    },

    /// Connection, DNS or timeout failure talking to the management API
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be set up, before any request was sent
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A 2xx response whose body did not have the expected shape
    #[error("Unexpected response from {path}: {message}")]
    UnexpectedResponse { path: String, message: String },

    /// Request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// HTTP status of an API error, if this is one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is a bad request error (400)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }

    /// Returns true if this is an authentication failure
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, CoreError::Auth(_))
    }

    /// Returns true if this is a connection/DNS/timeout failure
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Transport { .. })
    }

    /// Structured error entries of an API error; empty for anything else
    #[must_use]
    pub fn api_errors(&self) -> &[ApiErrorDetail] {
        match self {
            CoreError::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn describe_api_error(status: &u16, errors: &[ApiErrorDetail], body: &str) -> String {
    if errors.is_empty() {
        let body = body.trim();
        if body.is_empty() {
            return format!("API error (HTTP {status})");
        }
        return format!("API error (HTTP {status}): {body}");
    }

    let messages: Vec<String> = errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{} (field: {})", e.message, field),
            None => e.message.clone(),
        })
        .collect();
    format!("API error (HTTP {status}): {}", messages.join("; "))
}
