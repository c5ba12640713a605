//! # auractl-core
//!
//! The authenticated request layer and asynchronous-operation poller shared by
//! every `auractl` command.
//!
//! The pieces stack leaf-first:
//!
//! - [`credentials`] persists client identity and the cached bearer token.
//! - [`auth`] exchanges client credentials for a bearer token and keeps it fresh.
//! - [`client`] sends JSON requests with bearer auth and retries once on a 401.
//! - [`poller`] drives repeated status fetches until a resource settles.
//! - [`config`] holds the process-scoped settings read by all of the above.
//!
//! Everything here is synchronous: one command is one sequential flow on the
//! blocking HTTP client, and waits between poll attempts block the thread.
//!
//! ```rust,ignore
//! use auractl_core::{ApiClient, Config, CredentialStore, Poller, ResourceKind, TokenManager};
//!
//! let config = Config::load_from_dir(&dir)?;
//! let store = CredentialStore::in_dir(&dir);
//! let http = ApiClient::build_http_client()?;
//! let tokens = TokenManager::new(store, "default", &config.auth_url, http.clone());
//! let client = ApiClient::new(&config.base_url, tokens, http);
//!
//! let response = client.post("/instances/2f49c2b3/pause", &serde_json::json!({}))?;
//! let outcome = Poller::from_config(&config.polling).poll_resource(
//!     &client,
//!     ResourceKind::Instance,
//!     "2f49c2b3",
//!     "/instances/2f49c2b3",
//!     None,
//! )?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod poller;
pub mod resources;

pub use auth::{TOKEN_EXPIRY_MARGIN_SECS, TokenManager};
pub use client::{ApiClient, ApiResponse, USER_AGENT};
pub use config::{Config, ConfigError, ConfigOverrides, OutputMode, PollingConfig};
pub use credentials::{CachedToken, Credential, CredentialError, CredentialStore, Credentials};
pub use error::{ApiErrorDetail, CoreError, Result};
pub use poller::{
    PollCallback, PollEvent, PollOutcome, PollState, Poller, StatusClass, StatusClassifier,
    StatusVocabulary,
};
pub use resources::{ResourceKind, ResourceStatus};

/// HTTP method type accepted by [`ApiClient::request`].
pub use reqwest::Method;
