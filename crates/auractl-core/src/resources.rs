//! Resource kinds that support waiting, and their status vocabularies

use serde::Deserialize;
use std::fmt;

use crate::client::ApiResponse;
use crate::error::{CoreError, Result};
use crate::poller::StatusVocabulary;

static INSTANCE_STATUSES: StatusVocabulary = StatusVocabulary::new(
    &[
        "creating",
        "updating",
        "deleting",
        "destroying",
        "overwriting",
        "pausing",
        "resuming",
        "restoring",
        "loading",
    ],
    &["running", "ready", "deleted", "destroyed", "paused"],
    &["loading failed", "restore failed"],
);

static SNAPSHOT_STATUSES: StatusVocabulary = StatusVocabulary::new(
    &["pending", "inprogress", "in progress"],
    &["completed"],
    &["failed"],
);

static GRAPHQL_DATA_API_STATUSES: StatusVocabulary = StatusVocabulary::new(
    &["creating", "updating", "deleting", "pausing", "resuming"],
    &["ready", "deleted", "paused"],
    &["error"],
);

static CUSTOMER_MANAGED_KEY_STATUSES: StatusVocabulary =
    StatusVocabulary::new(&["pending"], &["ready"], &["error"]);

/// A kind of remote resource whose operations complete asynchronously
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Instance,
    Snapshot,
    GraphqlDataApi,
    CustomerManagedKey,
}

impl ResourceKind {
    /// Status vocabulary used to classify this kind's `status` field
    pub fn classifier(self) -> &'static StatusVocabulary {
        match self {
            ResourceKind::Instance => &INSTANCE_STATUSES,
            ResourceKind::Snapshot => &SNAPSHOT_STATUSES,
            ResourceKind::GraphqlDataApi => &GRAPHQL_DATA_API_STATUSES,
            ResourceKind::CustomerManagedKey => &CUSTOMER_MANAGED_KEY_STATUSES,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Instance => "instance",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::GraphqlDataApi => "GraphQL Data API",
            ResourceKind::CustomerManagedKey => "customer managed key",
        };
        f.write_str(name)
    }
}

/// Raw status of a resource as reported by one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    pub kind: ResourceKind,
    pub raw: String,
    /// Server-provided failure detail, when the resource carries one
    pub error_detail: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    data: StatusFields,
}

#[derive(Deserialize)]
struct StatusFields {
    status: String,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl ResourceStatus {
    pub fn new(kind: ResourceKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            error_detail: None,
        }
    }

    /// Read `data.status` (and `data.error`, if present) from a single-resource response
    pub fn from_response(kind: ResourceKind, path: &str, response: &ApiResponse) -> Result<Self> {
        let envelope: Envelope =
            response
                .json()
                .map_err(|e| CoreError::UnexpectedResponse {
                    path: path.to_string(),
                    message: format!("missing data.status: {e}"),
                })?;

        let error_detail = envelope.data.error.and_then(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

        Ok(Self {
            kind,
            raw: envelope.data.status,
            error_detail,
        })
    }
}
