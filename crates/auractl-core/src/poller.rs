//! Waiting for asynchronous operations to settle
//!
//! Mutating calls return as soon as the server accepts them; the resource
//! then moves through transitional statuses until it settles. [`Poller`]
//! repeatedly fetches the status, classifies it, and stops on the first
//! terminal class or when the retry budget runs out.
//!
//! ```rust
//! use auractl_core::{PollState, Poller, ResourceKind, ResourceStatus};
//! use std::time::Duration;
//!
//! let mut statuses = vec!["creating", "creating", "running"].into_iter();
//! let outcome = Poller::new(Duration::ZERO, 10)
//!     .poll(
//!         "2f49c2b3",
//!         ResourceKind::Instance.classifier(),
//!         |_| {
//!             let raw = statuses.next().unwrap_or("running");
//!             Ok(ResourceStatus::new(ResourceKind::Instance, raw))
//!         },
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(outcome.state, PollState::Ready);
//! assert_eq!(outcome.fetches, 3);
//! ```

use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::config::PollingConfig;
use crate::error::Result;
use crate::resources::{ResourceKind, ResourceStatus};

/// Classification of one observed status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Pending,
    Ready,
    Failed,
    Unknown,
}

/// Terminal state of a poll session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Ready,
    Failed,
    Unknown,
    Timeout,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PollState::Ready => "ready",
            PollState::Failed => "failed",
            PollState::Unknown => "unknown",
            PollState::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Maps a raw status string to a [`StatusClass`]
pub trait StatusClassifier {
    fn classify(&self, status: &str) -> StatusClass;
}

impl<F> StatusClassifier for F
where
    F: Fn(&str) -> StatusClass,
{
    fn classify(&self, status: &str) -> StatusClass {
        self(status)
    }
}

/// Fixed pending/ready/failed sets, matched case-insensitively
#[derive(Debug)]
pub struct StatusVocabulary {
    pending: &'static [&'static str],
    ready: &'static [&'static str],
    failed: &'static [&'static str],
}

impl StatusVocabulary {
    pub const fn new(
        pending: &'static [&'static str],
        ready: &'static [&'static str],
        failed: &'static [&'static str],
    ) -> Self {
        Self {
            pending,
            ready,
            failed,
        }
    }
}

impl StatusClassifier for StatusVocabulary {
    fn classify(&self, status: &str) -> StatusClass {
        let status = status.trim();
        let matches = |set: &[&str]| set.iter().any(|s| s.eq_ignore_ascii_case(status));
        if matches(self.ready) {
            StatusClass::Ready
        } else if matches(self.failed) {
            StatusClass::Failed
        } else if matches(self.pending) {
            StatusClass::Pending
        } else {
            StatusClass::Unknown
        }
    }
}

/// Result of a poll session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: PollState,
    /// Last status observed
    pub status: ResourceStatus,
    /// Number of status fetches performed
    pub fetches: u32,
}

/// Progress events emitted while polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// A fetch returned a still-pending status
    Polling {
        resource_id: String,
        status: String,
        attempt: u32,
    },
    /// The session reached a terminal state
    Finished {
        resource_id: String,
        state: PollState,
        status: String,
    },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive its spinner.
pub type PollCallback<'a> = &'a dyn Fn(PollEvent);

/// Repeatedly fetches a status until it settles
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
    max_retries: u32,
}

impl Poller {
    /// `max_retries` below 1 is treated as 1
    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval,
            max_retries: max_retries.max(1),
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval(), config.max_retries)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Poll `fetch` until the classified status is terminal.
    ///
    /// Every pending observation counts as one attempt; after `max_retries`
    /// pending observations the session ends in [`PollState::Timeout`]. No
    /// sleep follows the last fetch. Fetch errors end the session and are
    /// returned unchanged.
    pub fn poll<C, F>(
        &self,
        resource_id: &str,
        classifier: &C,
        mut fetch: F,
        on_progress: Option<PollCallback<'_>>,
    ) -> Result<PollOutcome>
    where
        C: StatusClassifier + ?Sized,
        F: FnMut(&str) -> Result<ResourceStatus>,
    {
        let mut attempt: u32 = 0;
        let mut fetches: u32 = 0;

        loop {
            let status = fetch(resource_id)?;
            fetches += 1;

            let state = match classifier.classify(&status.raw) {
                StatusClass::Ready => PollState::Ready,
                StatusClass::Failed => PollState::Failed,
                StatusClass::Unknown => PollState::Unknown,
                StatusClass::Pending => {
                    attempt += 1;
                    debug!(
                        "{} is '{}' (attempt {}/{})",
                        resource_id, status.raw, attempt, self.max_retries
                    );
                    emit(
                        on_progress,
                        PollEvent::Polling {
                            resource_id: resource_id.to_string(),
                            status: status.raw.clone(),
                            attempt,
                        },
                    );
                    if attempt >= self.max_retries {
                        PollState::Timeout
                    } else {
                        if !self.interval.is_zero() {
                            thread::sleep(self.interval);
                        }
                        continue;
                    }
                }
            };

            info!(
                "Finished waiting for {}: {} (status '{}')",
                resource_id, state, status.raw
            );
            emit(
                on_progress,
                PollEvent::Finished {
                    resource_id: resource_id.to_string(),
                    state,
                    status: status.raw.clone(),
                },
            );
            return Ok(PollOutcome {
                state,
                status,
                fetches,
            });
        }
    }

    /// Poll a resource by GETting `path` and reading `data.status`
    pub fn poll_resource(
        &self,
        client: &ApiClient,
        kind: ResourceKind,
        resource_id: &str,
        path: &str,
        on_progress: Option<PollCallback<'_>>,
    ) -> Result<PollOutcome> {
        debug!("Waiting for {} {} via {}", kind, resource_id, path);
        self.poll(
            resource_id,
            kind.classifier(),
            |_| {
                let response = client.get(path)?;
                ResourceStatus::from_response(kind, path, &response)
            },
            on_progress,
        )
    }
}

fn emit(callback: Option<PollCallback<'_>>, event: PollEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
