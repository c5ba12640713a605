//! `--await` support: poll a resource with a spinner and turn the outcome into
//! an exit status

use std::time::Duration;

use auractl_core::{
    ApiClient, CoreError, PollEvent, PollOutcome, PollState, ResourceKind, ResourceStatus,
    StatusClass, StatusClassifier,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::connection::ConnectionManager;
use crate::error::{AuraCtlError, Result as CliResult};

/// What counts as done for one `--await`
#[derive(Debug, Clone, Copy)]
pub enum AwaitTarget {
    /// Any status the resource kind treats as settled
    Settled,
    /// One of these statuses; other settled statuses keep waiting
    Status(&'static [&'static str]),
    /// The resource is gone (404) or reports a deleted status
    Deleted,
}

const DELETED_STATUSES: &[&str] = &["deleted", "destroyed"];

/// Classifier for a specific target status on top of a kind's vocabulary
struct UntilStatus {
    kind: ResourceKind,
    targets: &'static [&'static str],
}

impl StatusClassifier for UntilStatus {
    fn classify(&self, status: &str) -> StatusClass {
        if self
            .targets
            .iter()
            .any(|t| t.eq_ignore_ascii_case(status.trim()))
        {
            return StatusClass::Ready;
        }
        match self.kind.classifier().classify(status) {
            // Settled, but not where this command is heading yet
            StatusClass::Ready => StatusClass::Pending,
            other => other,
        }
    }
}

/// Poll `path` until the resource reaches `target`, showing a spinner.
///
/// Ready prints the final status; failed, unknown and timed-out sessions
/// become errors so the process exits non-zero.
pub fn wait_for(
    conn_mgr: &ConnectionManager,
    client: &ApiClient,
    kind: ResourceKind,
    id: &str,
    path: &str,
    target: AwaitTarget,
) -> CliResult<()> {
    let poller = conn_mgr.poller();
    debug!(
        "Awaiting {} {} (every {:?}, at most {} checks)",
        kind,
        id,
        poller.interval(),
        poller.max_retries()
    );

    let pb = spinner(&format!("Waiting for {} {}...", kind, id));
    let on_progress = |event: PollEvent| match event {
        PollEvent::Polling {
            status, attempt, ..
        } => pb.set_message(format!(
            "Waiting for {} {}: {} (check {}/{})",
            kind,
            id,
            status,
            attempt,
            poller.max_retries()
        )),
        PollEvent::Finished { state, status, .. } => {
            pb.finish_with_message(format!("{} {}: {} ({})", kind, id, status, state))
        }
    };

    let fetch = |_: &str| -> auractl_core::Result<ResourceStatus> {
        match client.get(path) {
            Ok(response) => ResourceStatus::from_response(kind, path, &response),
            Err(e) if e.is_not_found() && matches!(target, AwaitTarget::Deleted) => {
                Ok(ResourceStatus::new(kind, "deleted"))
            }
            Err(e) => Err(e),
        }
    };

    let result = match target {
        AwaitTarget::Settled => poller.poll(id, kind.classifier(), fetch, Some(&on_progress)),
        AwaitTarget::Status(targets) => poller.poll(
            id,
            &UntilStatus { kind, targets },
            fetch,
            Some(&on_progress),
        ),
        AwaitTarget::Deleted => poller.poll(
            id,
            &UntilStatus {
                kind,
                targets: DELETED_STATUSES,
            },
            fetch,
            Some(&on_progress),
        ),
    };

    let outcome = result.inspect_err(|_: &CoreError| pb.abandon())?;
    eprintln!("{} Status: {}", title(kind), outcome.status.raw);
    outcome_to_result(kind, id, outcome)
}

fn outcome_to_result(kind: ResourceKind, id: &str, outcome: PollOutcome) -> CliResult<()> {
    let resource = format!("{} {}", kind, id);
    match outcome.state {
        PollState::Ready => Ok(()),
        PollState::Failed => Err(AuraCtlError::OperationFailed {
            resource,
            status: outcome.status.raw,
            detail: outcome.status.error_detail,
        }),
        PollState::Unknown => Err(AuraCtlError::UnexpectedStatus {
            resource,
            status: outcome.status.raw,
        }),
        PollState::Timeout => Err(AuraCtlError::Timeout {
            resource,
            status: outcome.status.raw,
        }),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn title(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Instance => "Instance",
        ResourceKind::Snapshot => "Snapshot",
        ResourceKind::GraphqlDataApi => "GraphQL Data API",
        ResourceKind::CustomerManagedKey => "Customer Managed Key",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(state: PollState, raw: &str) -> PollOutcome {
        PollOutcome {
            state,
            status: ResourceStatus::new(ResourceKind::Instance, raw),
            fetches: 1,
        }
    }

    #[test]
    fn test_until_status_waits_past_other_settled_states() {
        let until_paused = UntilStatus {
            kind: ResourceKind::Instance,
            targets: &["paused"],
        };
        assert_eq!(until_paused.classify("Paused"), StatusClass::Ready);
        assert_eq!(until_paused.classify("running"), StatusClass::Pending);
        assert_eq!(until_paused.classify("pausing"), StatusClass::Pending);
        assert_eq!(until_paused.classify("restore failed"), StatusClass::Failed);
        assert_eq!(until_paused.classify("melting"), StatusClass::Unknown);
    }

    #[test]
    fn test_outcome_mapping() {
        let instance = ResourceKind::Instance;
        assert!(outcome_to_result(instance, "a", outcome(PollState::Ready, "running")).is_ok());

        let err =
            outcome_to_result(instance, "a", outcome(PollState::Timeout, "creating")).unwrap_err();
        assert!(matches!(err, AuraCtlError::Timeout { ref status, .. } if status == "creating"));

        let err = outcome_to_result(ResourceKind::Snapshot, "s", outcome(PollState::Failed, "Failed"))
            .unwrap_err();
        assert!(matches!(err, AuraCtlError::OperationFailed { .. }));

        let err =
            outcome_to_result(instance, "a", outcome(PollState::Unknown, "melting")).unwrap_err();
        assert!(err.to_string().contains("melting"));
    }
}
