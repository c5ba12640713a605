//! Instance snapshot commands

use auractl_core::{ApiClient, Method, ResourceKind};
use tracing::info;

use crate::cli::SnapshotCommands;
use crate::commands::await_utils::{AwaitTarget, wait_for};
use crate::commands::{data_field, print_response, with_query};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

const SNAPSHOT_FIELDS: &[&str] = &[
    "snapshot_id",
    "instance_id",
    "profile",
    "status",
    "timestamp",
    "exportable",
];

pub fn handle_snapshot_command(
    cmd: &SnapshotCommands,
    conn_mgr: &ConnectionManager,
    client: &ApiClient,
) -> CliResult<()> {
    let output = conn_mgr.config.output;

    match cmd {
        SnapshotCommands::List { instance_id, date } => {
            let path = with_query(&snapshots_path(instance_id), &[("date", date.as_deref())]);
            let response = client.get(&path)?;
            print_response(&response, output, SNAPSHOT_FIELDS, "No snapshots")?;
        }

        SnapshotCommands::Get { id, instance_id } => {
            let response = client.get(&snapshot_path(instance_id, id))?;
            print_response(&response, output, SNAPSHOT_FIELDS, "")?;
        }

        SnapshotCommands::Create { instance_id, wait } => {
            info!("Taking snapshot of instance {}", instance_id);
            let response =
                client.request::<()>(Method::POST, &snapshots_path(instance_id), None)?;
            let body = print_response(&response, output, &["snapshot_id"], "")?;

            if *wait {
                let snapshot_id = data_field(&body, "snapshot_id")?;
                wait_for(
                    conn_mgr,
                    client,
                    ResourceKind::Snapshot,
                    &snapshot_id,
                    &snapshot_path(instance_id, &snapshot_id),
                    AwaitTarget::Settled,
                )?;
            }
        }
    }

    Ok(())
}

fn snapshots_path(instance_id: &str) -> String {
    format!("/instances/{}/snapshots", instance_id)
}

fn snapshot_path(instance_id: &str, snapshot_id: &str) -> String {
    format!("{}/{}", snapshots_path(instance_id), snapshot_id)
}
