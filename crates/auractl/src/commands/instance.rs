//! Instance commands

use auractl_core::{Method, ResourceKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::InstanceCommands;
use crate::commands::await_utils::{AwaitTarget, wait_for};
use crate::commands::{data_field, print_response, snapshot, with_query};
use crate::connection::ConnectionManager;
use crate::error::{AuraCtlError, Result as CliResult};

const FREE_TIER: &str = "free-db";
const FREE_TIER_MEMORY: &str = "1GB";
const FREE_TIER_REGION: &str = "europe-west1";

const LIST_FIELDS: &[&str] = &["id", "name", "tenant_id", "cloud_provider", "created_at"];
const DETAIL_FIELDS: &[&str] = &[
    "id",
    "name",
    "tenant_id",
    "status",
    "connection_url",
    "cloud_provider",
    "region",
    "type",
    "memory",
    "storage",
    "customer_managed_key_id",
    "metrics_integration_url",
];
const CREATED_FIELDS: &[&str] = &[
    "id",
    "name",
    "tenant_id",
    "connection_url",
    "username",
    "password",
    "cloud_provider",
    "region",
    "type",
];

#[derive(Debug, Serialize, PartialEq)]
struct CreateInstanceRequest<'a> {
    name: &'a str,
    version: &'a str,
    region: &'a str,
    memory: &'a str,
    #[serde(rename = "type")]
    instance_type: &'a str,
    tenant_id: &'a str,
    cloud_provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_managed_key_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateInstanceRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OverwriteInstanceRequest<'a> {
    source_instance_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_snapshot_id: Option<&'a str>,
}

pub fn handle_instance_command(
    cmd: &InstanceCommands,
    conn_mgr: &ConnectionManager,
) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let output = conn_mgr.config.output;

    match cmd {
        InstanceCommands::List { tenant_id } => {
            let path = with_query("/instances", &[("tenantId", tenant_id.as_deref())]);
            let response = client.get(&path)?;
            print_response(&response, output, LIST_FIELDS, "No instances")?;
        }

        InstanceCommands::Get { id } => {
            let response = client.get(&instance_path(id))?;
            print_response(&response, output, DETAIL_FIELDS, "")?;
        }

        InstanceCommands::Create {
            name,
            instance_type,
            cloud_provider,
            tenant_id,
            region,
            memory,
            version,
            customer_managed_key_id,
            wait,
        } => {
            let tenant_id = conn_mgr
                .tenant_or_default(tenant_id.as_deref())
                .ok_or_else(|| AuraCtlError::InvalidInput {
                    message: "--tenant-id is required when no default-tenant is configured"
                        .to_string(),
                })?;
            let (region, memory) =
                sizing_for(instance_type, region.as_deref(), memory.as_deref())?;

            let request = CreateInstanceRequest {
                name,
                version,
                region,
                memory,
                instance_type,
                tenant_id: &tenant_id,
                cloud_provider,
                customer_managed_key_id: customer_managed_key_id.as_deref(),
            };
            info!("Creating {} instance '{}' in tenant {}", instance_type, name, tenant_id);

            let response = client.post("/instances", &request)?;
            let body = print_response(&response, output, CREATED_FIELDS, "")?;

            if *wait {
                let id = data_field(&body, "id")?;
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::Instance,
                    &id,
                    &instance_path(&id),
                    AwaitTarget::Settled,
                )?;
            }
        }

        InstanceCommands::Update {
            id,
            name,
            memory,
            wait,
        } => {
            let request = UpdateInstanceRequest {
                name: name.as_deref(),
                memory: memory.as_deref(),
            };
            let response = client.patch(&instance_path(id), &request)?;
            print_response(&response, output, DETAIL_FIELDS, "")?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::Instance,
                    id,
                    &instance_path(id),
                    AwaitTarget::Settled,
                )?;
            }
        }

        InstanceCommands::Delete { id, wait } => {
            let response = client.delete(&instance_path(id))?;
            print_response(
                &response,
                output,
                DETAIL_FIELDS,
                &format!("Instance {} is being deleted", id),
            )?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::Instance,
                    id,
                    &instance_path(id),
                    AwaitTarget::Deleted,
                )?;
            }
        }

        InstanceCommands::Pause { id, wait } => {
            let path = format!("{}/pause", instance_path(id));
            let response = client.request::<()>(Method::POST, &path, None)?;
            print_response(&response, output, DETAIL_FIELDS, "")?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::Instance,
                    id,
                    &instance_path(id),
                    AwaitTarget::Status(&["paused"]),
                )?;
            }
        }

        InstanceCommands::Resume { id, wait } => {
            let path = format!("{}/resume", instance_path(id));
            let response = client.request::<()>(Method::POST, &path, None)?;
            print_response(&response, output, DETAIL_FIELDS, "")?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::Instance,
                    id,
                    &instance_path(id),
                    AwaitTarget::Status(&["running"]),
                )?;
            }
        }

        InstanceCommands::Overwrite {
            id,
            source_instance_id,
            source_snapshot_id,
            wait,
        } => {
            let request = OverwriteInstanceRequest {
                // A snapshot without a source instance belongs to the target instance
                source_instance_id: source_instance_id.as_deref().unwrap_or(id),
                source_snapshot_id: source_snapshot_id.as_deref(),
            };
            debug!("Overwrite request: {:?}", request);
            let response = client.post(&format!("{}/overwrite", instance_path(id)), &request)?;
            print_response(&response, output, DETAIL_FIELDS, "")?;

            if *wait {
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::Instance,
                    id,
                    &instance_path(id),
                    AwaitTarget::Settled,
                )?;
            }
        }

        InstanceCommands::Snapshot(snapshot_cmd) => {
            snapshot::handle_snapshot_command(snapshot_cmd, conn_mgr, &client)?;
        }
    }

    Ok(())
}

fn instance_path(id: &str) -> String {
    format!("/instances/{}", id)
}

/// Region and memory for a new instance. Free instances have fixed defaults;
/// every other type must be sized explicitly.
fn sizing_for<'a>(
    instance_type: &str,
    region: Option<&'a str>,
    memory: Option<&'a str>,
) -> CliResult<(&'a str, &'a str)> {
    if instance_type == FREE_TIER {
        return Ok((
            region.unwrap_or(FREE_TIER_REGION),
            memory.unwrap_or(FREE_TIER_MEMORY),
        ));
    }

    let missing: Vec<&str> = [("--region", region), ("--memory", memory)]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(flag, _)| *flag)
        .collect();
    match (region, memory) {
        (Some(region), Some(memory)) => Ok((region, memory)),
        _ => Err(AuraCtlError::InvalidInput {
            message: format!(
                "{} required for instance type '{}'",
                missing.join(" and "),
                instance_type
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_free_tier_defaults() {
        assert_eq!(
            sizing_for("free-db", None, None).unwrap(),
            ("europe-west1", "1GB")
        );
        assert_eq!(
            sizing_for("free-db", Some("us-central1"), None).unwrap(),
            ("us-central1", "1GB")
        );
    }

    #[test]
    fn test_paid_tiers_need_sizing() {
        let err = sizing_for("professional-db", Some("eu-west-1"), None).unwrap_err();
        assert!(err.to_string().contains("--memory"));
        assert!(!err.to_string().contains("--region"));

        let err = sizing_for("enterprise-db", None, None).unwrap_err();
        assert!(err.to_string().contains("--region and --memory"));

        assert_eq!(
            sizing_for("professional-db", Some("eu-west-1"), Some("8GB")).unwrap(),
            ("eu-west-1", "8GB")
        );
    }

    #[test]
    fn test_create_request_body() {
        let request = CreateInstanceRequest {
            name: "demo",
            version: "5",
            region: "europe-west1",
            memory: "1GB",
            instance_type: "free-db",
            tenant_id: "tenant-1",
            cloud_provider: "gcp",
            customer_managed_key_id: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "demo",
                "version": "5",
                "region": "europe-west1",
                "memory": "1GB",
                "type": "free-db",
                "tenant_id": "tenant-1",
                "cloud_provider": "gcp"
            })
        );
    }

    #[test]
    fn test_overwrite_body_omits_missing_snapshot() {
        let request = OverwriteInstanceRequest {
            source_instance_id: "src",
            source_snapshot_id: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"source_instance_id": "src"})
        );
    }
}
