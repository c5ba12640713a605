//! Customer managed key commands

use auractl_core::ResourceKind;
use serde::Serialize;

use crate::cli::CustomerManagedKeyCommands;
use crate::commands::await_utils::{AwaitTarget, wait_for};
use crate::commands::{data_field, print_response, with_query};
use crate::connection::ConnectionManager;
use crate::error::{AuraCtlError, Result as CliResult};

const LIST_FIELDS: &[&str] = &["id", "name", "tenant_id"];
const DETAIL_FIELDS: &[&str] = &[
    "id",
    "name",
    "key_id",
    "status",
    "cloud_provider",
    "instance_type",
    "region",
    "tenant_id",
    "created",
];

#[derive(Debug, Serialize)]
struct CreateKeyRequest<'a> {
    key_id: &'a str,
    name: &'a str,
    cloud_provider: &'a str,
    instance_type: &'a str,
    region: &'a str,
    tenant_id: &'a str,
}

pub fn handle_customer_managed_key_command(
    cmd: &CustomerManagedKeyCommands,
    conn_mgr: &ConnectionManager,
) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let output = conn_mgr.config.output;

    match cmd {
        CustomerManagedKeyCommands::List { tenant_id } => {
            let path = with_query(
                "/customer-managed-keys",
                &[("tenantId", tenant_id.as_deref())],
            );
            let response = client.get(&path)?;
            print_response(&response, output, LIST_FIELDS, "No customer managed keys")?;
        }

        CustomerManagedKeyCommands::Get { id } => {
            let response = client.get(&key_path(id))?;
            print_response(&response, output, DETAIL_FIELDS, "")?;
        }

        CustomerManagedKeyCommands::Create {
            name,
            key_id,
            cloud_provider,
            instance_type,
            region,
            tenant_id,
            wait,
        } => {
            let tenant_id = conn_mgr
                .tenant_or_default(tenant_id.as_deref())
                .ok_or_else(|| AuraCtlError::InvalidInput {
                    message: "--tenant-id is required when no default-tenant is configured"
                        .to_string(),
                })?;
            let request = CreateKeyRequest {
                key_id,
                name,
                cloud_provider,
                instance_type,
                region,
                tenant_id: &tenant_id,
            };

            let response = client.post("/customer-managed-keys", &request)?;
            let body = print_response(&response, output, DETAIL_FIELDS, "")?;

            if *wait {
                let id = data_field(&body, "id")?;
                wait_for(
                    conn_mgr,
                    &client,
                    ResourceKind::CustomerManagedKey,
                    &id,
                    &key_path(&id),
                    AwaitTarget::Settled,
                )?;
            }
        }

        CustomerManagedKeyCommands::Delete { id } => {
            let response = client.delete(&key_path(id))?;
            print_response(
                &response,
                output,
                DETAIL_FIELDS,
                &format!("Customer managed key {} deleted", id),
            )?;
        }
    }

    Ok(())
}

fn key_path(id: &str) -> String {
    format!("/customer-managed-keys/{}", id)
}
