//! Tenant commands

use tracing::debug;

use crate::cli::TenantCommands;
use crate::commands::print_response;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

const TENANT_FIELDS: &[&str] = &["id", "name"];

pub fn handle_tenant_command(cmd: &TenantCommands, conn_mgr: &ConnectionManager) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let output = conn_mgr.config.output;

    match cmd {
        TenantCommands::List => {
            debug!("Listing tenants");
            let response = client.get("/tenants")?;
            print_response(&response, output, TENANT_FIELDS, "No tenants")?;
        }
        TenantCommands::Get { id } => {
            let response = client.get(&format!("/tenants/{}", id))?;
            print_response(&response, output, TENANT_FIELDS, "")?;
        }
    }
    Ok(())
}
