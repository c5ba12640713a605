//! Credential management commands

use auractl_core::{Credential, Credentials, OutputMode};
use chrono::Utc;
use colored::Colorize;
use comfy_table::Table;
use serde_json::{Value, json};
use tracing::info;

use crate::cli::CredentialCommands;
use crate::connection::ConnectionManager;
use crate::error::{AuraCtlError, Result as CliResult};

pub fn handle_credential_command(
    cmd: &CredentialCommands,
    conn_mgr: &ConnectionManager,
) -> CliResult<()> {
    let store = conn_mgr.credential_store();

    match cmd {
        CredentialCommands::Add {
            name,
            client_id,
            client_secret,
        } => {
            let client_secret = match client_secret {
                Some(secret) => secret.clone(),
                None => rpassword::prompt_password("Client secret: ").map_err(|e| {
                    AuraCtlError::InvalidInput {
                        message: format!("Failed to read client secret: {}", e),
                    }
                })?,
            };
            if client_secret.trim().is_empty() {
                return Err(AuraCtlError::InvalidInput {
                    message: "client secret must not be empty".to_string(),
                });
            }

            let became_default = store.update(|creds| {
                creds.add(Credential::new(name, client_id, client_secret))?;
                Ok(creds.default_credential.as_deref() == Some(name.as_str()))
            })?;
            info!("Added credential '{}'", name);

            println!("Credential '{}' added", name.bold());
            if became_default {
                println!("Set as the default credential");
            }
        }

        CredentialCommands::List => {
            let credentials = store.load()?;
            print_credentials(&credentials, conn_mgr.config.output)?;
        }

        CredentialCommands::Use { name } => {
            store.update(|creds| creds.set_default(name))?;
            println!("Default credential set to '{}'", name.bold());
        }

        CredentialCommands::Remove { name } => {
            let removed = store.update(|creds| creds.remove(name))?;
            info!("Removed credential '{}'", removed.name);
            println!("Credential '{}' removed", removed.name.bold());
        }

        CredentialCommands::Logout { name } => {
            let name = match name {
                Some(name) => name.clone(),
                None => conn_mgr.active_credential()?,
            };
            store.clear(&name, true)?;
            println!("Logged out of '{}'", name.bold());
        }
    }

    Ok(())
}

/// Credential summaries with secrets and tokens left out
fn credential_summaries(credentials: &Credentials) -> Vec<Value> {
    credentials
        .credentials
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "client_id": c.client_id,
                "default": credentials.default_credential.as_deref() == Some(c.name.as_str()),
                "token_expires_at": c.token.as_ref().map(|t| t.expires_at.to_rfc3339()),
            })
        })
        .collect()
}

fn print_credentials(credentials: &Credentials, mode: OutputMode) -> CliResult<()> {
    let summaries = credential_summaries(credentials);

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputMode::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Name", "Client ID", "Default", "Token Expires"]);
            for summary in &summaries {
                table.add_row(vec![
                    summary["name"].as_str().unwrap_or_default().to_string(),
                    summary["client_id"].as_str().unwrap_or_default().to_string(),
                    if summary["default"].as_bool() == Some(true) {
                        "*".to_string()
                    } else {
                        String::new()
                    },
                    summary["token_expires_at"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputMode::Default => {
            if credentials.is_empty() {
                println!("No credentials configured.");
                println!("Use 'auractl credential add' to add one.");
                return Ok(());
            }
            let now = Utc::now();
            for credential in &credentials.credentials {
                let is_default =
                    credentials.default_credential.as_deref() == Some(credential.name.as_str());
                if is_default {
                    println!("{} {}", credential.name.bold().cyan(), "(default)".green());
                } else {
                    println!("{}", credential.name.bold().cyan());
                }
                println!("  {} {}", "Client ID:".dimmed(), credential.client_id);
                match &credential.token {
                    Some(token) if token.expires_at > now => {
                        println!("  {} {}", "Token expires:".dimmed(), token.expires_at)
                    }
                    Some(_) => println!("  {} expired", "Token:".dimmed()),
                    None => println!("  {} none", "Token:".dimmed()),
                }
            }
        }
    }
    Ok(())
}
