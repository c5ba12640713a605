//! `config get|set|list`: read and write the settings file

use auractl_core::config::VALID_KEYS;
use auractl_core::{Config, OutputMode};
use comfy_table::Table;
use serde_json::{Map, Value};
use tracing::info;

use crate::cli::ConfigCommands;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

/// Handle config commands.
///
/// These work on the file as stored, so environment and flag overrides for
/// this invocation are not shown or persisted.
pub fn handle_config_command(cmd: &ConfigCommands, conn_mgr: &ConnectionManager) -> CliResult<()> {
    let dir = conn_mgr.config_dir();
    let mut config = Config::load_from_dir(dir)?;

    match cmd {
        ConfigCommands::Get { key } => {
            if let Some(value) = config.get_key(key)? {
                println!("{}", value);
            }
        }
        ConfigCommands::Set { key, value } => {
            config.set_key(key, value)?;
            config.save_to_dir(dir)?;
            info!("Set {} in {}", key, dir.display());
            println!("{} = {}", key, value);
        }
        ConfigCommands::List => {
            let entries = config_entries(&config)?;
            match conn_mgr.config.output {
                OutputMode::Json => {
                    let map: Map<String, Value> = entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.map(Value::String).unwrap_or(Value::Null)))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputMode::Table => {
                    let mut table = Table::new();
                    table.set_header(vec!["Key", "Value"]);
                    for (key, value) in entries {
                        table.add_row(vec![key.to_string(), value.unwrap_or_default()]);
                    }
                    println!("{table}");
                }
                OutputMode::Default => {
                    for (key, value) in entries {
                        println!("{} = {}", key, value.unwrap_or_default());
                    }
                }
            }
        }
    }

    Ok(())
}

fn config_entries(config: &Config) -> CliResult<Vec<(&'static str, Option<String>)>> {
    VALID_KEYS
        .iter()
        .map(|key| -> CliResult<_> { Ok((*key, config.get_key(key)?)) })
        .collect()
}
