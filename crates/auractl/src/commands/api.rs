//! Raw API access commands for direct REST endpoint calls

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

use crate::cli::HttpMethod;
use crate::commands::print_response;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

/// Send one request to an arbitrary endpoint and print the response body
pub fn handle_api_command(
    conn_mgr: &ConnectionManager,
    method: &HttpMethod,
    path: &str,
    data: Option<&str>,
) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let path = normalize_path(path);
    let body = parse_body(data)?;
    debug!("{} {} (body: {})", method, path, body.is_some());

    let response = client.request(method.as_method(), &path, body.as_ref())?;
    print_response(&response, conn_mgr.config.output, &[], "")?;
    Ok(())
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Parse `--data` as inline JSON or `@file`
fn parse_body(data: Option<&str>) -> anyhow::Result<Option<Value>> {
    let Some(data) = data else {
        return Ok(None);
    };

    let value = if let Some(file_path) = data.strip_prefix('@') {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read file: {}", file_path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from file: {}", file_path))?
    } else {
        serde_json::from_str(data).context("Failed to parse JSON from data parameter")?
    };
    Ok(Some(value))
}
