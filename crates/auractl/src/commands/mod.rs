//! Command implementations

pub mod api;
pub mod await_utils;
pub mod config;
pub mod credential;
pub mod customer_managed_key;
pub mod graphql;
pub mod instance;
pub mod snapshot;
pub mod tenant;

use auractl_core::{ApiResponse, OutputMode};
use serde_json::Value;

use crate::error::{AuraCtlError, Result as CliResult};
use crate::output::print_output;

/// Print a response body, or `empty_message` when the server sent none
pub(crate) fn print_response(
    response: &ApiResponse,
    mode: OutputMode,
    fields: &[&str],
    empty_message: &str,
) -> CliResult<Value> {
    let body = response.json_value()?;
    if body.is_null() {
        println!("{}", empty_message);
    } else {
        print_output(&body, mode, fields)?;
    }
    Ok(body)
}

/// Read a string from the `data` object of a response body
pub(crate) fn data_field(body: &Value, field: &str) -> CliResult<String> {
    body.get("data")
        .and_then(|data| data.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AuraCtlError::ApiError {
            status: None,
            message: format!("Response did not contain data.{}", field),
        })
}

/// Append `key=value` query parameters for the values that are set
pub(crate) fn with_query(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value.map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/instances", &[("tenantId", None)]), "/instances");
        assert_eq!(
            with_query("/instances", &[("tenantId", Some("a b"))]),
            "/instances?tenantId=a%20b"
        );
        assert_eq!(
            with_query("/x", &[("a", Some("1")), ("b", None), ("c", Some("3"))]),
            "/x?a=1&c=3"
        );
    }

    #[test]
    fn test_data_field() {
        let body = json!({"data": {"id": "abc", "count": 3}});
        assert_eq!(data_field(&body, "id").unwrap(), "abc");
        assert!(data_field(&body, "count").is_err());
        assert!(data_field(&json!({}), "id").is_err());
    }
}
