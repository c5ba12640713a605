//! Rendering API responses
//!
//! Responses are `{"data": ...}` envelopes. JSON output prints the body as
//! returned; table output renders `data` (an object or an array of objects)
//! with a chosen set of columns.

use auractl_core::OutputMode;
use comfy_table::Table;
use serde_json::Value;

use crate::error::Result as CliResult;

pub fn print_output(body: &Value, mode: OutputMode, fields: &[&str]) -> CliResult<()> {
    match mode {
        OutputMode::Default | OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(body)?);
        }
        OutputMode::Table => match render_table(body, fields) {
            Some(table) => println!("{table}"),
            None => println!("{}", serde_json::to_string_pretty(body)?),
        },
    }
    Ok(())
}

/// Build a table of `data`, or `None` when it is not tabular
pub fn render_table(body: &Value, fields: &[&str]) -> Option<Table> {
    let data = body.get("data").unwrap_or(body);
    let rows: Vec<&serde_json::Map<String, Value>> = match data {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => return None,
    };

    let headers: Vec<String> = if fields.is_empty() {
        match rows.first() {
            Some(first) => first.keys().cloned().collect(),
            None => return Some(empty_table()),
        }
    } else {
        fields.iter().map(|f| f.to_string()).collect()
    };

    let mut table = Table::new();
    table.set_header(&headers);
    for row in rows {
        table.add_row(
            headers
                .iter()
                .map(|h| format_value(row.get(h).unwrap_or(&Value::Null)))
                .collect::<Vec<_>>(),
        );
    }
    Some(table)
}

fn empty_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["No results"]);
    table
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_selects_fields_in_order() {
        let body = json!({"data": {"id": "abc", "name": "prod", "status": "running", "extra": 1}});
        let table = render_table(&body, &["id", "status", "missing"]).unwrap();
        let rendered = table.to_string();
        assert!(rendered.contains("abc"));
        assert!(rendered.contains("running"));
        assert!(!rendered.contains("prod"));
        assert!(rendered.find("id").unwrap() < rendered.find("status").unwrap());
    }

    #[test]
    fn test_table_from_array_uses_first_keys() {
        let body = json!({"data": [
            {"id": "t1", "name": "Personal"},
            {"id": "t2", "name": "Team"}
        ]});
        let rendered = render_table(&body, &[]).unwrap().to_string();
        assert!(rendered.contains("Personal"));
        assert!(rendered.contains("Team"));
    }

    #[test]
    fn test_non_tabular_body() {
        assert!(render_table(&json!({"data": "text"}), &[]).is_none());
        assert!(render_table(&json!({"data": []}), &[]).is_some());
    }

    #[test]
    fn test_format_nested_values() {
        assert_eq!(format_value(&json!(["a", 1, true])), "a, 1, true");
        assert_eq!(format_value(&Value::Null), "");
        assert_eq!(format_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
    }
}
