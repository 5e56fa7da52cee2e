pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a leaf JSON value as display text.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Pull the row array out of a result payload, if it has one.
pub(crate) fn find_rows(value: &Value) -> Option<&Vec<Value>> {
    let body = value.get("result").unwrap_or(value);
    match body {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => map.get("rows").and_then(Value::as_array),
        _ => None,
    }
}
