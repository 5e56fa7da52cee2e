use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{display, find_rows};

/// Format output as tables: scalar fields first, then any row array as a
/// grid, then warnings from the computation envelope.
pub fn print_table(value: &Value) {
    let body = value.get("result").unwrap_or(value);

    if let Value::Object(map) = body {
        let scalars: Vec<(&String, &Value)> =
            map.iter().filter(|(_, v)| !v.is_array() && !v.is_object()).collect();
        if !scalars.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in scalars {
                builder.push_record([key.as_str(), &display(val)]);
            }
            println!("{}", Table::from(builder));
        }
    }

    if let Some(rows) = find_rows(value) {
        print_row_grid(rows);
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", display(warning));
            }
        }
    }
}

fn print_row_grid(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(display).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}
