use serde_json::Value;
use std::io;

use super::{display, find_rows};

/// Emit the row array as CSV on stdout. Falls back to a two-column
/// field,value listing when the payload has no rows.
pub fn print_csv(value: &Value) {
    let mut writer = csv::Writer::from_writer(io::stdout());

    if let Some(rows) = find_rows(value) {
        if let Some(Value::Object(first)) = rows.first() {
            let headers: Vec<String> = first.keys().cloned().collect();
            let _ = writer.write_record(&headers);
            for row in rows {
                if let Value::Object(map) = row {
                    let record: Vec<String> = headers
                        .iter()
                        .map(|h| map.get(h).map(display).unwrap_or_default())
                        .collect();
                    let _ = writer.write_record(&record);
                }
            }
        }
    } else {
        let body = value.get("result").unwrap_or(value);
        if let Value::Object(map) = body {
            let _ = writer.write_record(["field", "value"]);
            for (key, val) in map.iter().filter(|(_, v)| !v.is_array() && !v.is_object()) {
                let _ = writer.write_record([key.as_str(), &display(val)]);
            }
        }
    }

    let _ = writer.flush();
}
