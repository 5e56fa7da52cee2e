use serde_json::Value;

use super::display;

/// One `key=value` line per scalar field; row arrays reduced to a count.
pub fn print_minimal(value: &Value) {
    let body = value.get("result").unwrap_or(value);
    if let Value::Object(map) = body {
        for (key, val) in map {
            match val {
                Value::Array(items) => println!("{key}={}", items.len()),
                Value::Object(_) => {}
                scalar => println!("{key}={}", display(scalar)),
            }
        }
    } else {
        println!("{}", display(body));
    }
}
