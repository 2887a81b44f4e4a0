use serde_json::Value;
use std::io;

use super::{flatten, format_scalar};

/// Write output as two-column `field,value` CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let fields = match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => flatten(result),
            _ => flatten(map),
        },
        _ => vec![("value".to_string(), value.clone())],
    };

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in fields {
        let _ = wtr.write_record([key, format_scalar(&val)]);
    }
    let _ = wtr.flush();
}
