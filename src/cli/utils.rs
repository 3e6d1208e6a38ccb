use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a list of rows: JSON as-is, text as one `id  name` line per row
pub fn output_rows(output_format: &OutputFormat, collection_name: &str, rows: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: rows }))?);
        }
        OutputFormat::Text => {
            let rows = rows.as_array().map(Vec::as_slice).unwrap_or_default();
            if rows.is_empty() {
                println!("No {} found", collection_name);
            }
            for row in rows {
                println!("{}", row_line(row));
            }
        }
    }
    Ok(())
}

/// Output a single object: JSON pretty-printed, text as `key: value` lines
pub fn output_object(output_format: &OutputFormat, object: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(object)?),
        OutputFormat::Text => {
            if let Some(map) = object.as_object() {
                for (key, value) in map {
                    println!("{}: {}", key, plain(value));
                }
            }
        }
    }
    Ok(())
}

fn row_line(row: &Value) -> String {
    let id = row.get("id").map(plain).unwrap_or_default();
    let name = row.get("name").map(plain).unwrap_or_default();
    let mut line = format!("{:>6}  {}", id, name);
    if let Some(minutes) = row.get("time_minutes") {
        line.push_str(&format!("  ({} min, {})", plain(minutes), row.get("price").map(plain).unwrap_or_default()));
    }
    line
}

/// Strings without quotes, everything else as compact JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lines() {
        assert_eq!(row_line(&json!({"id": 3, "name": "Kale"})), "     3  Kale");
        assert_eq!(
            row_line(&json!({"id": 12, "name": "Chili", "time_minutes": 30, "price": "5.50"})),
            "    12  Chili  (30 min, 5.50)"
        );
    }
}
