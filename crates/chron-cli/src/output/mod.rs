use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_key_value(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Print pre-built table rows with the terminal preferences applied.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }
    println!("{}", table::render_table(headers, rows, table_options()));
}

fn table_options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

/// Objects become a `key | value` table with nested objects flattened to
/// dotted keys; anything else is a single cell.
fn render_key_value<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let value = serde_json::to_value(value)?;
    let mut rows = Vec::new();
    match value {
        Value::Object(_) => flatten("", &value, &mut rows),
        scalar => rows.push(vec![String::from("value"), value_to_cell(&scalar)]),
    }
    rows.sort_by(|a, b| a[0].cmp(&b[0]));
    Ok(table::render_table(&["key", "value"], &rows, table_options()))
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<Vec<String>>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, nested, rows);
            }
        }
        other => rows.push(vec![prefix.to_string(), value_to_cell(other)]),
    }
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Inner {
        page_size: u32,
    }

    #[derive(Serialize)]
    struct Example {
        id: &'static str,
        timeline: Inner,
    }

    const EXAMPLE: Example = Example {
        id: "x",
        timeline: Inner { page_size: 25 },
    };

    #[test]
    fn json_render_is_valid_json() {
        let out = render(&EXAMPLE, OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["id"], "x");
        assert_eq!(parsed["timeline"]["page_size"], 25);
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let out = render(&EXAMPLE, OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn table_render_flattens_nested_keys() {
        let out = render(&EXAMPLE, OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("key"));
        assert!(lines[2].starts_with("id"));
        assert!(lines[3].starts_with("timeline.page_size"));
        assert!(lines[3].ends_with("25"));
    }
}
