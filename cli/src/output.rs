//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                let value = serde_json::to_value(data).unwrap_or(Value::Null);
                print!("{}", render_table(&value));
            }
        }
    }
}

/// Columns every entity carries; list output stays scannable no matter how
/// wide the full attribute set is.
const LIST_COLUMNS: [&str; 3] = ["name", "state", "owner"];

/// Entity lists render as NAME/STATE/OWNER columns; a single entity renders
/// as an aligned attribute listing. Anything else falls back to pretty JSON.
fn render_table(value: &Value) -> String {
    match value {
        Value::Array(rows) => render_list(rows),
        Value::Object(attrs) => render_entity(attrs),
        other => format!("{}\n", serde_json::to_string_pretty(other).unwrap_or_default()),
    }
}

fn cell(row: &Value, key: &str) -> String {
    match row.get(key) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn render_list(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "(none)\n".to_string();
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| LIST_COLUMNS.iter().map(|col| cell(row, col)).collect())
        .collect();
    let mut widths: Vec<usize> = LIST_COLUMNS.iter().map(|col| col.len()).collect();
    for row in &cells {
        for (i, v) in row.iter().enumerate() {
            widths[i] = widths[i].max(v.len());
        }
    }

    let mut out = String::new();
    for (i, col) in LIST_COLUMNS.iter().enumerate() {
        out.push_str(&format!("{:<1$}  ", col.to_uppercase(), widths[i]));
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    for row in &cells {
        for (i, v) in row.iter().enumerate() {
            out.push_str(&format!("{:<1$}  ", v, widths[i]));
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }
    out
}

fn render_entity(attrs: &serde_json::Map<String, Value>) -> String {
    let width = attrs.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in attrs {
        let shown = match value {
            Value::Null => "-".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!("{:<width$}  {}\n", key, shown));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_renders_fixed_columns() {
        let rows = json!([
            { "name": "alice.cluster1", "state": "validated", "owner": "alice", "pubtoken": "xyz" },
            { "name": "bob.cluster2", "state": "new", "owner": "bob" },
        ]);
        let out = render_table(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[0].contains("STATE"));
        assert!(lines[0].contains("OWNER"));
        assert!(lines[1].starts_with("alice.cluster1"));
        assert!(lines[2].contains("bob"));
        // Extra attributes never widen the listing.
        assert!(!out.contains("xyz"));
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(render_table(&json!([])), "(none)\n");
    }

    #[test]
    fn entity_renders_aligned_attributes() {
        let entity = json!({ "name": "p1", "owner": "alice", "members": ["alice", "bob"], "url": null });
        let out = render_table(&entity);
        assert!(out.contains("name"));
        assert!(out.lines().any(|l| l.ends_with("[\"alice\",\"bob\"]")));
        // Null attributes show as a dash, not the word null.
        assert!(out.lines().any(|l| l.starts_with("url") && l.trim_end().ends_with('-')));
    }
}
