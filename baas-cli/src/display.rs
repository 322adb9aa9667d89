//! Terminal output helpers

use std::collections::HashMap;

use baas_core::resource::{Value, attributes_to_json_object, value_to_json};
use chrono::DateTime;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Attributes as pretty-printed JSON with sorted keys
pub fn format_attributes(attributes: &HashMap<String, Value>) -> String {
    let object = serde_json::Value::Object(attributes_to_json_object(attributes));
    serde_json::to_string_pretty(&sorted(object)).unwrap_or_default()
}

/// A single value as pretty JSON, `null` when absent
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        Some(value) => serde_json::to_string_pretty(&sorted(value_to_json(value)))
            .unwrap_or_default(),
        None => "null".to_string(),
    }
}

fn sorted(json: serde_json::Value) -> serde_json::Value {
    match json {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sorted).collect())
        }
        other => other,
    }
}

/// Line diff of `before` and `after` under a heading
pub fn print_diff(heading: &str, before: &str, after: &str) {
    println!("  {} {}:", "~".yellow().bold(), heading);

    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("    {}{}", sign, change);
        if change.missing_newline() {
            println!();
        }
    }
}

/// Policy warnings, printed and logged
pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        log::warn!("{}", warning);
        println!("  {} {}", "!".yellow().bold(), warning.yellow());
    }
}

/// Microseconds since the epoch as a UTC timestamp
pub fn format_usecs(usecs: i64) -> String {
    DateTime::from_timestamp_micros(usecs)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| usecs.to_string())
}

/// Ask for `yes` on stdin. Returns whether the user confirmed.
pub fn confirm(question: &str, detail: &str) -> Result<bool, String> {
    println!("{}", question.yellow().bold());
    println!("  {}", detail.yellow());
    print!("\n  Enter a value: ");
    std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();

    Ok(input.trim() == "yes")
}
