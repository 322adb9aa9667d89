//! Policy attributes given on the command line

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use baas_core::resource::{Value, json_object_to_attributes, set_path};
use clap::Args;

#[derive(Debug, Clone, Default, Args)]
pub struct PolicyInput {
    /// JSON file with policy attributes (snake_case keys)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Set an attribute by dotted path, e.g. backup_policy.regular.retention.duration=30
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Policy description
    #[arg(long)]
    pub description: Option<String>,

    /// WORM mode of the policy (Administrative or Compliance)
    #[arg(long)]
    pub data_lock: Option<String>,
}

impl PolicyInput {
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Attributes from `--file` alone, or an empty map
    pub fn file_attributes(&self) -> Result<HashMap<String, Value>, String> {
        match &self.file {
            Some(path) => read_attributes_file(path),
            None => Ok(HashMap::new()),
        }
    }

    /// Lay `--set`, `--description` and `--data-lock` over `base`
    pub fn overlay(&self, base: &mut HashMap<String, Value>) -> Result<(), String> {
        for assignment in &self.set {
            let (path, raw) = parse_assignment(assignment)?;
            set_path(base, path, Value::parse_scalar(raw))?;
        }
        if let Some(description) = &self.description {
            base.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(mode) = &self.data_lock {
            base.insert("data_lock".to_string(), Value::String(mode.clone()));
        }
        Ok(())
    }

    /// File attributes with every override applied
    pub fn attributes(&self) -> Result<HashMap<String, Value>, String> {
        let mut attributes = self.file_attributes()?;
        self.overlay(&mut attributes)?;
        Ok(attributes)
    }
}

// =============================================================================
// Query arguments
// =============================================================================

pub fn put_string(attributes: &mut HashMap<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        attributes.insert(key.to_string(), Value::String(value.clone()));
    }
}

pub fn put_int(attributes: &mut HashMap<String, Value>, key: &str, value: Option<i64>) {
    if let Some(value) = value {
        attributes.insert(key.to_string(), Value::Int(value));
    }
}

/// Repeated flags become a list; none at all leaves the key absent
pub fn put_list(attributes: &mut HashMap<String, Value>, key: &str, values: &[String]) {
    if !values.is_empty() {
        let items = values.iter().map(|v| Value::String(v.clone())).collect();
        attributes.insert(key.to_string(), Value::List(items));
    }
}

/// Switches are only sent when given
pub fn put_flag(attributes: &mut HashMap<String, Value>, key: &str, set: bool) {
    if set {
        attributes.insert(key.to_string(), Value::Bool(true));
    }
}

fn read_attributes_file(path: &Path) -> Result<HashMap<String, Value>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    match json {
        serde_json::Value::Object(map) => Ok(json_object_to_attributes(&map)),
        _ => Err(format!("{} must contain a JSON object", path.display())),
    }
}

/// Split `path=value` at the first `=`
fn parse_assignment(assignment: &str) -> Result<(&str, &str), String> {
    match assignment.split_once('=') {
        Some((path, value)) if !path.trim().is_empty() => Ok((path.trim(), value)),
        _ => Err(format!(
            "Invalid --set '{}': expected PATH=VALUE",
            assignment
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_builds_nested_blocks() {
        let input = PolicyInput {
            set: vec![
                "backup_policy.regular.incremental.schedule.unit=Days".to_string(),
                "backup_policy.regular.incremental.schedule.day_schedule.frequency=1".to_string(),
                "backup_policy.regular.retention.unit=Weeks".to_string(),
                "backup_policy.regular.retention.duration=4".to_string(),
                "is_cbs_enabled=true".to_string(),
            ],
            ..Default::default()
        };

        let attributes = input.attributes().unwrap();
        let regular = attributes["backup_policy"].as_map().unwrap()["regular"]
            .as_map()
            .unwrap();
        let retention = regular["retention"].as_map().unwrap();
        assert_eq!(retention["unit"], Value::String("Weeks".to_string()));
        assert_eq!(retention["duration"], Value::Int(4));
        assert_eq!(attributes["is_cbs_enabled"], Value::Bool(true));
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let input = PolicyInput {
            set: vec!["description=a=b".to_string()],
            ..Default::default()
        };
        let attributes = input.attributes().unwrap();
        assert_eq!(attributes["description"], Value::String("a=b".to_string()));
    }

    #[test]
    fn malformed_assignment_is_rejected() {
        for bad in ["no-equals", "=value"] {
            let input = PolicyInput {
                set: vec![bad.to_string()],
                ..Default::default()
            };
            assert!(input.attributes().unwrap_err().contains("PATH=VALUE"));
        }
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.json");
        fs::write(
            &path,
            r#"{
                "description": "from file",
                "data_lock": "Administrative",
                "backup_policy": {"regular": {"retention": {"unit": "Days", "duration": 7}}},
                "remote_target_policy": null
            }"#,
        )
        .unwrap();

        let input = PolicyInput {
            file: Some(path),
            set: vec!["backup_policy.regular.retention.duration=14".to_string()],
            data_lock: Some("Compliance".to_string()),
            ..Default::default()
        };

        let attributes = input.attributes().unwrap();
        assert_eq!(
            attributes["description"],
            Value::String("from file".to_string())
        );
        assert_eq!(
            attributes["data_lock"],
            Value::String("Compliance".to_string())
        );
        let retention = attributes["backup_policy"].as_map().unwrap()["regular"]
            .as_map()
            .unwrap()["retention"]
            .as_map()
            .unwrap();
        assert_eq!(retention["duration"], Value::Int(14));
        assert!(!attributes.contains_key("remote_target_policy"));
    }

    #[test]
    fn file_must_hold_an_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.json");
        fs::write(&path, "[1, 2]").unwrap();

        let input = PolicyInput {
            file: Some(path),
            ..Default::default()
        };
        assert!(input.attributes().unwrap_err().contains("JSON object"));
    }

    #[test]
    fn set_through_scalar_fails() {
        let input = PolicyInput {
            set: vec![
                "description=text".to_string(),
                "description.inner=1".to_string(),
            ],
            ..Default::default()
        };
        assert!(input.attributes().is_err());
    }
}
