//! Query arguments of the list endpoints

use baas_core::attr_model;
use serde::Serialize;

attr_model! {
    /// Filters of `GET /protection-groups/{id}/runs`
    pub struct RunsQuery {
        pub protection_group_id: String,
        /// Sent as the `requestInitiatorType` header
        pub request_initiator_type: Option<String>,
        pub run_id: Option<String>,
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub tenant_ids: Option<Vec<String>>,
        pub include_tenants: Option<bool>,
        pub run_types: Option<Vec<String>>,
        pub include_object_details: Option<bool>,
        pub local_backup_run_status: Option<Vec<String>>,
        pub replication_run_status: Option<Vec<String>>,
        pub archival_run_status: Option<Vec<String>>,
        pub cloud_spin_run_status: Option<Vec<String>>,
        pub num_runs: Option<i64>,
        pub exclude_non_restorable_runs: Option<bool>,
        pub run_tags: Option<Vec<String>>,
        pub use_cached_data: Option<bool>,
        pub filter_by_end_time: Option<bool>,
        pub snapshot_target_types: Option<Vec<String>>,
        pub only_return_successful_copy_run: Option<bool>,
        pub filter_by_copy_task_end_time: Option<bool>,
    }
}

impl RunsQuery {
    pub fn new(protection_group_id: impl Into<String>) -> Self {
        Self {
            protection_group_id: protection_group_id.into(),
            ..Default::default()
        }
    }

    /// Query string parameters; the group id goes in the path
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        query_pairs_of(self, &["protectionGroupId", "requestInitiatorType"])
    }
}

attr_model! {
    /// Filters of `GET /policies`
    pub struct PoliciesQuery {
        /// Sent as the `requestInitiatorType` header
        pub request_initiator_type: Option<String>,
        pub ids: Option<Vec<String>>,
        pub policy_names: Option<Vec<String>>,
        pub tenant_ids: Option<Vec<String>>,
        pub include_tenants: Option<bool>,
        pub types: Option<Vec<String>>,
        pub exclude_linked_policies: Option<bool>,
        pub include_replicated_policies: Option<bool>,
        pub include_stats: Option<bool>,
    }
}

impl PoliciesQuery {
    /// Lookup of a single policy by name
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            policy_names: Some(vec![name.into()]),
            ..Default::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        query_pairs_of(self, &["requestInitiatorType"])
    }
}

/// Flatten a query model into `(wireName, value)` pairs.
///
/// Absent fields are skipped by the model's serializer; lists are
/// comma-joined.
fn query_pairs_of<T: Serialize>(query: &T, skip: &[&str]) -> Vec<(String, String)> {
    let map = match serde_json::to_value(query) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return Vec::new(),
    };

    let mut pairs: Vec<(String, String)> = map
        .into_iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .filter_map(|(key, value)| query_value(&value).map(|v| (key, v)))
        .collect();
    pairs.sort();
    pairs
}

fn query_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(query_value).collect();
            Some(parts.join(","))
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baas_core::attrs::AttrBlock;
    use baas_core::resource::Value;
    use std::collections::HashMap;

    #[test]
    fn runs_query_emits_only_set_params() {
        let query = RunsQuery {
            local_backup_run_status: Some(vec!["Succeeded".to_string()]),
            num_runs: Some(10),
            ..RunsQuery::new("g1")
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("localBackupRunStatus".to_string(), "Succeeded".to_string()),
                ("numRuns".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn lists_are_comma_joined_and_header_param_is_skipped() {
        let query = RunsQuery {
            request_initiator_type: Some("UIUser".to_string()),
            run_types: Some(vec!["kRegular".to_string(), "kFull".to_string()]),
            include_object_details: Some(true),
            ..RunsQuery::new("g1")
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("includeObjectDetails".to_string(), "true".to_string()),
                ("runTypes".to_string(), "kRegular,kFull".to_string()),
            ]
        );
    }

    #[test]
    fn runs_query_requires_group_id() {
        let mut attrs = HashMap::new();
        attrs.insert("num_runs".to_string(), Value::Int(5));
        let err = RunsQuery::from_attrs(&attrs).unwrap_err();
        assert_eq!(err.path(), "protection_group_id");
    }

    #[test]
    fn policies_query_by_name() {
        let query = PoliciesQuery::by_name("daily-policy");
        assert_eq!(
            query.query_pairs(),
            vec![("policyNames".to_string(), "daily-policy".to_string())]
        );
    }
}
