//! IBM Backup & Recovery provider implementation
//!
//! Turns resources into calls of the [`BackupRecoveryClient`] and responses
//! back into states. Policies are managed resources; runs and policy
//! listings are data sources whose state is the query result.

use std::collections::HashMap;

use baas_core::attrs::AttrBlock;
use baas_core::provider::{ProviderError, ProviderResult};
use baas_core::resource::{Resource, ResourceId, State, Value};
use baas_core::schema::ResourceSchema;

use crate::client::{BackupRecoveryClient, ClientConfig, ClientError};
use crate::models::{PoliciesQuery, ProtectionPolicy, RunsQuery};
use crate::schemas;

/// IBM Cloud Backup & Recovery provider
pub struct IbmBackupProvider {
    client: BackupRecoveryClient,
}

impl IbmBackupProvider {
    pub fn new(client: BackupRecoveryClient) -> Self {
        Self { client }
    }

    /// Connect the underlying client (and exchange the API key, if any)
    pub async fn connect(config: ClientConfig) -> ProviderResult<Self> {
        let client = BackupRecoveryClient::connect(config)
            .await
            .map_err(|e| ProviderError::new(e.to_string()).with_cause(e))?;
        Ok(Self::new(client))
    }

    // =========================================================================
    // Protection policies
    // =========================================================================

    /// Read a policy by server id, or by name when no id is known
    pub async fn read_policy(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return match self.find_policy_by_name(id).await? {
                Some(policy) => policy_state(id, policy, None),
                None => Ok(State::not_found(id.clone())),
            };
        };

        match self.client.get_protection_policy_by_id(identifier).await {
            Ok(policy) => policy_state(id, policy, Some(identifier)),
            Err(e) if e.is_not_found() => {
                log::warn!("{} ({}) no longer exists", id, identifier);
                Ok(State::not_found(id.clone()))
            }
            Err(e) => Err(api_error(id, e)),
        }
    }

    /// List policies named like the resource; adopt the single match
    async fn find_policy_by_name(&self, id: &ResourceId) -> ProviderResult<Option<ProtectionPolicy>> {
        let page = self
            .client
            .get_protection_policies(&PoliciesQuery::by_name(&id.name))
            .await
            .map_err(|e| api_error(id, e))?;

        let mut matches: Vec<ProtectionPolicy> = page
            .policies
            .into_iter()
            .filter(|p| p.name == id.name)
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => {
                log::info!("Found existing policy for {} by name", id);
                Ok(matches.pop())
            }
            n => Err(ProviderError::new(format!(
                "{} policies are named '{}', cannot choose one",
                n, id.name
            ))
            .for_resource(id.clone())),
        }
    }

    pub async fn create_policy(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let policy = policy_from_attributes(id, &resource.attributes)?;

        let created = self
            .client
            .create_protection_policy(&policy)
            .await
            .map_err(|e| api_error(id, e))?;
        let Some(identifier) = created.id.clone() else {
            return Err(ProviderError::new("Create response carries no policy id")
                .for_resource(id.clone()));
        };
        log::info!("Created {} as {}", id, identifier);

        self.read_back(id, &identifier, created).await
    }

    pub async fn update_policy(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        let policy = policy_from_attributes(id, &to.attributes)?;

        let updated = self
            .client
            .update_protection_policy(identifier, &policy)
            .await
            .map_err(|e| api_error(id, e))?;
        log::info!("Updated {} ({})", id, identifier);

        self.read_back(id, identifier, updated).await
    }

    /// Re-read after a write so the state carries the computed fields
    async fn read_back(
        &self,
        id: &ResourceId,
        identifier: &str,
        written: ProtectionPolicy,
    ) -> ProviderResult<State> {
        let state = self.read_policy(id, Some(identifier)).await?;
        if state.exists {
            Ok(state)
        } else {
            policy_state(id, written, Some(identifier))
        }
    }

    /// Delete a policy; one that is already gone counts as deleted
    pub async fn delete_policy(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match self.client.delete_protection_policy(identifier).await {
            Ok(()) => {
                log::info!("Deleted {} ({})", id, identifier);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                log::warn!("{} ({}) was already deleted", id, identifier);
                Ok(())
            }
            Err(e) => Err(api_error(id, e)),
        }
    }

    // =========================================================================
    // Data sources
    // =========================================================================

    /// List one page of runs of a protection group
    pub async fn read_runs(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        validate(id, &schemas::protection_group_runs(), &query.attributes)?;
        let runs_query = RunsQuery::from_attrs(&query.attributes).map_err(|e| mapping_error(id, e))?;

        let page = self
            .client
            .get_protection_group_runs(&runs_query)
            .await
            .map_err(|e| api_error(id, e))?;

        let mut attributes = query.attributes.clone();
        attributes.insert(
            "runs".to_string(),
            Value::List(page.runs.iter().map(|r| Value::Map(r.to_attrs())).collect()),
        );
        if let Some(total) = page.total_runs {
            attributes.insert("total_runs".to_string(), Value::Int(total));
        }
        Ok(data_source_state(id, attributes))
    }

    /// List protection policies matching the filters
    pub async fn read_policies(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        validate(id, &schemas::protection_policies(), &query.attributes)?;
        let policies_query =
            PoliciesQuery::from_attrs(&query.attributes).map_err(|e| mapping_error(id, e))?;

        let page = self
            .client
            .get_protection_policies(&policies_query)
            .await
            .map_err(|e| api_error(id, e))?;

        let mut attributes = query.attributes.clone();
        attributes.insert(
            "policies".to_string(),
            Value::List(
                page.policies
                    .iter()
                    .map(|p| Value::Map(p.to_attrs()))
                    .collect(),
            ),
        );
        Ok(data_source_state(id, attributes))
    }
}

/// Validate user attributes and build the request document.
///
/// `name` defaults to the resource name. Nothing is sent over the network.
pub fn policy_from_attributes(
    id: &ResourceId,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<ProtectionPolicy> {
    let mut attributes = attributes.clone();
    attributes
        .entry("name".to_string())
        .or_insert_with(|| Value::String(id.name.clone()));

    validate(id, &schemas::protection_policy(), &attributes)?;
    ProtectionPolicy::from_attrs(&attributes).map_err(|e| mapping_error(id, e))
}

fn validate(
    id: &ResourceId,
    schema: &ResourceSchema,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<()> {
    schema.validate(attributes).map_err(|errors| {
        let lines: Vec<String> = errors.iter().map(|e| format!("  {}", e)).collect();
        ProviderError::new(format!("Invalid configuration:\n{}", lines.join("\n")))
            .for_resource(id.clone())
    })
}

fn policy_state(
    id: &ResourceId,
    policy: ProtectionPolicy,
    identifier: Option<&str>,
) -> ProviderResult<State> {
    let identifier = match (policy.id.as_deref(), identifier) {
        (Some(server_id), _) => server_id.to_string(),
        (None, Some(known)) => known.to_string(),
        (None, None) => {
            return Err(ProviderError::new("Policy carries no id").for_resource(id.clone()));
        }
    };
    Ok(State::existing(id.clone(), policy.to_attrs()).with_identifier(identifier))
}

/// Data sources have no server identity; the read time stands in for one
fn data_source_state(id: &ResourceId, attributes: HashMap<String, Value>) -> State {
    State::existing(id.clone(), attributes).with_identifier(chrono::Utc::now().to_string())
}

fn api_error(id: &ResourceId, err: ClientError) -> ProviderError {
    ProviderError::new(err.to_string())
        .for_resource(id.clone())
        .with_cause(err)
}

fn mapping_error(id: &ResourceId, err: baas_core::attrs::MappingError) -> ProviderError {
    ProviderError::new(err.to_string())
        .for_resource(id.clone())
        .with_cause(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Auth;
    use baas_core::resource::{json_object_to_attributes, value_to_json};
    use httpmock::prelude::*;
    use serde_json::json;

    async fn provider(server: &MockServer) -> IbmBackupProvider {
        IbmBackupProvider::connect(ClientConfig {
            endpoint: server.base_url(),
            tenant_id: "tenant-a/".to_string(),
            auth: Auth::BearerToken("token-1".to_string()),
        })
        .await
        .unwrap()
    }

    fn attrs(config: serde_json::Value) -> HashMap<String, Value> {
        json_object_to_attributes(config.as_object().unwrap())
    }

    fn daily_policy() -> serde_json::Value {
        json!({
            "name": "daily-policy",
            "backup_policy": {
                "regular": {
                    "incremental": {"schedule": {"unit": "Days", "day_schedule": {"frequency": 1}}},
                    "retention": {"unit": "Months", "duration": 3}
                }
            }
        })
    }

    fn daily_policy_wire(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": "daily-policy",
            "backupPolicy": {
                "regular": {
                    "incremental": {"schedule": {"unit": "Days", "daySchedule": {"frequency": 1}}},
                    "retention": {"unit": "Months", "duration": 3}
                }
            },
            "isUsable": true,
            "numProtectionGroups": 0
        })
    }

    #[tokio::test]
    async fn create_sends_mapped_document_and_reads_back() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/data-protect/policies")
                    .json_body(json!({
                        "name": "daily-policy",
                        "backupPolicy": {
                            "regular": {
                                "incremental": {"schedule": {"unit": "Days", "daySchedule": {"frequency": 1}}},
                                "retention": {"unit": "Months", "duration": 3}
                            }
                        }
                    }));
                then.status(201).json_body(daily_policy_wire("7:1700000000:42"));
            })
            .await;
        let read = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/data-protect/policies/7:1700000000:42");
                then.status(200).json_body(daily_policy_wire("7:1700000000:42"));
            })
            .await;

        let provider = provider(&server).await;
        let resource = Resource::new("protection_policy", "daily-policy")
            .with_attributes(attrs(daily_policy()));
        let state = provider.create_policy(&resource).await.unwrap();

        create.assert_async().await;
        read.assert_async().await;
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("7:1700000000:42"));
        assert_eq!(state.attributes.get("is_usable"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn invalid_data_lock_never_reaches_the_api() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(500);
            })
            .await;

        let provider = provider(&server).await;
        let mut config = daily_policy();
        config["data_lock"] = json!("Permanent");
        let resource =
            Resource::new("protection_policy", "daily-policy").with_attributes(attrs(config));

        let err = provider.create_policy(&resource).await.unwrap_err();
        assert!(err.message.contains("Invalid enum variant 'Permanent'"));
        any.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn valid_data_lock_modes_are_sent() {
        for mode in ["Administrative", "Compliance"] {
            let server = MockServer::start_async().await;
            let create = server
                .mock_async(|when, then| {
                    when.method(POST)
                        .path("/v2/data-protect/policies")
                        .json_body_partial(json!({"dataLock": mode}).to_string());
                    then.status(201).json_body(daily_policy_wire("p1"));
                })
                .await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/v2/data-protect/policies/p1");
                    then.status(200).json_body(daily_policy_wire("p1"));
                })
                .await;

            let provider = provider(&server).await;
            let mut config = daily_policy();
            config["data_lock"] = json!(mode);
            let resource =
                Resource::new("protection_policy", "daily-policy").with_attributes(attrs(config));
            provider.create_policy(&resource).await.unwrap();
            create.assert_async().await;
        }
    }

    #[tokio::test]
    async fn read_404_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/data-protect/policies/gone");
                then.status(404).body(r#"{"message":"not found"}"#);
            })
            .await;

        let provider = provider(&server).await;
        let id = ResourceId::new("protection_policy", "daily-policy");
        let state = provider.read_policy(&id, Some("gone")).await.unwrap();
        assert!(!state.exists);
        assert_eq!(state.identifier, None);
    }

    #[tokio::test]
    async fn read_error_keeps_operation_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/data-protect/policies/p1");
                then.status(500).body("cluster unavailable");
            })
            .await;

        let provider = provider(&server).await;
        let id = ResourceId::new("protection_policy", "daily-policy");
        let err = provider.read_policy(&id, Some("p1")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "[protection_policy.daily-policy] GetProtectionPolicyByID failed 500\ncluster unavailable"
        );
    }

    #[tokio::test]
    async fn read_without_identifier_looks_up_by_name() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/data-protect/policies")
                    .query_param("policyNames", "daily-policy");
                then.status(200).json_body(json!({
                    "policies": [daily_policy_wire("p9")]
                }));
            })
            .await;

        let provider = provider(&server).await;
        let id = ResourceId::new("protection_policy", "daily-policy");
        let state = provider.read_policy(&id, None).await.unwrap();

        list.assert_async().await;
        assert_eq!(state.identifier.as_deref(), Some("p9"));
    }

    #[tokio::test]
    async fn update_puts_full_document() {
        let server = MockServer::start_async().await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/v2/data-protect/policies/p1")
                    .json_body_partial(
                        json!({"name": "daily-policy", "description": "three months"}).to_string(),
                    );
                then.status(200).json_body(daily_policy_wire("p1"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/data-protect/policies/p1");
                then.status(200).json_body(daily_policy_wire("p1"));
            })
            .await;

        let provider = provider(&server).await;
        let id = ResourceId::new("protection_policy", "daily-policy");
        let mut config = daily_policy();
        config["description"] = json!("three months");
        let to = Resource::new("protection_policy", "daily-policy").with_attributes(attrs(config));

        let state = provider.update_policy(&id, "p1", &to).await.unwrap();
        put.assert_async().await;
        assert_eq!(state.identifier.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn delete_of_missing_policy_succeeds() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v2/data-protect/policies/p1");
                then.status(404);
            })
            .await;

        let provider = provider(&server).await;
        let id = ResourceId::new("protection_policy", "daily-policy");
        provider.delete_policy(&id, "p1").await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn runs_data_source_carries_runs_and_total() {
        let server = MockServer::start_async().await;
        let runs = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/data-protect/protection-groups/g1/runs")
                    .query_param("localBackupRunStatus", "Succeeded")
                    .query_param("numRuns", "10");
                then.status(200).json_body(json!({
                    "runs": [{"id": "r1", "protectionGroupId": "g1",
                              "localBackupInfo": {"status": "Succeeded"}}],
                    "totalRuns": 1
                }));
            })
            .await;

        let provider = provider(&server).await;
        let query = Resource::new("protection_group_runs", "recent")
            .with_read_only(true)
            .with_attributes(attrs(json!({
                "protection_group_id": "g1",
                "local_backup_run_status": ["Succeeded"],
                "num_runs": 10
            })));
        let state = provider.read_runs(&query).await.unwrap();

        runs.assert_async().await;
        assert!(state.identifier.is_some());
        assert_eq!(state.attributes.get("total_runs"), Some(&Value::Int(1)));
        assert_eq!(
            value_to_json(&state.attributes["runs"]),
            json!([{"id": "r1", "protection_group_id": "g1",
                    "local_backup_info": {"status": "Succeeded"}}])
        );
    }

    #[tokio::test]
    async fn policies_data_source_lists_policies() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/data-protect/policies")
                    .query_param("types", "Regular,Internal")
                    .header("requestInitiatorType", "Helios");
                then.status(200).json_body(json!({
                    "policies": [daily_policy_wire("p1"), daily_policy_wire("p2")]
                }));
            })
            .await;

        let provider = provider(&server).await;
        let query = Resource::new("protection_policies", "all")
            .with_read_only(true)
            .with_attributes(attrs(json!({
                "types": ["Regular", "Internal"],
                "request_initiator_type": "Helios"
            })));
        let state = provider.read_policies(&query).await.unwrap();

        match &state.attributes["policies"] {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn worm_retention_round_trip() {
        let mut config = daily_policy();
        config["backup_policy"]["regular"]["retention"]["data_lock_config"] =
            json!({"mode": "Compliance", "unit": "Years", "duration": 2});
        let user = attrs(config);
        let id = ResourceId::new("protection_policy", "daily-policy");

        let policy = policy_from_attributes(&id, &user).unwrap();
        let wire = serde_json::to_value(&policy).unwrap();
        assert_eq!(
            wire["backupPolicy"]["regular"]["retention"]["dataLockConfig"],
            json!({"mode": "Compliance", "unit": "Years", "duration": 2})
        );
        assert_eq!(policy.to_attrs(), user);
    }

    #[test]
    fn name_defaults_to_resource_name() {
        let mut config = daily_policy();
        config.as_object_mut().unwrap().remove("name");
        let id = ResourceId::new("protection_policy", "from-id");
        let policy = policy_from_attributes(&id, &attrs(config)).unwrap();
        assert_eq!(policy.name, "from-id");
    }
}
