//! `baas policy` commands

use std::collections::HashMap;

use clap::{Args, Subcommand};
use colored::Colorize;

use baas_core::differ::{self, Diff};
use baas_core::provider::Provider;
use baas_core::resource::{Resource, ResourceId, State, Value};
use baas_provider_ibm::models::ProtectionPolicy;
use baas_provider_ibm::schemas::{PROTECTION_POLICIES, PROTECTION_POLICY};
use baas_provider_ibm::{IbmBackupProvider, policy_from_attributes, policy_warnings};

use crate::config::Config;
use crate::display::{confirm, format_attributes, format_value, print_diff, print_warnings};
use crate::input::{PolicyInput, put_flag, put_list, put_string};
use crate::session::StateSession;

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Create a protection policy
    Create {
        /// Policy name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        input: PolicyInput,
    },

    /// Show a protection policy
    Get {
        /// Policy name
        name: String,

        /// Server id; defaults to the id in the state file, then to a lookup by name
        #[arg(long)]
        id: Option<String>,
    },

    /// Replace a protection policy (full PUT)
    Update {
        /// Policy name
        name: String,

        #[command(flatten)]
        input: PolicyInput,
    },

    /// Delete a protection policy
    Delete {
        /// Policy name
        name: String,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },

    /// Check policy attributes without contacting the service
    Validate {
        /// Policy name (defaults to the `name` attribute)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        input: PolicyInput,
    },

    /// Create or update a policy to match the given attributes
    Apply {
        /// Policy name
        name: String,

        #[command(flatten)]
        input: PolicyInput,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },

    /// List protection policies
    List(ListArgs),
}

/// Filters of `baas policy list`
#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Only policies with this name (repeatable)
    #[arg(long = "policy-name")]
    pub policy_names: Vec<String>,

    /// Only policies with this id (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Only policies of this type, e.g. Regular or Internal (repeatable)
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Only policies of this tenant (repeatable)
    #[arg(long = "tenant")]
    pub tenant_ids: Vec<String>,

    #[arg(long)]
    pub include_tenants: bool,

    #[arg(long)]
    pub exclude_linked_policies: bool,

    #[arg(long)]
    pub include_replicated_policies: bool,

    #[arg(long)]
    pub include_stats: bool,

    /// Caller kind sent as the requestInitiatorType header (UIUser, UIAuto, Helios)
    #[arg(long)]
    pub request_initiator_type: Option<String>,

    /// Print the full documents as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    fn to_query(&self) -> Resource {
        let mut attributes = HashMap::new();
        put_list(&mut attributes, "policy_names", &self.policy_names);
        put_list(&mut attributes, "ids", &self.ids);
        put_list(&mut attributes, "types", &self.types);
        put_list(&mut attributes, "tenant_ids", &self.tenant_ids);
        put_flag(&mut attributes, "include_tenants", self.include_tenants);
        put_flag(
            &mut attributes,
            "exclude_linked_policies",
            self.exclude_linked_policies,
        );
        put_flag(
            &mut attributes,
            "include_replicated_policies",
            self.include_replicated_policies,
        );
        put_flag(&mut attributes, "include_stats", self.include_stats);
        put_string(
            &mut attributes,
            "request_initiator_type",
            &self.request_initiator_type,
        );

        Resource::new(PROTECTION_POLICIES, "cli")
            .with_attributes(attributes)
            .with_read_only(true)
    }
}

pub async fn run_policy_command(command: PolicyCommands, config: &Config) -> Result<(), String> {
    match command {
        PolicyCommands::Create { name, input } => run_create(config, &name, &input).await,
        PolicyCommands::Get { name, id } => run_get(config, &name, id).await,
        PolicyCommands::Update { name, input } => run_update(config, &name, &input).await,
        PolicyCommands::Delete { name, auto_approve } => {
            run_delete(config, &name, auto_approve).await
        }
        PolicyCommands::Validate { name, input } => run_validate(name.as_deref(), &input),
        PolicyCommands::Apply {
            name,
            input,
            auto_approve,
        } => run_apply(config, &name, &input, auto_approve).await,
        PolicyCommands::List(args) => run_list(config, &args).await,
    }
}

fn policy_id(name: &str) -> ResourceId {
    ResourceId::new(PROTECTION_POLICY, name)
}

/// Asks before a destructive step; answered from stdin unless auto-approved
type Approve<'a> = &'a (dyn Fn(&str, &str) -> Result<bool, String> + Sync);

fn approval(auto_approve: bool) -> impl Fn(&str, &str) -> Result<bool, String> + Sync {
    move |question: &str, hint: &str| {
        if auto_approve {
            Ok(true)
        } else {
            confirm(question, hint)
        }
    }
}

async fn connect(config: &Config) -> Result<IbmBackupProvider, String> {
    let client_config = config.client_config()?;
    IbmBackupProvider::connect(client_config)
        .await
        .map_err(|e| e.to_string())
}

/// Validate locally and print the advisory warnings
fn check(id: &ResourceId, attributes: &HashMap<String, Value>) -> Result<ProtectionPolicy, String> {
    let policy = policy_from_attributes(id, attributes).map_err(|e| e.to_string())?;
    print_warnings(&policy_warnings(&policy));
    Ok(policy)
}

fn with_name(mut attributes: HashMap<String, Value>, name: &str) -> HashMap<String, Value> {
    attributes
        .entry("name".to_string())
        .or_insert_with(|| Value::String(name.to_string()));
    attributes
}

// =============================================================================
// Validate
// =============================================================================

fn run_validate(name: Option<&str>, input: &PolicyInput) -> Result<(), String> {
    let attributes = input.attributes()?;
    let name = name
        .map(str::to_string)
        .or_else(|| {
            attributes
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .ok_or("Policy name is missing: pass --name or set the name attribute")?;

    let id = policy_id(&name);
    let policy = check(&id, &with_name(attributes, &name))?;

    println!(
        "{} {}",
        "✓".green().bold(),
        format!("Policy '{}' is valid.", policy.name).green()
    );
    Ok(())
}

// =============================================================================
// Create / Get
// =============================================================================

async fn run_create(config: &Config, name: &str, input: &PolicyInput) -> Result<(), String> {
    let id = policy_id(name);
    let mut attributes = input.attributes()?;
    attributes.insert("name".to_string(), Value::String(name.to_string()));
    check(&id, &attributes)?;

    let provider = connect(config).await?;
    let mut session = StateSession::open(&config.backend_config(), "policy create").await?;
    let result = create(&provider, &mut session, &id, attributes).await;
    let closed = session.close().await;
    result.and(closed)
}

async fn create(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    id: &ResourceId,
    attributes: HashMap<String, Value>,
) -> Result<(), String> {
    if let Some(identifier) = session.identifier_of(id) {
        return Err(format!(
            "Policy '{}' is already managed as {}; use update or apply",
            id.name, identifier
        ));
    }

    let resource = Resource::new(PROTECTION_POLICY, &id.name).with_attributes(attributes);
    let state = provider.create(&resource).await.map_err(|e| e.to_string())?;
    session.record(provider.name(), &state);

    println!(
        "  {} Created {} ({})",
        "✓".green(),
        id.to_string().bold(),
        state.identifier.as_deref().unwrap_or("-")
    );
    Ok(())
}

async fn run_get(config: &Config, name: &str, id_flag: Option<String>) -> Result<(), String> {
    let id = policy_id(name);
    let provider = connect(config).await?;
    let mut session = StateSession::open(&config.backend_config(), "policy get").await?;

    let result = get(&provider, &mut session, &id, id_flag).await;
    let closed = session.close().await;
    let state = result?;
    closed?;

    if !state.exists {
        println!("{}", format!("Policy '{}' not found.", name).yellow());
        return Ok(());
    }

    println!(
        "{} {}",
        id.to_string().cyan().bold(),
        state.identifier.as_deref().unwrap_or("-")
    );
    println!("{}", format_attributes(&state.attributes));
    Ok(())
}

async fn get(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    id: &ResourceId,
    id_flag: Option<String>,
) -> Result<State, String> {
    match id_flag {
        // An explicit id is looked at, not adopted
        Some(identifier) => provider
            .read(id, Some(identifier.as_str()))
            .await
            .map_err(|e| e.to_string()),
        None => read_current(provider, session, id).await,
    }
}

/// Read the policy through the stored id, falling back to a lookup by name
async fn read_current(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    id: &ResourceId,
) -> Result<State, String> {
    let identifier = session.identifier_of(id);
    let state = provider
        .read(id, identifier.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    session.record(provider.name(), &state);
    Ok(state)
}

// =============================================================================
// Update / Apply
// =============================================================================

async fn run_update(config: &Config, name: &str, input: &PolicyInput) -> Result<(), String> {
    let provider = connect(config).await?;
    let mut session = StateSession::open(&config.backend_config(), "policy update").await?;
    let result = update(&provider, &mut session, name, input).await;
    let closed = session.close().await;
    result.and(closed)
}

async fn update(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    name: &str,
    input: &PolicyInput,
) -> Result<(), String> {
    let id = policy_id(name);
    let current = read_current(provider, session, &id).await?;
    if !current.exists {
        return Err(format!("Policy '{}' not found", name));
    }

    // Without a file the current document is the base for --set
    let mut attributes = if input.has_file() {
        input.file_attributes()?
    } else {
        editable(&current.attributes)
    };
    input.overlay(&mut attributes)?;
    let attributes = with_name(attributes, name);
    check(&id, &attributes)?;

    // The PUT replaces the whole document, so it is sent even without changes
    let desired = Resource::new(PROTECTION_POLICY, name).with_attributes(attributes);
    match differ::diff_replacement(&desired, &current, ProtectionPolicy::COMPUTED) {
        Diff::NoChange(_) => println!("{}", "No attribute changes.".dimmed()),
        plan => print_plan(&plan),
    }
    write(provider, session, &current, &desired).await
}

async fn run_apply(
    config: &Config,
    name: &str,
    input: &PolicyInput,
    auto_approve: bool,
) -> Result<(), String> {
    let id = policy_id(name);
    let attributes = with_name(input.attributes()?, name);
    check(&id, &attributes)?;

    let provider = connect(config).await?;
    let mut session = StateSession::open(&config.backend_config(), "policy apply").await?;
    let result = apply(&provider, &mut session, &id, attributes, &approval(auto_approve)).await;
    let closed = session.close().await;
    result.and(closed)
}

async fn apply(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    id: &ResourceId,
    attributes: HashMap<String, Value>,
    approve: Approve<'_>,
) -> Result<(), String> {
    let current = read_current(provider, session, id).await?;
    let desired = Resource::new(PROTECTION_POLICY, &id.name).with_attributes(attributes);

    let plan = differ::diff_replacement(&desired, &current, ProtectionPolicy::COMPUTED);
    if !plan.is_change() {
        println!("{}", "No changes. Policy is up to date.".green());
        return Ok(());
    }

    print_plan(&plan);
    println!();
    if !approve(
        "Do you want to apply these changes?",
        "Only 'yes' will be accepted to approve.",
    )? {
        println!("{}", "Apply cancelled.".yellow());
        return Ok(());
    }

    match plan {
        Diff::Create(resource) => {
            let state = provider.create(&resource).await.map_err(|e| e.to_string())?;
            session.record(provider.name(), &state);
            println!(
                "  {} Created {} ({})",
                "✓".green(),
                id.to_string().bold(),
                state.identifier.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        Diff::Update { from, to, .. } => write(provider, session, &from, &to).await,
        Diff::NoChange(_) => Ok(()),
    }
}

async fn write(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    current: &State,
    desired: &Resource,
) -> Result<(), String> {
    let identifier = current
        .identifier
        .as_deref()
        .ok_or_else(|| format!("{} has no server id", desired.id))?;

    let state = provider
        .update(&desired.id, identifier, current, desired)
        .await
        .map_err(|e| e.to_string())?;
    session.record(provider.name(), &state);

    println!(
        "  {} Updated {} ({})",
        "✓".green(),
        desired.id.to_string().bold(),
        identifier
    );
    Ok(())
}

/// Current attributes minus the ones the server computes
fn editable(attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
    attributes
        .iter()
        .filter(|(key, _)| !ProtectionPolicy::COMPUTED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn print_plan(plan: &Diff) {
    match plan {
        Diff::Create(resource) => {
            println!("  {} {}", "+".green().bold(), resource.id.to_string().bold());
            for line in format_attributes(&resource.attributes).lines() {
                println!("    {}", line.green());
            }
        }
        Diff::Update {
            id,
            from,
            to,
            changed_attributes,
        } => {
            println!("  {} {}", "~".yellow().bold(), id.to_string().bold());
            for key in changed_attributes {
                print_diff(
                    key,
                    &format_value(from.attributes.get(key)),
                    &format_value(to.attributes.get(key)),
                );
            }
        }
        Diff::NoChange(_) => {}
    }
}

// =============================================================================
// Delete / List
// =============================================================================

async fn run_delete(config: &Config, name: &str, auto_approve: bool) -> Result<(), String> {
    let provider = connect(config).await?;
    let mut session = StateSession::open(&config.backend_config(), "policy delete").await?;
    let result = delete(&provider, &mut session, name, &approval(auto_approve)).await;
    let closed = session.close().await;
    result.and(closed)
}

async fn delete(
    provider: &IbmBackupProvider,
    session: &mut StateSession,
    name: &str,
    approve: Approve<'_>,
) -> Result<(), String> {
    let id = policy_id(name);
    let identifier = match session.identifier_of(&id) {
        Some(identifier) => identifier,
        None => match read_current(provider, session, &id).await?.identifier {
            Some(identifier) => identifier,
            None => {
                println!("{}", format!("Policy '{}' not found.", name).yellow());
                return Ok(());
            }
        },
    };

    println!("  {} {} ({})", "-".red().bold(), id.to_string().bold(), identifier);
    println!();
    if !approve(
        "Do you really want to delete this policy?",
        "This action cannot be undone. Type 'yes' to confirm.",
    )? {
        println!("{}", "Delete cancelled.".yellow());
        return Ok(());
    }

    provider
        .delete(&id, &identifier)
        .await
        .map_err(|e| e.to_string())?;
    session.forget(&id);

    println!("  {} Deleted {}", "✓".green(), id.to_string().bold());
    Ok(())
}

async fn run_list(config: &Config, args: &ListArgs) -> Result<(), String> {
    let provider = connect(config).await?;
    let state = provider
        .read_data_source(&args.to_query())
        .await
        .map_err(|e| e.to_string())?;

    let policies: &[Value] = match state.attributes.get("policies") {
        Some(Value::List(items)) => items.as_slice(),
        _ => &[],
    };

    if args.json {
        println!("{}", format_value(state.attributes.get("policies")));
        return Ok(());
    }
    if policies.is_empty() {
        println!("{}", "No policies found.".yellow());
        return Ok(());
    }

    for policy in policies.iter().filter_map(Value::as_map) {
        let field = |key: &str| policy.get(key).and_then(Value::as_str).unwrap_or("-");
        let lock = match policy.get("data_lock").and_then(Value::as_str) {
            Some(mode) => format!(" [{}]", mode).yellow().to_string(),
            None => String::new(),
        };
        println!("  • {} ({}){}", field("name").bold(), field("id"), lock);
    }
    println!();
    println!("{} policies", policies.len().to_string().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use baas_provider_ibm::{Auth, ClientConfig};
    use baas_state::BackendConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    const POLICY_PATH: &str = "/v2/data-protect/policies/7:1:42";

    async fn provider(server: &MockServer) -> IbmBackupProvider {
        IbmBackupProvider::connect(ClientConfig {
            endpoint: server.base_url(),
            tenant_id: "tenant-a".to_string(),
            auth: Auth::BearerToken("token-1".to_string()),
        })
        .await
        .unwrap()
    }

    /// A session whose state already tracks `daily` as 7:1:42
    async fn tracked_session(dir: &TempDir) -> StateSession {
        let config = BackendConfig::local(dir.path().join("s.json").to_string_lossy());
        let mut session = StateSession::open(&config, "test").await.unwrap();
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String("daily".to_string()));
        session.record(
            "ibm",
            &State::existing(policy_id("daily"), attributes).with_identifier("7:1:42"),
        );
        session
    }

    fn server_policy(description: Option<&str>, days: i64) -> serde_json::Value {
        let mut policy = json!({
            "id": "7:1:42",
            "name": "daily",
            "backupPolicy": {"regular": {"retention": {"unit": "Days", "duration": days}}},
            "isUsable": true,
            "numProtectionGroups": 2
        });
        if let Some(description) = description {
            policy["description"] = json!(description);
        }
        policy
    }

    fn yes(_: &str, _: &str) -> Result<bool, String> {
        Ok(true)
    }

    fn no(_: &str, _: &str) -> Result<bool, String> {
        Ok(false)
    }

    #[tokio::test]
    async fn update_without_file_keeps_current_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(POLICY_PATH);
                then.status(200).json_body(server_policy(Some("old"), 7));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path(POLICY_PATH).json_body(json!({
                    "name": "daily",
                    "description": "old",
                    "backupPolicy": {"regular": {"retention": {"unit": "Days", "duration": 14}}}
                }));
                then.status(200).json_body(server_policy(Some("old"), 14));
            })
            .await;

        let dir = tempdir().unwrap();
        let mut session = tracked_session(&dir).await;
        let input = PolicyInput {
            set: vec!["backup_policy.regular.retention.duration=14".to_string()],
            ..Default::default()
        };
        update(&provider(&server).await, &mut session, "daily", &input)
            .await
            .unwrap();
        session.close().await.unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn update_with_file_replaces_the_document() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(POLICY_PATH);
                then.status(200).json_body(server_policy(Some("old"), 7));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path(POLICY_PATH).json_body(json!({
                    "name": "daily",
                    "backupPolicy": {"regular": {"retention": {"unit": "Days", "duration": 7}}}
                }));
                then.status(200).json_body(server_policy(None, 7));
            })
            .await;

        let dir = tempdir().unwrap();
        let file = dir.path().join("policy.json");
        std::fs::write(
            &file,
            r#"{"backup_policy": {"regular": {"retention": {"unit": "Days", "duration": 7}}}}"#,
        )
        .unwrap();
        let mut session = tracked_session(&dir).await;
        let input = PolicyInput {
            file: Some(file),
            ..Default::default()
        };
        update(&provider(&server).await, &mut session, "daily", &input)
            .await
            .unwrap();
        session.close().await.unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn apply_creates_a_missing_policy() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/data-protect/policies")
                    .query_param("policyNames", "daily");
                then.status(200).json_body(json!({"policies": []}));
            })
            .await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/data-protect/policies").json_body(json!({
                    "name": "daily",
                    "backupPolicy": {"regular": {"retention": {"unit": "Days", "duration": 7}}}
                }));
                then.status(201).json_body(server_policy(None, 7));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(POLICY_PATH);
                then.status(200).json_body(server_policy(None, 7));
            })
            .await;

        let dir = tempdir().unwrap();
        let config = BackendConfig::local(dir.path().join("s.json").to_string_lossy());
        let mut session = StateSession::open(&config, "test").await.unwrap();
        let input = PolicyInput {
            set: vec![
                "backup_policy.regular.retention.unit=Days".to_string(),
                "backup_policy.regular.retention.duration=7".to_string(),
            ],
            ..Default::default()
        };
        let attributes = with_name(input.attributes().unwrap(), "daily");
        apply(
            &provider(&server).await,
            &mut session,
            &policy_id("daily"),
            attributes,
            &yes,
        )
        .await
        .unwrap();

        post.assert_async().await;
        assert_eq!(
            session.identifier_of(&policy_id("daily")).as_deref(),
            Some("7:1:42")
        );
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn apply_sends_removed_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(POLICY_PATH);
                then.status(200).json_body(server_policy(Some("old"), 7));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path(POLICY_PATH).json_body(json!({
                    "name": "daily",
                    "backupPolicy": {"regular": {"retention": {"unit": "Days", "duration": 7}}}
                }));
                then.status(200).json_body(server_policy(None, 7));
            })
            .await;

        let dir = tempdir().unwrap();
        let mut session = tracked_session(&dir).await;
        let input = PolicyInput {
            set: vec![
                "backup_policy.regular.retention.unit=Days".to_string(),
                "backup_policy.regular.retention.duration=7".to_string(),
            ],
            ..Default::default()
        };
        let attributes = with_name(input.attributes().unwrap(), "daily");
        apply(
            &provider(&server).await,
            &mut session,
            &policy_id("daily"),
            attributes,
            &yes,
        )
        .await
        .unwrap();
        session.close().await.unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn apply_leaves_a_matching_policy_alone() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(POLICY_PATH);
                then.status(200).json_body(server_policy(Some("old"), 7));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path(POLICY_PATH);
                then.status(200).json_body(server_policy(Some("old"), 7));
            })
            .await;

        let dir = tempdir().unwrap();
        let mut session = tracked_session(&dir).await;
        let input = PolicyInput {
            set: vec![
                "backup_policy.regular.retention.unit=Days".to_string(),
                "backup_policy.regular.retention.duration=7".to_string(),
            ],
            description: Some("old".to_string()),
            ..Default::default()
        };
        let attributes = with_name(input.attributes().unwrap(), "daily");
        apply(
            &provider(&server).await,
            &mut session,
            &policy_id("daily"),
            attributes,
            &yes,
        )
        .await
        .unwrap();
        session.close().await.unwrap();

        put.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn delete_forgets_the_state_entry() {
        let server = MockServer::start_async().await;
        let delete_mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path(POLICY_PATH);
                then.status(204);
            })
            .await;

        let dir = tempdir().unwrap();
        let mut session = tracked_session(&dir).await;
        delete(&provider(&server).await, &mut session, "daily", &yes)
            .await
            .unwrap();

        delete_mock.assert_async().await;
        assert_eq!(session.identifier_of(&policy_id("daily")), None);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let server = MockServer::start_async().await;
        let delete_mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path(POLICY_PATH);
                then.status(204);
            })
            .await;

        let dir = tempdir().unwrap();
        let mut session = tracked_session(&dir).await;
        delete(&provider(&server).await, &mut session, "daily", &no)
            .await
            .unwrap();

        delete_mock.assert_hits_async(0).await;
        assert_eq!(
            session.identifier_of(&policy_id("daily")).as_deref(),
            Some("7:1:42")
        );
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_with_explicit_id_keeps_the_tracked_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/data-protect/policies/9:9:9");
                then.status(404).body("not found");
            })
            .await;

        let dir = tempdir().unwrap();
        let mut session = tracked_session(&dir).await;
        let state = get(
            &provider(&server).await,
            &mut session,
            &policy_id("daily"),
            Some("9:9:9".to_string()),
        )
        .await
        .unwrap();

        assert!(!state.exists);
        assert_eq!(
            session.identifier_of(&policy_id("daily")).as_deref(),
            Some("7:1:42")
        );
        session.close().await.unwrap();
    }

    #[test]
    fn list_args_become_query_attributes() {
        let args = ListArgs {
            policy_names: vec!["gold".to_string()],
            include_stats: true,
            ..Default::default()
        };
        let query = args.to_query();

        assert!(query.is_data_source());
        assert_eq!(query.id.resource_type, PROTECTION_POLICIES);
        assert_eq!(
            query.attributes["policy_names"],
            Value::List(vec![Value::String("gold".to_string())])
        );
        assert_eq!(query.attributes["include_stats"], Value::Bool(true));
        assert!(!query.attributes.contains_key("ids"));
        assert!(!query.attributes.contains_key("include_tenants"));
    }

    #[test]
    fn editable_drops_computed_fields() {
        let mut attributes = HashMap::new();
        attributes.insert("id".to_string(), Value::String("7:1:42".to_string()));
        attributes.insert("num_protection_groups".to_string(), Value::Int(3));
        attributes.insert("name".to_string(), Value::String("gold".to_string()));

        let editable = editable(&attributes);
        assert_eq!(editable.len(), 1);
        assert!(editable.contains_key("name"));
    }

    #[test]
    fn name_is_filled_in_only_when_missing() {
        let attributes = with_name(HashMap::new(), "gold");
        assert_eq!(attributes["name"], Value::String("gold".to_string()));

        let mut given = HashMap::new();
        given.insert("name".to_string(), Value::String("silver".to_string()));
        assert_eq!(
            with_name(given, "gold")["name"],
            Value::String("silver".to_string())
        );
    }

    #[test]
    fn validate_reports_bad_data_lock() {
        let input = PolicyInput {
            set: vec![
                "backup_policy.regular.retention.unit=Days".to_string(),
                "backup_policy.regular.retention.duration=7".to_string(),
            ],
            data_lock: Some("Forever".to_string()),
            ..Default::default()
        };
        let err = run_validate(Some("gold"), &input).unwrap_err();
        assert!(err.contains("Forever"), "{}", err);

        let input = PolicyInput {
            data_lock: Some("Compliance".to_string()),
            ..input
        };
        run_validate(Some("gold"), &input).unwrap();
    }

    #[test]
    fn validate_needs_a_name() {
        let err = run_validate(None, &PolicyInput::default()).unwrap_err();
        assert!(err.contains("name"));
    }
}
