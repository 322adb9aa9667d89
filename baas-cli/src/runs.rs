//! `baas runs` commands

use std::collections::HashMap;

use clap::{Args, Subcommand};
use colored::Colorize;

use baas_core::provider::Provider;
use baas_core::resource::{Resource, Value};
use baas_provider_ibm::IbmBackupProvider;
use baas_provider_ibm::schemas::PROTECTION_GROUP_RUNS;

use crate::config::Config;
use crate::display::{format_usecs, format_value};
use crate::input::{put_flag, put_int, put_list, put_string};

#[derive(Subcommand)]
pub enum RunsCommands {
    /// List runs of a protection group
    List(RunsArgs),
}

#[derive(Debug, Default, Args)]
pub struct RunsArgs {
    /// Protection group id
    #[arg(long)]
    pub group_id: String,

    #[arg(long)]
    pub run_id: Option<String>,

    /// Runs started after this time (microseconds since the epoch)
    #[arg(long, value_name = "USECS")]
    pub start_time: Option<i64>,

    /// Runs started before this time (microseconds since the epoch)
    #[arg(long, value_name = "USECS")]
    pub end_time: Option<i64>,

    /// Local backup status, e.g. Succeeded or Failed (repeatable)
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    #[arg(long = "replication-status")]
    pub replication_statuses: Vec<String>,

    #[arg(long = "archival-status")]
    pub archival_statuses: Vec<String>,

    #[arg(long = "cloud-spin-status")]
    pub cloud_spin_statuses: Vec<String>,

    /// Maximum number of runs to return
    #[arg(long)]
    pub num_runs: Option<i64>,

    /// Run type, e.g. kRegular, kFull, kLog (repeatable)
    #[arg(long = "run-type")]
    pub run_types: Vec<String>,

    #[arg(long = "run-tag")]
    pub run_tags: Vec<String>,

    #[arg(long = "snapshot-target-type")]
    pub snapshot_target_types: Vec<String>,

    #[arg(long = "tenant")]
    pub tenant_ids: Vec<String>,

    #[arg(long)]
    pub include_tenants: bool,

    #[arg(long)]
    pub include_object_details: bool,

    #[arg(long)]
    pub exclude_non_restorable_runs: bool,

    #[arg(long)]
    pub use_cached_data: bool,

    /// Apply the time range to end times instead of start times
    #[arg(long)]
    pub filter_by_end_time: bool,

    #[arg(long)]
    pub only_return_successful_copy_run: bool,

    #[arg(long)]
    pub filter_by_copy_task_end_time: bool,

    /// Caller kind sent as the requestInitiatorType header
    #[arg(long)]
    pub request_initiator_type: Option<String>,

    /// Print the full run documents as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunsArgs {
    fn to_query(&self) -> Resource {
        let mut attributes = HashMap::new();
        attributes.insert(
            "protection_group_id".to_string(),
            Value::String(self.group_id.clone()),
        );
        put_string(&mut attributes, "run_id", &self.run_id);
        put_int(&mut attributes, "start_time_usecs", self.start_time);
        put_int(&mut attributes, "end_time_usecs", self.end_time);
        put_int(&mut attributes, "num_runs", self.num_runs);
        put_list(&mut attributes, "local_backup_run_status", &self.statuses);
        put_list(
            &mut attributes,
            "replication_run_status",
            &self.replication_statuses,
        );
        put_list(&mut attributes, "archival_run_status", &self.archival_statuses);
        put_list(
            &mut attributes,
            "cloud_spin_run_status",
            &self.cloud_spin_statuses,
        );
        put_list(&mut attributes, "run_types", &self.run_types);
        put_list(&mut attributes, "run_tags", &self.run_tags);
        put_list(
            &mut attributes,
            "snapshot_target_types",
            &self.snapshot_target_types,
        );
        put_list(&mut attributes, "tenant_ids", &self.tenant_ids);
        put_flag(&mut attributes, "include_tenants", self.include_tenants);
        put_flag(
            &mut attributes,
            "include_object_details",
            self.include_object_details,
        );
        put_flag(
            &mut attributes,
            "exclude_non_restorable_runs",
            self.exclude_non_restorable_runs,
        );
        put_flag(&mut attributes, "use_cached_data", self.use_cached_data);
        put_flag(&mut attributes, "filter_by_end_time", self.filter_by_end_time);
        put_flag(
            &mut attributes,
            "only_return_successful_copy_run",
            self.only_return_successful_copy_run,
        );
        put_flag(
            &mut attributes,
            "filter_by_copy_task_end_time",
            self.filter_by_copy_task_end_time,
        );
        put_string(
            &mut attributes,
            "request_initiator_type",
            &self.request_initiator_type,
        );

        Resource::new(PROTECTION_GROUP_RUNS, "cli")
            .with_attributes(attributes)
            .with_read_only(true)
    }
}

pub async fn run_runs_command(command: RunsCommands, config: &Config) -> Result<(), String> {
    match command {
        RunsCommands::List(args) => run_list(config, &args).await,
    }
}

async fn run_list(config: &Config, args: &RunsArgs) -> Result<(), String> {
    let provider = IbmBackupProvider::connect(config.client_config()?)
        .await
        .map_err(|e| e.to_string())?;
    let state = provider
        .read_data_source(&args.to_query())
        .await
        .map_err(|e| e.to_string())?;

    if args.json {
        println!("{}", format_value(state.attributes.get("runs")));
        return Ok(());
    }

    let runs: Vec<&HashMap<String, Value>> = match state.attributes.get("runs") {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_map).collect(),
        _ => Vec::new(),
    };
    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
        return Ok(());
    }

    for run in &runs {
        println!("{}", run_line(run));
    }

    println!();
    match state.attributes.get("total_runs").and_then(Value::as_int) {
        Some(total) => println!(
            "{} of {} runs",
            runs.len().to_string().bold(),
            total.to_string().bold()
        ),
        None => println!("{} runs", runs.len().to_string().bold()),
    }
    Ok(())
}

/// One summary line: id, status, type and start time of the local backup
fn run_line(run: &HashMap<String, Value>) -> String {
    let id = run.get("id").and_then(Value::as_str).unwrap_or("-");
    let backup = run
        .get("local_backup_info")
        .or_else(|| run.get("original_backup_info"))
        .and_then(Value::as_map);
    let info = |key: &str| backup.and_then(|b| b.get(key));

    let status = info("status").and_then(Value::as_str).unwrap_or("Unknown");
    let colored_status = match status {
        "Succeeded" | "SucceededWithWarning" => status.green(),
        "Failed" | "Canceled" => status.red(),
        "Running" | "Accepted" | "Canceling" => status.cyan(),
        _ => status.normal(),
    };
    let run_type = info("run_type").and_then(Value::as_str).unwrap_or("-");
    let started = info("start_time_usecs")
        .and_then(Value::as_int)
        .map(format_usecs)
        .unwrap_or_else(|| "-".to_string());

    format!("  • {} {} {} {}", id.bold(), colored_status, run_type, started)
}
