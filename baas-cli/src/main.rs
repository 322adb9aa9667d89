mod config;
mod display;
mod input;
mod policy;
mod runs;
mod session;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;

use crate::config::{Config, ConfigArgs};
use crate::policy::{PolicyCommands, run_policy_command};
use crate::runs::{RunsCommands, run_runs_command};

#[derive(Parser)]
#[command(name = "baas")]
#[command(about = "Manage IBM Cloud Backup & Recovery protection policies", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage protection policies
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },

    /// Inspect protection group runs
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = Config::load(&cli.config)?;
    match cli.command {
        Commands::Policy { command } => run_policy_command(command, &config).await,
        Commands::Runs { command } => run_runs_command(command, &config).await,
    }
}

fn init_logging(verbose: u8) {
    let level = if verbose > 0 {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use baas_core::resource::Value;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_policy_create() {
        let cli = Cli::try_parse_from([
            "baas",
            "policy",
            "create",
            "--name",
            "daily-policy",
            "--set",
            "backup_policy.regular.retention.duration=30",
            "--data-lock",
            "Compliance",
            "--endpoint",
            "https://backup.example",
        ])
        .unwrap();

        assert_eq!(
            cli.config.endpoint.as_deref(),
            Some("https://backup.example")
        );
        match cli.command {
            Commands::Policy {
                command: PolicyCommands::Create { name, input },
            } => {
                assert_eq!(name, "daily-policy");
                assert_eq!(input.data_lock.as_deref(), Some("Compliance"));
                let attributes = input.attributes().unwrap();
                assert!(attributes.contains_key("backup_policy"));
                assert_eq!(attributes["data_lock"], Value::String("Compliance".to_string()));
            }
            _ => panic!("Expected policy create"),
        }
    }

    #[test]
    fn parses_runs_list_with_repeated_flags() {
        let cli = Cli::try_parse_from([
            "baas",
            "-v",
            "runs",
            "list",
            "--group-id",
            "g1",
            "--status",
            "Succeeded",
            "--status",
            "Failed",
            "--num-runs",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Runs {
                command: RunsCommands::List(args),
            } => {
                assert_eq!(args.group_id, "g1");
                assert_eq!(args.statuses, vec!["Succeeded", "Failed"]);
                assert_eq!(args.num_runs, Some(10));
            }
            _ => panic!("Expected runs list"),
        }
    }

    #[test]
    fn runs_list_requires_group_id() {
        assert!(Cli::try_parse_from(["baas", "runs", "list"]).is_err());
    }

    #[test]
    fn delete_takes_auto_approve() {
        let cli =
            Cli::try_parse_from(["baas", "policy", "delete", "gold", "--auto-approve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Policy {
                command: PolicyCommands::Delete {
                    auto_approve: true,
                    ..
                }
            }
        ));
    }
}
