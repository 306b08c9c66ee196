// src/main.rs

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use depsync::config::{DEFAULT_API_VERSION, DEFAULT_JOBS, DEFAULT_TIMEOUT, ServiceConfig};
use depsync::manifest::DEFAULT_MANIFEST;
use depsync::repository::ToolingClient;
use depsync::update::{UpdateOptions, UpdateReport, update_dependencies};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "depsync")]
#[command(author, version, about = "Keep project package dependencies in step with their published versions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update manifest dependencies to the versions a package depends on
    Update {
        /// Root package version identifier or alias
        #[arg(short, long)]
        package: String,
        /// Manifest path
        #[arg(short, long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
        /// Package directory to update (default: the first one)
        #[arg(short, long)]
        directory: Option<String>,
        /// Maximum concurrent dependency fetches
        #[arg(short, long, env = "DEPSYNC_JOBS", default_value_t = DEFAULT_JOBS)]
        jobs: usize,
        /// Resolve and report without writing the manifest
        #[arg(long)]
        dry_run: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct ServiceArgs {
    /// Distribution service instance URL
    #[arg(long, env = "DEPSYNC_INSTANCE_URL")]
    instance_url: String,
    /// Access token of an authenticated session
    #[arg(long, env = "DEPSYNC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,
    /// Tooling API version
    #[arg(long, env = "DEPSYNC_API_VERSION", default_value = DEFAULT_API_VERSION)]
    api_version: String,
    /// Per-request timeout in seconds
    #[arg(long, env = "DEPSYNC_TIMEOUT", value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,
}

impl ServiceArgs {
    fn into_config(self) -> ServiceConfig {
        let mut config = ServiceConfig::new(self.instance_url, self.access_token);
        config.api_version = self.api_version;
        config.timeout = Duration::from_secs(self.timeout);
        config
    }
}

fn print_report(report: &UpdateReport, options: &UpdateOptions) {
    println!(
        "Resolved {} version {}",
        report.root.package_alias, report.root.package_version
    );

    if report.updates.is_empty() {
        println!("All dependencies are up to date.");
    }
    for update in &report.updates {
        match &update.previous_version {
            Some(previous) => println!(
                "  Updating {} from {} to version {}",
                update.package_alias, previous, update.pinned_version
            ),
            None => println!(
                "  Adding {} at version {}",
                update.package_alias, update.pinned_version
            ),
        }
    }
    for (alias, id) in &report.added_aliases {
        println!("  New alias: {} -> {}", alias, id);
    }
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }

    if report.written {
        println!("Updated manifest: {}", options.manifest_path.display());
    } else if options.dry_run && report.changed {
        println!("Dry run: {} not written", options.manifest_path.display());
    }
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Update {
            package,
            manifest,
            directory,
            jobs,
            dry_run,
            json,
            service,
        }) => {
            let config = service.into_config();
            info!("Connecting to {}", config.base_url());
            let client = ToolingClient::new(&config)?;

            let options = UpdateOptions {
                package,
                manifest_path: manifest,
                directory,
                max_concurrency: jobs,
                dry_run,
            };
            let report = update_dependencies(&client, &options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                for warning in &report.warnings {
                    eprintln!("Warning: {}", warning);
                }
            } else {
                print_report(&report, &options);
            }

            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "depsync", &mut std::io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("Depsync v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'depsync --help' for usage information");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_command() {
        let cli = Cli::try_parse_from([
            "depsync",
            "update",
            "--package",
            "04t000000000001AAA",
            "--instance-url",
            "https://example.my.salesforce.com",
            "--access-token",
            "token",
            "--timeout",
            "5",
            "--jobs",
            "2",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Update {
                package,
                manifest,
                jobs,
                dry_run,
                json,
                service,
                ..
            }) => {
                assert_eq!(package, "04t000000000001AAA");
                assert_eq!(manifest, PathBuf::from(DEFAULT_MANIFEST));
                assert_eq!(jobs, 2);
                assert!(dry_run);
                assert!(!json);

                let config = service.into_config();
                assert_eq!(config.timeout, Duration::from_secs(5));
                assert_eq!(config.api_version, DEFAULT_API_VERSION);
            }
            _ => panic!("expected update command"),
        }
    }

    #[test]
    fn test_update_requires_package() {
        let result = Cli::try_parse_from([
            "depsync",
            "update",
            "--instance-url",
            "https://example.my.salesforce.com",
            "--access-token",
            "token",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["depsync", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions {
                shell: clap_complete::Shell::Bash
            })
        ));
    }
}
