// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("depsync")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Depsync Contributors")
        .about("Keep project package dependencies in step with their published versions")
        .subcommand_required(false)
        .subcommand(
            Command::new("update")
                .about("Update manifest dependencies to the versions a package depends on")
                .arg(
                    Arg::new("package")
                        .short('p')
                        .long("package")
                        .required(true)
                        .help("Root package version identifier or alias"),
                )
                .arg(
                    Arg::new("manifest")
                        .short('m')
                        .long("manifest")
                        .default_value("sfdx-project.json")
                        .help("Manifest path"),
                )
                .arg(
                    Arg::new("directory")
                        .short('d')
                        .long("directory")
                        .help("Package directory to update (default: the first one)"),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .env("DEPSYNC_JOBS")
                        .default_value("8")
                        .help("Maximum concurrent dependency fetches"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(clap::ArgAction::SetTrue)
                        .help("Resolve and report without writing the manifest"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(clap::ArgAction::SetTrue)
                        .help("Print the result as JSON"),
                )
                .arg(
                    Arg::new("instance_url")
                        .long("instance-url")
                        .env("DEPSYNC_INSTANCE_URL")
                        .required(true)
                        .help("Distribution service instance URL"),
                )
                .arg(
                    Arg::new("access_token")
                        .long("access-token")
                        .env("DEPSYNC_ACCESS_TOKEN")
                        .hide_env_values(true)
                        .required(true)
                        .help("Access token of an authenticated session"),
                )
                .arg(
                    Arg::new("api_version")
                        .long("api-version")
                        .env("DEPSYNC_API_VERSION")
                        .default_value("59.0")
                        .help("Tooling API version"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .env("DEPSYNC_TIMEOUT")
                        .value_name("SECONDS")
                        .default_value("30")
                        .help("Per-request timeout in seconds"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("depsync.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
