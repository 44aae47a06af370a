//! hostspec CLI - inspect a host the way resource checks see it
//!
//! Builds one system context per run, then reports the detected environment,
//! the listening-port table, or the observations of individual checks.

mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hostspec_core::application::{Capabilities, SystemContext};
use hostspec_core::domain::{EnvironmentProfile, PackageOverride, ResourceKind};
use hostspec_core::RunConfig;
use hostspec_infra_system::live_adapters;

const DEFAULT_LOG_FILTER: &str = "hostspec=warn";

/// Exit code when at least one check could not be determined
const CHECK_FAILED_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "hostspec")]
#[command(about = "Host environment detection and resource checks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Force the package manager instead of detecting it (rpm or deb)
    #[arg(long, global = true)]
    package: Option<PackageOverride>,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "HOSTSPEC_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, env = "HOSTSPEC_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected environment and the selected strategies
    Env {
        #[arg(long)]
        json: bool,
    },

    /// Show listening sockets and their owning processes
    Ports {
        #[arg(long)]
        json: bool,
    },

    /// Run checks of one kind and print their observations as JSON lines
    Check {
        /// Resource kind (package, service, port, file, addr, user, group, command, dns, process, include-file)
        kind: ResourceKind,

        /// Identifiers to check
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Serialize)]
struct EnvReport {
    profile: EnvironmentProfile,
    capabilities: Capabilities,
    package_override: Option<PackageOverride>,
    control_channel: Option<String>,
}

#[derive(Tabled)]
struct EnvRow {
    #[tabled(rename = "Property")]
    property: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Port")]
    key: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "PID")]
    pid: String,
    #[tabled(rename = "Process")]
    process: String,
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // stdout carries reports; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn env_report(ctx: &SystemContext) -> EnvReport {
    EnvReport {
        profile: ctx.profile(),
        capabilities: ctx.capabilities(),
        package_override: ctx.config().package,
        control_channel: ctx.control_channel().map(|c| c.endpoint().to_string()),
    }
}

fn print_env(report: &EnvReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let rows = vec![
        EnvRow {
            property: "init system",
            value: report.profile.init_system.to_string(),
        },
        EnvRow {
            property: "package manager",
            value: report.profile.package_manager.to_string(),
        },
        EnvRow {
            property: "package override",
            value: report
                .package_override
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
        },
        EnvRow {
            property: "package strategy",
            value: report.capabilities.package.to_string(),
        },
        EnvRow {
            property: "service strategy",
            value: report.capabilities.service.to_string(),
        },
        EnvRow {
            property: "control channel",
            value: report
                .control_channel
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        },
    ];

    println!("{}", "Host Environment".cyan().bold());
    println!("{}", Table::new(rows));
    Ok(())
}

async fn print_ports(ctx: &SystemContext, json: bool) -> Result<()> {
    let table = ctx.ports().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&*table)?);
        return Ok(());
    }

    if table.is_empty() {
        println!("{}", "No listening sockets found".yellow());
        return Ok(());
    }

    let rows: Vec<PortRow> = table
        .sorted()
        .into_iter()
        .map(|(key, owner)| PortRow {
            key: key.to_string(),
            address: owner.local_addr.to_string(),
            pid: owner.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            process: owner.name.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!(
        "{} ({} scanned at {})",
        "Listening Ports".cyan().bold(),
        table.len(),
        table.scanned_at.to_rfc3339()
    );
    println!("{}", Table::new(rows));
    Ok(())
}

/// Runs every check concurrently; true when all of them were determined
async fn run_checks(ctx: &Arc<SystemContext>, kind: ResourceKind, ids: &[String]) -> Result<bool> {
    let checks: Vec<_> = ids.iter().map(|id| ctx.new_resource(kind, id)).collect();
    let results = futures::future::join_all(checks.iter().map(|check| check.exists())).await;

    let mut all_determined = true;
    for (check, result) in checks.iter().zip(results) {
        match result {
            Ok(observation) => println!("{}", serde_json::to_string(&observation)?),
            Err(e) => {
                all_determined = false;
                eprintln!("{} {} {}: {}", "✗".red(), check.kind(), check.id(), e);
            }
        }
    }
    Ok(all_determined)
}

fn build_context(config: RunConfig) -> Result<Arc<SystemContext>> {
    let adapters = live_adapters(&config);
    SystemContext::build(config, adapters).map_err(|e| {
        if e.is_fatal() {
            error!(error = %e, "Cannot continue without the init system control channel");
        }
        anyhow::Error::new(e).context("failed to initialize system context")
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let config = settings::load(cli.config.as_deref(), cli.package)
        .context("failed to load configuration")?;
    debug!(config = ?config, "Configuration loaded");

    let ctx = build_context(config)?;

    match cli.command {
        Commands::Env { json } => print_env(&env_report(&ctx), json)?,
        Commands::Ports { json } => print_ports(&ctx, json).await?,
        Commands::Check { kind, ids } => {
            if !run_checks(&ctx, kind, &ids).await? {
                return Ok(ExitCode::from(CHECK_FAILED_EXIT));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
