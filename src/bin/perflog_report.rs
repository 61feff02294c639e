//! Report builder for GKE storage benchmark runs
//!
//! Parses a workload configuration for FIO or DLIO workloads, downloads
//! their logs, and appends the per-epoch metrics of every scenario to a CSV
//! report.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use perflog::prelude::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "perflog-report")]
#[command(about = "Aggregate storage benchmark logs into a CSV report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ignore PERFLOG_* environment variables and start from built-in defaults
    #[arg(long, global = true, conflicts_with = "config")]
    no_env: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report FIO test outputs
    Fio(ReportArgs),
    /// Report DLIO test outputs
    Dlio(ReportArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// JSON configuration file defining the workloads that were run
    #[arg(long)]
    workload_config: PathBuf,

    /// Project number (e.g. 93817472919) used to fetch CPU and memory usage
    #[arg(long)]
    project_number: String,

    /// Unique ID of the test run
    #[arg(long)]
    instance_id: String,

    /// Local directory the logs are downloaded to
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Output CSV file, appended to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parse logs already on disk without downloading
    #[arg(long)]
    skip_download: bool,

    /// Do not look up CPU and memory usage
    #[arg(long)]
    no_usage: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("perflog={0},perflog_core={0},perflog_common={0}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = ConfigSource::select(cli.config.clone(), cli.no_env);
    let mut config = load_config(source).context("Failed to load report configuration")?;

    let (family, args) = match cli.command {
        Commands::Fio(args) => (Family::Fio, args),
        Commands::Dlio(args) => (Family::Dlio, args),
    };

    if let Some(logs_dir) = args.logs_dir {
        config.logs_dir = Some(logs_dir);
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if args.skip_download {
        config.skip_download = true;
    }
    if args.no_usage {
        config.usage = UsageMode::Disabled;
    }

    let workloads = WorkloadSet::from_file(&args.workload_config)
        .with_context(|| format!("Failed to parse workload config {}", args.workload_config.display()))?;
    info!(
        "🚀 Building {:?} report for run {} ({} FIO, {} DLIO workloads)",
        family,
        args.instance_id,
        workloads.fio.len(),
        workloads.dlio.len()
    );

    let request = ReportRequest {
        family,
        workloads: &workloads,
        instance_id: &args.instance_id,
        project_number: &args.project_number,
        config: &config,
    };
    let rows = run_report(&request, &GcloudFetcher::new())
        .with_context(|| format!("Failed to write report to {}", config.output.display()))?;

    info!("Done: {} rows", rows);
    Ok(())
}
