use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reclaimer_core::app::{ReclaimerBuilder, SweepScheduler};
use reclaimer_core::config::ReclaimerConfig;

/// Background reclamation of task directories and expired backups.
#[derive(Parser, Debug)]
#[command(name = "reclaimer", version, about)]
struct Cli {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sweep loop until interrupted.
    Run,
    /// Queue the given task directories, run one sweep and print its report.
    Sweep {
        /// Task working directory to clean (repeatable).
        #[arg(long = "task")]
        tasks: Vec<PathBuf>,
    },
    /// Print the persisted pending deletions.
    Status,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ReclaimerConfig> {
    match path {
        Some(path) => ReclaimerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ReclaimerConfig::default()),
    }
}

async fn run(scheduler: SweepScheduler) -> anyhow::Result<()> {
    scheduler.start().await;
    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("shutdown requested");
    scheduler.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // stdout は JSON 出力用に空けておく
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let scheduler = ReclaimerBuilder::new(config)
        .build()
        .await
        .context("building reclaimer")?;

    match cli.command {
        Command::Run => run(scheduler).await,
        Command::Sweep { tasks } => {
            for task in tasks {
                scheduler.reclaimer().submit_task_deletion(task);
            }
            let report = scheduler.run_sweep_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Status => {
            let pending = scheduler.reclaimer().pending();
            println!("{}", serde_json::to_string_pretty(&pending)?);
            Ok(())
        }
    }
}
