//! # PetClinic Load Test CLI
//!
//! ```bash
//! # All scenarios, settings from petclinic.toml when present
//! petclinic-loadtest suite
//!
//! # One scenario against another host
//! petclinic-loadtest --host http://staging:8080 run --scenario B --duration 120
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use petclinic_core::Scenario;
use petclinic_loadtest::{run_scenario, run_suite, LoadTestConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "petclinic-loadtest")]
#[command(version)]
#[command(about = "Weighted synthetic users for the PetClinic REST API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file
    #[arg(short, long, default_value = "petclinic.toml")]
    config: PathBuf,

    /// PetClinic base URL
    #[arg(long, env = "PETCLINIC_HOST")]
    host: Option<String>,

    /// Directory for result CSV files
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Runs per scenario
    #[arg(short, long)]
    runs: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario
    Run {
        /// Scenario: A (light), B (moderate) or C (peak)
        #[arg(short, long)]
        scenario: Scenario,

        /// Concurrent users
        #[arg(short, long)]
        users: Option<usize>,

        /// Users started per second
        #[arg(long)]
        spawn_rate: Option<f64>,

        /// Duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Run all three scenarios
    Suite,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = LoadTestConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(dir) = cli.results_dir {
        config.results_dir = dir;
    }
    if let Some(runs) = cli.runs {
        config.runs = runs;
    }

    match cli.command {
        Some(Commands::Run {
            scenario,
            users,
            spawn_rate,
            duration,
        }) => {
            let profile = config.profile_mut(scenario);
            if let Some(users) = users {
                profile.users = users;
            }
            if let Some(spawn_rate) = spawn_rate {
                profile.spawn_rate = spawn_rate;
            }
            if let Some(duration) = duration {
                profile.duration_secs = duration;
            }
            config.validate()?;

            let files = run_scenario(&config, scenario).await?;
            info!("{} runs of {} written", files.len(), scenario);
        }
        Some(Commands::Suite) | None => {
            config.validate()?;
            run_suite(&config).await?;
        }
    }

    Ok(())
}
