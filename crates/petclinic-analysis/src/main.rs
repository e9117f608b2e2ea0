//! # PetClinic Results Aggregator CLI
//!
//! ```bash
//! # Summarise ./results
//! petclinic-analysis
//!
//! # SVG charts with an explicit font
//! petclinic-analysis --chart-format svg --font /usr/share/fonts/TTF/DejaVuSans.ttf
//! ```

use std::path::PathBuf;

use clap::Parser;
use petclinic_analysis::{analyze, AnalysisConfig, ChartFormat};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "petclinic-analysis")]
#[command(version)]
#[command(about = "Summary tables and charts of PetClinic load test runs", long_about = None)]
struct Cli {
    /// Directory holding the *_stats.csv files
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Chart image format
    #[arg(long, value_enum, default_value_t = ChartFormat::Png)]
    chart_format: ChartFormat,

    /// TrueType font for chart text
    #[arg(long, env = "PETCLINIC_CHART_FONT")]
    font: Option<PathBuf>,

    /// Write tables only
    #[arg(long)]
    no_charts: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
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

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AnalysisConfig {
        results_dir: cli.results_dir,
        chart_format: cli.chart_format,
        font_path: cli.font,
        charts: !cli.no_charts,
    };

    match analyze(&config) {
        Ok(report) => {
            info!(
                "Analysis complete: {} scenarios, {} charts",
                report.summary.aggregate.len(),
                report.charts.len()
            );
            Ok(())
        }
        Err(e) if e.is_recoverable() => {
            println!("{}. Run the load tests first.", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
