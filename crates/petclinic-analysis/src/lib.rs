//! # PetClinic Results Aggregator
//!
//! Reads the per-run statistics files the load driver leaves in the
//! results directory and condenses them into per-scenario means.
//!
//! ## Features
//!
//! - Discovers every `*_stats.csv`, classifies it by its `cenario_A|B|C` marker
//! - Scenario means of response times, throughput, totals and success rate
//! - Per-endpoint means for the tracked PetClinic endpoints
//! - Two summary CSV tables and eight bar charts (PNG or SVG)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use petclinic_analysis::{analyze, AnalysisConfig};
//!
//! let report = analyze(&AnalysisConfig::default())?;
//! for row in &report.summary.aggregate {
//!     println!("{}: {:?} ms", row.scenario, row.avg_response_time);
//! }
//! ```

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod discovery;
pub mod output;
pub mod reader;

use std::path::{Path, PathBuf};

use petclinic_core::{HarnessError, Result};
use tracing::{debug, info, warn};

pub use aggregate::{AggregateRow, EndpointRow, MeanAccumulator, Pivot, Summary};
pub use charts::{find_font, summary_charts, BarChart, BarSeries, ChartFormat, ChartRenderer};
pub use config::AnalysisConfig;
pub use discovery::{discover_result_files, STATS_SUFFIX};
pub use output::{print_summary, write_tables, TableFiles, AGGREGATE_TABLE, ENDPOINT_TABLE};
pub use reader::{read_run, AggregateSample, EndpointSample, RunResult};

/// Everything one analysis produced
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub tables: TableFiles,
    /// Empty when charts were disabled or no font was available
    pub charts: Vec<PathBuf>,
}

/// Read and average every scenario run in `dir`.
///
/// Fails with [`HarnessError::NoInputFiles`] when the directory holds no
/// statistics file of any scenario.
pub fn process_results(dir: &Path) -> Result<Summary> {
    let files = discover_result_files(dir)?;
    debug!("{} stats files in {}", files.len(), dir.display());

    let mut runs = Vec::with_capacity(files.len());
    for file in &files {
        match read_run(file)? {
            Some(run) => runs.push(run),
            None => debug!("Skipping {}: no scenario marker", file.display()),
        }
    }

    if runs.is_empty() {
        return Err(HarnessError::NoInputFiles {
            dir: dir.to_path_buf(),
        });
    }

    info!("Read {} runs from {}", runs.len(), dir.display());
    Ok(Summary::from_runs(&runs))
}

/// Summarise the results directory, then write tables and charts into it
pub fn analyze(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let summary = process_results(&config.results_dir)?;

    let tables = write_tables(&config.results_dir, &summary)?;
    info!(
        "Tables written: {}, {}",
        tables.aggregate.display(),
        tables.endpoints.display()
    );
    print_summary(&summary);

    let charts = if !config.charts {
        Vec::new()
    } else if let Some(font) = config.chart_font()? {
        ChartRenderer::new(&config.results_dir, config.chart_format, &font)?
            .render_summary(&summary)?
    } else {
        warn!("No TrueType font found, charts skipped (set --font)");
        Vec::new()
    };

    Ok(AnalysisReport {
        summary,
        tables,
        charts,
    })
}
