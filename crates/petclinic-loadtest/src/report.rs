//! Run summaries: console report and CSV output

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use petclinic_core::{HarnessError, Result, Scenario, StatsRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::FailureRecord;

/// Outcome of one run of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenario: Scenario,
    pub run: u32,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub users: usize,
    /// Endpoint rows followed by the `Aggregated` row
    pub records: Vec<StatsRecord>,
    pub failures: Vec<FailureRecord>,
}

/// Files written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFiles {
    pub stats: PathBuf,
    pub failures: PathBuf,
}

impl RunSummary {
    /// The `Aggregated` row
    pub fn aggregated(&self) -> Option<&StatsRecord> {
        self.records.iter().find(|r| r.is_aggregated())
    }

    /// Write `<prefix>_stats.csv` and `<prefix>_failures.csv` into `dir`
    pub fn write(&self, dir: &Path) -> Result<RunFiles> {
        std::fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;

        let prefix = self.scenario.run_prefix(self.run);
        let files = RunFiles {
            stats: dir.join(format!("{}_stats.csv", prefix)),
            failures: dir.join(format!("{}_failures.csv", prefix)),
        };

        StatsRecord::write_all(&files.stats, &self.records)?;
        write_failures(&files.failures, &self.failures)?;

        info!("Results saved to {}", files.stats.display());
        Ok(files)
    }

    /// Print formatted report
    pub fn print_report(&self) {
        let Some(total) = self.aggregated() else {
            return;
        };

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!(
            "║  PETCLINIC LOAD TEST - {:<14} run {:<3}                   ║",
            self.scenario.label(),
            self.run
        );
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!(
            "║ Started:           {:<40} ║",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!(
            "║ Duration:          {:>10.2} seconds                        ║",
            self.duration_secs
        );
        println!(
            "║ Users:             {:>10}                                 ║",
            self.users
        );
        println!(
            "║ Total Requests:    {:>10}                                 ║",
            total.request_count
        );
        println!(
            "║ Failed:            {:>10}                                 ║",
            total.failure_count
        );
        println!(
            "║ Success Rate:      {:>10.2}%                               ║",
            total.success_percentage()
        );
        println!(
            "║ Avg RPS:           {:>10.2}                                ║",
            total.requests_per_sec.unwrap_or(0.0)
        );
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ RESPONSE TIME (ms)                                           ║");
        println!(
            "║   avg:             {:>10.2}                                ║",
            total.avg_response_time.unwrap_or(0.0)
        );
        println!(
            "║   p90:             {:>10.2}                                ║",
            total.p90.unwrap_or(0.0)
        );
        println!(
            "║   max:             {:>10.2}                                ║",
            total.max_response_time.unwrap_or(0.0)
        );
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ ENDPOINTS                                                    ║");
        for record in self.records.iter().filter(|r| !r.is_aggregated()) {
            println!(
                "║   {:<34} {:>8} req {:>6.2}%    ║",
                record.endpoint_label(),
                record.request_count,
                record.success_percentage()
            );
        }

        if !self.failures.is_empty() {
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!("║ ERRORS                                                       ║");
            for failure in &self.failures {
                println!(
                    "║   {:<6} {:<28} {:<14}: {:>6} ║",
                    failure.method, failure.name, failure.error, failure.occurrences
                );
            }
        }

        println!("╚══════════════════════════════════════════════════════════════╝\n");
    }
}

fn write_failures(path: &Path, failures: &[FailureRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| HarnessError::csv(path, e))?;
    if failures.is_empty() {
        writer
            .write_record(["Method", "Name", "Error", "Occurrences"])
            .map_err(|e| HarnessError::csv(path, e))?;
    }
    for failure in failures {
        writer
            .serialize(failure)
            .map_err(|e| HarnessError::csv(path, e))?;
    }
    writer.flush().map_err(|e| HarnessError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::AGGREGATED_ROW;

    fn summary() -> RunSummary {
        RunSummary {
            scenario: Scenario::Moderate,
            run: 2,
            started_at: Utc::now(),
            duration_secs: 60.0,
            users: 50,
            records: vec![
                StatsRecord {
                    method: "GET".into(),
                    name: "/api/vet/vets".into(),
                    request_count: 10,
                    failure_count: 1,
                    ..Default::default()
                },
                StatsRecord {
                    name: AGGREGATED_ROW.into(),
                    request_count: 10,
                    failure_count: 1,
                    ..Default::default()
                },
            ],
            failures: vec![FailureRecord {
                method: "GET".into(),
                name: "/api/vet/vets".into(),
                error: "HTTP 503".into(),
                occurrences: 1,
            }],
        }
    }

    #[test]
    fn test_write_run_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = summary().write(&dir.path().join("results")).unwrap();

        assert!(files.stats.ends_with("results/cenario_B_run2_stats.csv"));
        assert!(files.failures.ends_with("results/cenario_B_run2_failures.csv"));

        let rows = StatsRecord::read_all(&files.stats).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_aggregated());

        let failures = std::fs::read_to_string(&files.failures).unwrap();
        assert_eq!(
            failures,
            "Method,Name,Error,Occurrences\nGET,/api/vet/vets,HTTP 503,1\n"
        );
    }

    #[test]
    fn test_empty_failures_file_has_header() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut summary = summary();
        summary.failures.clear();

        let files = summary.write(dir.path()).unwrap();
        let failures = std::fs::read_to_string(&files.failures).unwrap();
        assert_eq!(failures, "Method,Name,Error,Occurrences\n");
    }

    #[test]
    fn test_aggregated_lookup() {
        let summary = summary();
        assert_eq!(summary.aggregated().unwrap().request_count, 10);
    }
}
