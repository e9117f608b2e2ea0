//! Extraction of the rows the summaries need from one result file

use std::path::{Path, PathBuf};

use petclinic_core::{is_tracked_endpoint, HarnessError, Result, Scenario, StatsRecord};

/// Run-wide figures from the `Aggregated` row
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSample {
    pub avg_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub p90: Option<f64>,
    pub requests_per_sec: Option<f64>,
    pub total_requests: u64,
    pub total_failures: u64,
    pub success_pct: f64,
}

impl From<&StatsRecord> for AggregateSample {
    fn from(record: &StatsRecord) -> Self {
        Self {
            avg_response_time: record.avg_response_time,
            max_response_time: record.max_response_time,
            p90: record.p90,
            requests_per_sec: record.requests_per_sec,
            total_requests: record.request_count,
            total_failures: record.failure_count,
            success_pct: record.success_percentage(),
        }
    }
}

/// Figures of one allow-listed endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSample {
    /// `"{method} {name}"`
    pub endpoint: String,
    pub avg_response_time: Option<f64>,
    pub success_pct: f64,
}

impl From<&StatsRecord> for EndpointSample {
    fn from(record: &StatsRecord) -> Self {
        Self {
            endpoint: record.endpoint_label(),
            avg_response_time: record.avg_response_time,
            success_pct: record.success_percentage(),
        }
    }
}

/// Everything one result file contributes
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub scenario: Scenario,
    pub file: PathBuf,
    pub aggregate: AggregateSample,
    pub endpoints: Vec<EndpointSample>,
}

impl RunResult {
    /// Build from parsed rows. Fails when no row is named `Aggregated`.
    pub fn from_records(scenario: Scenario, file: &Path, records: &[StatsRecord]) -> Result<Self> {
        let aggregated = records
            .iter()
            .find(|r| r.is_aggregated())
            .ok_or_else(|| HarnessError::MissingAggregatedRow {
                file: file.to_path_buf(),
            })?;

        Ok(Self {
            scenario,
            file: file.to_path_buf(),
            aggregate: AggregateSample::from(aggregated),
            endpoints: records
                .iter()
                .filter(|r| is_tracked_endpoint(&r.name))
                .map(EndpointSample::from)
                .collect(),
        })
    }
}

/// Read one result file, `None` when its name carries no scenario marker
pub fn read_run(file: &Path) -> Result<Option<RunResult>> {
    let Some(scenario) = file
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(Scenario::from_file_name)
    else {
        return Ok(None);
    };

    let records = StatsRecord::read_all(file)?;
    RunResult::from_records(scenario, file, &records).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::AGGREGATED_ROW;

    fn row(method: &str, name: &str, requests: u64, failures: u64) -> StatsRecord {
        StatsRecord {
            method: method.into(),
            name: name.into(),
            request_count: requests,
            failure_count: failures,
            avg_response_time: Some(12.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_records_filters_endpoints() {
        let records = vec![
            row("GET", "/api/customer/owners", 40, 0),
            row("POST", "/api/customer/owners", 10, 5),
            row("GET", "/api/customer/owners/[id]", 30, 0),
            row("GET", "/api/vet/vets", 20, 0),
            row("GET", "/api/visit/owners/1/pets/1/visits", 3, 0),
            row("", AGGREGATED_ROW, 103, 5),
        ];

        let run =
            RunResult::from_records(Scenario::Light, Path::new("cenario_A_stats.csv"), &records)
                .unwrap();

        let labels: Vec<&str> = run.endpoints.iter().map(|e| e.endpoint.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "GET /api/customer/owners",
                "POST /api/customer/owners",
                "GET /api/customer/owners/[id]",
                "GET /api/vet/vets",
            ]
        );
        assert_eq!(run.endpoints[1].success_pct, 50.0);
        assert_eq!(run.aggregate.total_requests, 103);
    }

    #[test]
    fn test_missing_aggregated_row_names_file() {
        let records = vec![row("GET", "/api/vet/vets", 1, 0)];
        let err = RunResult::from_records(
            Scenario::Peak,
            Path::new("results/cenario_C_run4_stats.csv"),
            &records,
        )
        .unwrap_err();

        match err {
            HarnessError::MissingAggregatedRow { file } => {
                assert_eq!(file, Path::new("results/cenario_C_run4_stats.csv"))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_read_run_skips_unmarked_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("smoke_stats.csv");
        std::fs::write(&path, "not,a,stats,file\n").unwrap();

        assert_eq!(read_run(&path).unwrap(), None);
    }

    #[test]
    fn test_read_run_zero_requests_is_fully_successful() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cenario_B_run1_stats.csv");
        std::fs::write(
            &path,
            "Type,Name,Request Count,Failure Count,Average Response Time,Max Response Time,90%,Requests/s\n\
             ,Aggregated,0,0,0,0,N/A,0\n",
        )
        .unwrap();

        let run = read_run(&path).unwrap().unwrap();
        assert_eq!(run.scenario, Scenario::Moderate);
        assert_eq!(run.aggregate.success_pct, 100.0);
        assert_eq!(run.aggregate.p90, None);
        assert!(run.endpoints.is_empty());
    }
}
