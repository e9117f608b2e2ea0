//! Per-run statistics records
//!
//! One `StatsRecord` is one row of a `*_stats.csv` file: a row per named
//! endpoint plus the `Aggregated` total. The column names follow the Locust
//! stats CSV so results from either tool can be analysed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::endpoint::endpoint_label;
use crate::error::{HarnessError, Result};

/// Name of the synthetic row combining every endpoint of a run
pub const AGGREGATED_ROW: &str = "Aggregated";

/// Percentage of successful requests.
///
/// Defined as 100 when no request was made.
pub fn success_percentage(requests: u64, failures: u64) -> f64 {
    if requests == 0 {
        return 100.0;
    }
    100.0 * requests.saturating_sub(failures) as f64 / requests as f64
}

/// One row of a per-run statistics CSV.
///
/// Numeric cells that are empty or `N/A` deserialize to `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    /// HTTP method, empty for the aggregated row
    #[serde(rename = "Type", default)]
    pub method: String,

    /// Stats name of the endpoint, or `Aggregated`
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Request Count")]
    pub request_count: u64,

    #[serde(rename = "Failure Count")]
    pub failure_count: u64,

    #[serde(
        rename = "Median Response Time",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub median_response_time: Option<f64>,

    #[serde(
        rename = "Average Response Time",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub avg_response_time: Option<f64>,

    #[serde(
        rename = "Min Response Time",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub min_response_time: Option<f64>,

    #[serde(
        rename = "Max Response Time",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub max_response_time: Option<f64>,

    #[serde(
        rename = "Average Content Size",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub avg_content_size: Option<f64>,

    #[serde(rename = "Requests/s", default, deserialize_with = "csv::invalid_option")]
    pub requests_per_sec: Option<f64>,

    #[serde(rename = "Failures/s", default, deserialize_with = "csv::invalid_option")]
    pub failures_per_sec: Option<f64>,

    #[serde(rename = "50%", default, deserialize_with = "csv::invalid_option")]
    pub p50: Option<f64>,

    #[serde(rename = "66%", default, deserialize_with = "csv::invalid_option")]
    pub p66: Option<f64>,

    #[serde(rename = "75%", default, deserialize_with = "csv::invalid_option")]
    pub p75: Option<f64>,

    #[serde(rename = "80%", default, deserialize_with = "csv::invalid_option")]
    pub p80: Option<f64>,

    #[serde(rename = "90%", default, deserialize_with = "csv::invalid_option")]
    pub p90: Option<f64>,

    #[serde(rename = "95%", default, deserialize_with = "csv::invalid_option")]
    pub p95: Option<f64>,

    #[serde(rename = "98%", default, deserialize_with = "csv::invalid_option")]
    pub p98: Option<f64>,

    #[serde(rename = "99%", default, deserialize_with = "csv::invalid_option")]
    pub p99: Option<f64>,

    #[serde(rename = "99.9%", default, deserialize_with = "csv::invalid_option")]
    pub p999: Option<f64>,

    #[serde(rename = "99.99%", default, deserialize_with = "csv::invalid_option")]
    pub p9999: Option<f64>,

    #[serde(rename = "100%", default, deserialize_with = "csv::invalid_option")]
    pub p100: Option<f64>,
}

impl StatsRecord {
    /// Whether this is the run-wide `Aggregated` row
    pub fn is_aggregated(&self) -> bool {
        self.name == AGGREGATED_ROW
    }

    /// Success percentage of this row
    pub fn success_percentage(&self) -> f64 {
        success_percentage(self.request_count, self.failure_count)
    }

    /// `"{method} {name}"` label used by the per-endpoint summary
    pub fn endpoint_label(&self) -> String {
        endpoint_label(&self.method, &self.name)
    }

    /// Read every row of a stats CSV
    pub fn read_all(path: &Path) -> Result<Vec<StatsRecord>> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| HarnessError::csv(path, e))?;
        reader
            .deserialize()
            .collect::<std::result::Result<Vec<StatsRecord>, _>>()
            .map_err(|e| HarnessError::csv(path, e))
    }

    /// Write rows to a stats CSV, replacing any existing file
    pub fn write_all(path: &Path, records: &[StatsRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| HarnessError::csv(path, e))?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| HarnessError::csv(path, e))?;
        }
        writer.flush().map_err(|e| HarnessError::io(path, e))
    }
}
