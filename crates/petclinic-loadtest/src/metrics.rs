//! Request statistics
//!
//! Every request issued by a virtual user is recorded under its method and
//! stats name, and into the run-wide total that becomes the `Aggregated` row.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use indexmap::IndexMap;
use parking_lot::RwLock;
use petclinic_core::{StatsRecord, AGGREGATED_ROW};
use serde::{Deserialize, Serialize};

use crate::config::MAX_REQUEST_TIMEOUT_SECS;

/// Percentiles written to the stats CSV, in column order
const PERCENTILES: [f64; 11] = [
    0.50, 0.66, 0.75, 0.80, 0.90, 0.95, 0.98, 0.99, 0.999, 0.9999, 1.0,
];

fn latency_histogram() -> Histogram<u64> {
    // 1µs up to the longest request timeout
    Histogram::new_with_bounds(1, MAX_REQUEST_TIMEOUT_SECS * 1_000_000, 3)
        .expect("static histogram bounds are valid")
}

fn us_to_ms(us: u64) -> f64 {
    us as f64 / 1000.0
}

/// Accumulated statistics of one endpoint (or of the whole run)
#[derive(Debug, Clone)]
pub struct EndpointStats {
    pub num_requests: u64,
    pub num_failures: u64,
    pub total_content_length: u64,
    total_response_time_us: u64,
    histogram: Histogram<u64>,
}

impl Default for EndpointStats {
    fn default() -> Self {
        Self {
            num_requests: 0,
            num_failures: 0,
            total_content_length: 0,
            total_response_time_us: 0,
            histogram: latency_histogram(),
        }
    }
}

impl EndpointStats {
    /// Record one request
    pub fn record(&mut self, response_time: Duration, content_length: u64, failed: bool) {
        let us = response_time.as_micros().min(u64::MAX as u128) as u64;

        self.num_requests += 1;
        if failed {
            self.num_failures += 1;
        }
        self.total_content_length += content_length;
        self.total_response_time_us = self.total_response_time_us.saturating_add(us);
        self.histogram.saturating_record(us.max(1));
    }

    /// Mean response time in milliseconds
    pub fn avg_response_time_ms(&self) -> f64 {
        if self.num_requests == 0 {
            return 0.0;
        }
        us_to_ms(self.total_response_time_us) / self.num_requests as f64
    }

    fn percentile_ms(&self, quantile: f64) -> Option<f64> {
        if self.num_requests == 0 {
            return None;
        }
        Some(us_to_ms(self.histogram.value_at_quantile(quantile)))
    }

    /// Row of the stats CSV
    pub fn to_record(&self, method: &str, name: &str, elapsed_secs: f64) -> StatsRecord {
        let elapsed = elapsed_secs.max(f64::EPSILON);
        let has_requests = self.num_requests > 0;
        let p = |q| self.percentile_ms(q);

        StatsRecord {
            method: method.to_string(),
            name: name.to_string(),
            request_count: self.num_requests,
            failure_count: self.num_failures,
            median_response_time: Some(p(0.5).unwrap_or(0.0)),
            avg_response_time: Some(self.avg_response_time_ms()),
            min_response_time: Some(if has_requests { us_to_ms(self.histogram.min()) } else { 0.0 }),
            max_response_time: Some(if has_requests { us_to_ms(self.histogram.max()) } else { 0.0 }),
            avg_content_size: Some(if has_requests {
                self.total_content_length as f64 / self.num_requests as f64
            } else {
                0.0
            }),
            requests_per_sec: Some(self.num_requests as f64 / elapsed),
            failures_per_sec: Some(self.num_failures as f64 / elapsed),
            p50: p(PERCENTILES[0]),
            p66: p(PERCENTILES[1]),
            p75: p(PERCENTILES[2]),
            p80: p(PERCENTILES[3]),
            p90: p(PERCENTILES[4]),
            p95: p(PERCENTILES[5]),
            p98: p(PERCENTILES[6]),
            p99: p(PERCENTILES[7]),
            p999: p(PERCENTILES[8]),
            p9999: p(PERCENTILES[9]),
            p100: p(PERCENTILES[10]),
        }
    }
}

/// One line of the failures CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Occurrences")]
    pub occurrences: u64,
}

type EntryKey = (String, String);
type ErrorKey = (String, String, String);

/// Thread-safe statistics of a run
#[derive(Debug)]
pub struct RequestStats {
    /// Total requests recorded
    pub total_requests: AtomicU64,

    /// Failed requests recorded
    pub failed_requests: AtomicU64,

    entries: RwLock<IndexMap<EntryKey, EndpointStats>>,
    total: RwLock<EndpointStats>,
    errors: RwLock<IndexMap<ErrorKey, u64>>,
    start_time: RwLock<Option<Instant>>,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            entries: RwLock::new(IndexMap::new()),
            total: RwLock::new(EndpointStats::default()),
            errors: RwLock::new(IndexMap::new()),
            start_time: RwLock::new(None),
        }
    }

    /// Mark the start of the measured window
    pub fn start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    /// Seconds since `start`, zero if never started
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .read()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Record a successful request
    pub fn record_success(
        &self,
        method: &str,
        name: &str,
        response_time: Duration,
        content_length: u64,
    ) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.record(method, name, response_time, content_length, false);
    }

    /// Record a failed request
    pub fn record_failure(&self, method: &str, name: &str, response_time: Duration, error: &str) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        self.record(method, name, response_time, 0, true);

        let key = (method.to_string(), name.to_string(), error.to_string());
        *self.errors.write().entry(key).or_insert(0) += 1;
    }

    fn record(
        &self,
        method: &str,
        name: &str,
        response_time: Duration,
        content_length: u64,
        failed: bool,
    ) {
        self.entries
            .write()
            .entry((method.to_string(), name.to_string()))
            .or_default()
            .record(response_time, content_length, failed);
        self.total
            .write()
            .record(response_time, content_length, failed);
    }

    /// Stats rows sorted by name then method, `Aggregated` last
    pub fn records(&self) -> Vec<StatsRecord> {
        let elapsed = self.elapsed_secs();
        let entries = self.entries.read();

        let mut keys: Vec<&EntryKey> = entries.keys().collect();
        keys.sort_by(|a, b| (&a.1, &a.0).cmp(&(&b.1, &b.0)));

        let mut records: Vec<StatsRecord> = keys
            .into_iter()
            .map(|key| entries[key].to_record(&key.0, &key.1, elapsed))
            .collect();
        records.push(self.total.read().to_record("", AGGREGATED_ROW, elapsed));
        records
    }

    /// Failure occurrences, most frequent first
    pub fn failures(&self) -> Vec<FailureRecord> {
        let mut failures: Vec<FailureRecord> = self
            .errors
            .read()
            .iter()
            .map(|((method, name, error), occurrences)| FailureRecord {
                method: method.clone(),
                name: name.clone(),
                error: error.clone(),
                occurrences: *occurrences,
            })
            .collect();
        failures.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        failures
    }
}
