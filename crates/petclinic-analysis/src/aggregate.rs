//! Per-scenario means across runs

use std::collections::{BTreeMap, BTreeSet};

use petclinic_core::Scenario;

use crate::reader::RunResult;

/// Running arithmetic mean that ignores missing values
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    count: u32,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.sum += value;
            self.count += 1;
        }
    }

    /// `None` when no value was pushed
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

/// Mean figures of one scenario across its runs
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub scenario: Scenario,
    pub runs: usize,
    pub avg_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub p90: Option<f64>,
    pub requests_per_sec: Option<f64>,
    pub total_requests: Option<f64>,
    pub total_failures: Option<f64>,
    pub success_pct: Option<f64>,
}

/// Mean figures of one endpoint within one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRow {
    pub scenario: Scenario,
    pub endpoint: String,
    pub avg_response_time: Option<f64>,
    pub success_pct: Option<f64>,
}

#[derive(Default)]
struct AggregateAccumulator {
    runs: usize,
    avg_response_time: MeanAccumulator,
    max_response_time: MeanAccumulator,
    p90: MeanAccumulator,
    requests_per_sec: MeanAccumulator,
    total_requests: MeanAccumulator,
    total_failures: MeanAccumulator,
    success_pct: MeanAccumulator,
}

impl AggregateAccumulator {
    fn push(&mut self, run: &RunResult) {
        let sample = &run.aggregate;
        self.runs += 1;
        self.avg_response_time.push(sample.avg_response_time);
        self.max_response_time.push(sample.max_response_time);
        self.p90.push(sample.p90);
        self.requests_per_sec.push(sample.requests_per_sec);
        self.total_requests.push(Some(sample.total_requests as f64));
        self.total_failures.push(Some(sample.total_failures as f64));
        self.success_pct.push(Some(sample.success_pct));
    }

    fn finish(&self, scenario: Scenario) -> AggregateRow {
        AggregateRow {
            scenario,
            runs: self.runs,
            avg_response_time: self.avg_response_time.value(),
            max_response_time: self.max_response_time.value(),
            p90: self.p90.value(),
            requests_per_sec: self.requests_per_sec.value(),
            total_requests: self.total_requests.value(),
            total_failures: self.total_failures.value(),
            success_pct: self.success_pct.value(),
        }
    }
}

#[derive(Default)]
struct EndpointAccumulator {
    avg_response_time: MeanAccumulator,
    success_pct: MeanAccumulator,
}

/// Both summary tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// One row per scenario that had runs, in scenario order
    pub aggregate: Vec<AggregateRow>,
    /// Sorted by scenario, then endpoint label
    pub endpoints: Vec<EndpointRow>,
}

impl Summary {
    /// Average every run of every scenario
    pub fn from_runs(runs: &[RunResult]) -> Self {
        let mut scenarios: BTreeMap<Scenario, AggregateAccumulator> = BTreeMap::new();
        let mut endpoints: BTreeMap<(Scenario, String), EndpointAccumulator> = BTreeMap::new();

        for run in runs {
            scenarios.entry(run.scenario).or_default().push(run);

            for sample in &run.endpoints {
                let acc = endpoints
                    .entry((run.scenario, sample.endpoint.clone()))
                    .or_default();
                acc.avg_response_time.push(sample.avg_response_time);
                acc.success_pct.push(Some(sample.success_pct));
            }
        }

        Self {
            aggregate: scenarios
                .iter()
                .map(|(scenario, acc)| acc.finish(*scenario))
                .collect(),
            endpoints: endpoints
                .into_iter()
                .map(|((scenario, endpoint), acc)| EndpointRow {
                    scenario,
                    endpoint,
                    avg_response_time: acc.avg_response_time.value(),
                    success_pct: acc.success_pct.value(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aggregate.is_empty()
    }

    pub fn pivot_response_time(&self) -> Pivot {
        Pivot::from_rows(&self.endpoints, |row| row.avg_response_time)
    }

    pub fn pivot_success(&self) -> Pivot {
        Pivot::from_rows(&self.endpoints, |row| row.success_pct)
    }
}

/// Endpoint x scenario matrix. Every scenario gets a column, even
/// one without data.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub endpoints: Vec<String>,
    pub scenarios: Vec<Scenario>,
    /// `values[endpoint][scenario]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl Pivot {
    pub fn from_rows(rows: &[EndpointRow], field: impl Fn(&EndpointRow) -> Option<f64>) -> Self {
        let endpoints: Vec<String> = rows
            .iter()
            .map(|row| row.endpoint.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let scenarios = Scenario::ALL.to_vec();

        let mut values = vec![vec![None; scenarios.len()]; endpoints.len()];
        for row in rows {
            let (Ok(e), Some(s)) = (
                endpoints.binary_search(&row.endpoint),
                scenarios.iter().position(|s| *s == row.scenario),
            ) else {
                continue;
            };
            values[e][s] = field(row);
        }

        Self {
            endpoints,
            scenarios,
            values,
        }
    }

    /// Values of one scenario column, one per endpoint
    pub fn column(&self, scenario: Scenario) -> Vec<Option<f64>> {
        let Some(s) = self.scenarios.iter().position(|c| *c == scenario) else {
            return vec![None; self.endpoints.len()];
        };
        self.values.iter().map(|row| row[s]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{AggregateSample, EndpointSample};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn run(scenario: Scenario, avg: f64, requests: u64, failures: u64) -> RunResult {
        RunResult {
            scenario,
            file: PathBuf::from(format!("{}_stats.csv", scenario.marker())),
            aggregate: AggregateSample {
                avg_response_time: Some(avg),
                max_response_time: Some(avg * 10.0),
                p90: Some(avg * 2.0),
                requests_per_sec: Some(requests as f64 / 60.0),
                total_requests: requests,
                total_failures: failures,
                success_pct: petclinic_core::success_percentage(requests, failures),
            },
            endpoints: vec![EndpointSample {
                endpoint: "GET /api/vet/vets".into(),
                avg_response_time: Some(avg),
                success_pct: 100.0,
            }],
        }
    }

    #[test]
    fn test_mean_skips_missing() {
        let mut mean = MeanAccumulator::default();
        assert_eq!(mean.value(), None);
        mean.push(Some(10.0));
        mean.push(None);
        mean.push(Some(20.0));
        assert_eq!(mean.value(), Some(15.0));
    }

    #[test]
    fn test_single_run_with_failures() {
        let summary = Summary::from_runs(&[run(Scenario::Light, 5.0, 100, 10)]);

        let row = &summary.aggregate[0];
        assert_eq!(row.scenario, Scenario::Light);
        assert_eq!(row.runs, 1);
        assert_eq!(row.total_requests, Some(100.0));
        assert_eq!(row.total_failures, Some(10.0));
        assert_eq!(row.success_pct, Some(90.0));
    }

    #[test]
    fn test_columnwise_means() {
        let summary = Summary::from_runs(&[
            run(Scenario::Moderate, 10.0, 100, 0),
            run(Scenario::Moderate, 20.0, 300, 30),
        ]);

        let row = &summary.aggregate[0];
        assert_eq!(row.avg_response_time, Some(15.0));
        assert_eq!(row.max_response_time, Some(150.0));
        assert_eq!(row.total_requests, Some(200.0));
        assert_eq!(row.total_failures, Some(15.0));
        // mean of per-run percentages, not percentage of mean totals
        assert_eq!(row.success_pct, Some(95.0));
    }

    #[test]
    fn test_scenario_order_ignores_input_order() {
        let summary = Summary::from_runs(&[
            run(Scenario::Peak, 1.0, 1, 0),
            run(Scenario::Light, 1.0, 1, 0),
            run(Scenario::Moderate, 1.0, 1, 0),
        ]);

        let order: Vec<Scenario> = summary.aggregate.iter().map(|r| r.scenario).collect();
        assert_eq!(order, Scenario::ALL.to_vec());
    }

    #[test]
    fn test_scenario_without_runs_is_omitted() {
        let summary = Summary::from_runs(&[
            run(Scenario::Peak, 1.0, 1, 0),
            run(Scenario::Light, 1.0, 1, 0),
        ]);

        let order: Vec<Scenario> = summary.aggregate.iter().map(|r| r.scenario).collect();
        assert_eq!(order, vec![Scenario::Light, Scenario::Peak]);

        let pivot = summary.pivot_response_time();
        assert_eq!(pivot.scenarios, Scenario::ALL.to_vec());
        assert_eq!(pivot.column(Scenario::Moderate), vec![None]);
        assert_eq!(pivot.column(Scenario::Peak), vec![Some(1.0)]);
    }

    #[test]
    fn test_pivot_endpoints_sorted() {
        let mut a = run(Scenario::Light, 4.0, 1, 0);
        a.endpoints.push(EndpointSample {
            endpoint: "GET /api/customer/owners".into(),
            avg_response_time: Some(8.0),
            success_pct: 50.0,
        });
        let summary = Summary::from_runs(&[a]);

        let pivot = summary.pivot_success();
        assert_eq!(
            pivot.endpoints,
            vec!["GET /api/customer/owners", "GET /api/vet/vets"]
        );
        assert_eq!(pivot.column(Scenario::Light), vec![Some(50.0), Some(100.0)]);
    }

    proptest! {
        #[test]
        fn prop_mean_within_bounds(values in prop::collection::vec(0.0f64..1e6, 1..50)) {
            let mut mean = MeanAccumulator::default();
            for v in &values {
                mean.push(Some(*v));
            }
            let m = mean.value().unwrap();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= min - 1e-6 && m <= max + 1e-6);
        }
    }
}
