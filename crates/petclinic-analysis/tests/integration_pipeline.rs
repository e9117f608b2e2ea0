//! Integration tests for the results aggregator
//!
//! Each test lays out a results directory the way the load driver
//! leaves it and runs the whole pipeline over it.

use std::path::Path;

use petclinic_analysis::{
    analyze, process_results, AnalysisConfig, ChartFormat, AGGREGATE_TABLE, ENDPOINT_TABLE,
};
use petclinic_core::{HarnessError, Scenario, StatsRecord, AGGREGATED_ROW};
use tempfile::TempDir;

fn endpoint(method: &str, name: &str, requests: u64, failures: u64, avg: f64) -> StatsRecord {
    StatsRecord {
        method: method.into(),
        name: name.into(),
        request_count: requests,
        failure_count: failures,
        avg_response_time: Some(avg),
        ..Default::default()
    }
}

fn aggregated(requests: u64, failures: u64, avg: f64, max: f64, p90: f64, rps: f64) -> StatsRecord {
    StatsRecord {
        name: AGGREGATED_ROW.into(),
        request_count: requests,
        failure_count: failures,
        avg_response_time: Some(avg),
        max_response_time: Some(max),
        p90: Some(p90),
        requests_per_sec: Some(rps),
        ..Default::default()
    }
}

fn write_run(dir: &Path, file: &str, rows: &[StatsRecord]) {
    StatsRecord::write_all(&dir.join(file), rows).unwrap();
}

fn table(dir: &Path, name: &str) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(dir.join(name)).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

fn tables_only(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        results_dir: dir.to_path_buf(),
        charts: false,
        ..Default::default()
    }
}

mod aggregate_tests {
    use super::*;

    #[test]
    fn test_single_run_with_ten_percent_failures() {
        let dir = TempDir::new().unwrap();
        write_run(
            dir.path(),
            "cenario_A_run1_stats.csv",
            &[
                endpoint("GET", "/api/vet/vets", 100, 10, 50.0),
                aggregated(100, 10, 50.0, 200.0, 80.0, 5.0),
            ],
        );

        analyze(&tables_only(dir.path())).unwrap();

        let rows = table(dir.path(), AGGREGATE_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            vec!["A (Leve)", "50.00", "200.00", "80.00", "5.00", "100.00", "10.00", "90.00"]
        );
    }

    #[test]
    fn test_rows_in_scenario_order_regardless_of_files() {
        let dir = TempDir::new().unwrap();
        // discovery order is C, B, A
        write_run(
            dir.path(),
            "z_cenario_A_run1_stats.csv",
            &[aggregated(10, 0, 1.0, 1.0, 1.0, 1.0)],
        );
        write_run(
            dir.path(),
            "a_cenario_C_run1_stats.csv",
            &[aggregated(10, 0, 3.0, 3.0, 3.0, 3.0)],
        );
        write_run(
            dir.path(),
            "m_cenario_B_run1_stats.csv",
            &[aggregated(10, 0, 2.0, 2.0, 2.0, 2.0)],
        );

        let summary = process_results(dir.path()).unwrap();
        let order: Vec<Scenario> = summary.aggregate.iter().map(|r| r.scenario).collect();
        assert_eq!(order, vec![Scenario::Light, Scenario::Moderate, Scenario::Peak]);
    }

    #[test]
    fn test_columnwise_means_across_runs() {
        let dir = TempDir::new().unwrap();
        write_run(
            dir.path(),
            "cenario_B_run1_stats.csv",
            &[aggregated(200, 0, 10.0, 100.0, 20.0, 4.0)],
        );
        write_run(
            dir.path(),
            "cenario_B_run2_stats.csv",
            &[aggregated(400, 40, 30.0, 300.0, 60.0, 8.0)],
        );

        let summary = process_results(dir.path()).unwrap();
        let row = &summary.aggregate[0];
        assert_eq!(row.runs, 2);
        assert_eq!(row.avg_response_time, Some(20.0));
        assert_eq!(row.max_response_time, Some(200.0));
        assert_eq!(row.p90, Some(40.0));
        assert_eq!(row.requests_per_sec, Some(6.0));
        assert_eq!(row.total_requests, Some(300.0));
        assert_eq!(row.total_failures, Some(20.0));
        assert_eq!(row.success_pct, Some(95.0));
    }

    #[test]
    fn test_unmarked_file_is_excluded() {
        let dir = TempDir::new().unwrap();
        write_run(
            dir.path(),
            "cenario_C_run1_stats.csv",
            &[
                endpoint("GET", "/api/vet/vets", 10, 0, 2.0),
                aggregated(10, 0, 2.0, 2.0, 2.0, 2.0),
            ],
        );
        write_run(
            dir.path(),
            "smoke_stats.csv",
            &[
                endpoint("GET", "/api/vet/vets", 999, 999, 999.0),
                aggregated(999, 999, 999.0, 999.0, 999.0, 999.0),
            ],
        );

        analyze(&tables_only(dir.path())).unwrap();

        let aggregate = table(dir.path(), AGGREGATE_TABLE);
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate[0][0], "C (Pico)");
        assert_eq!(aggregate[0][1], "2.00");

        let endpoints = table(dir.path(), ENDPOINT_TABLE);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0], vec!["C (Pico)", "GET /api/vet/vets", "2.00", "100.00"]);
    }

    #[test]
    fn test_missing_aggregated_row_fails_with_file_name() {
        let dir = TempDir::new().unwrap();
        write_run(
            dir.path(),
            "cenario_A_run1_stats.csv",
            &[aggregated(10, 0, 1.0, 1.0, 1.0, 1.0)],
        );
        write_run(
            dir.path(),
            "cenario_A_run2_stats.csv",
            &[endpoint("GET", "/api/vet/vets", 10, 0, 1.0)],
        );

        let err = process_results(dir.path()).unwrap_err();
        assert!(matches!(err, HarnessError::MissingAggregatedRow { .. }));
        assert!(err.to_string().contains("cenario_A_run2_stats.csv"));
    }

    #[test]
    fn test_empty_directory_is_recoverable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let err = analyze(&tables_only(dir.path())).unwrap_err();
        assert!(err.is_recoverable());
        assert!(!dir.path().join(AGGREGATE_TABLE).exists());
    }
}

mod endpoint_tests {
    use super::*;

    #[test]
    fn test_endpoint_rows_grouped_by_method_and_name() {
        let dir = TempDir::new().unwrap();
        for (run, failures) in [(1, 0), (2, 20)] {
            write_run(
                dir.path(),
                &format!("cenario_A_run{}_stats.csv", run),
                &[
                    endpoint("GET", "/api/customer/owners", 40, 0, 10.0 * run as f64),
                    endpoint("POST", "/api/customer/owners", 40, failures, 20.0),
                    endpoint("GET", "/api/customer/owners/[id]", 30, 0, 5.0),
                    endpoint("GET", "/api/visit/owners/1/pets", 30, 0, 5.0),
                    aggregated(140, failures, 10.0, 50.0, 20.0, 2.0),
                ],
            );
        }

        analyze(&tables_only(dir.path())).unwrap();

        let rows = table(dir.path(), ENDPOINT_TABLE);
        let endpoints: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(
            endpoints,
            vec![
                "GET /api/customer/owners",
                "GET /api/customer/owners/[id]",
                "POST /api/customer/owners",
            ]
        );
        // GET owners: mean of 10 and 20 ms
        assert_eq!(rows[0][2], "15.00");
        // POST owners: mean of 100% and 50%
        assert_eq!(rows[2][3], "75.00");
    }
}

mod chart_tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn write_all_scenarios(dir: &Path) {
        for scenario in Scenario::ALL {
            write_run(
                dir,
                &format!("{}_stats.csv", scenario.run_prefix(1)),
                &[
                    endpoint("GET", "/api/vet/vets", 10, 1, 3.0),
                    endpoint("GET", "/api/customer/owners", 20, 0, 7.0),
                    aggregated(30, 1, 5.0, 9.0, 6.0, 1.0),
                ],
            );
        }
    }

    #[test]
    fn test_svg_charts_written() {
        let Some(font) = petclinic_analysis::find_font(None) else {
            eprintln!("no system font, skipping chart rendering");
            return;
        };
        let dir = TempDir::new().unwrap();
        write_all_scenarios(dir.path());

        let report = analyze(&AnalysisConfig {
            results_dir: dir.path().to_path_buf(),
            chart_format: ChartFormat::Svg,
            font_path: Some(font),
            charts: true,
        })
        .unwrap();

        assert_eq!(report.charts.len(), 8);
        assert!(dir.path().join("grafico_04_total_reqs.svg").is_file());
        assert!(dir.path().join("grafico_08_endpoint_sucesso.svg").is_file());
    }

    #[test]
    fn test_png_charts_written() {
        let Some(font) = petclinic_analysis::find_font(None) else {
            eprintln!("no system font, skipping chart rendering");
            return;
        };
        let dir = TempDir::new().unwrap();
        write_all_scenarios(dir.path());

        let report = analyze(&AnalysisConfig {
            results_dir: dir.path().to_path_buf(),
            chart_format: ChartFormat::Png,
            font_path: Some(font),
            charts: true,
        })
        .unwrap();

        assert_eq!(report.charts.len(), 8);
        for (n, chart) in report.charts.iter().enumerate() {
            let file_name = chart.file_name().unwrap().to_string_lossy();
            assert!(file_name.starts_with(&format!("grafico_0{}_", n + 1)));
            assert!(file_name.ends_with(".png"));

            let bytes = std::fs::read(chart).unwrap();
            assert!(bytes.len() > PNG_SIGNATURE.len());
            assert_eq!(bytes[..8], PNG_SIGNATURE, "{} is not a PNG", file_name);
        }
    }
}
