//! Summary tables on disk and on the console

use std::path::{Path, PathBuf};

use petclinic_core::{HarnessError, Result};

use crate::aggregate::{AggregateRow, EndpointRow, Summary};

/// Scenario means
pub const AGGREGATE_TABLE: &str = "tabela_resumo_agregado.csv";
/// Per-endpoint scenario means
pub const ENDPOINT_TABLE: &str = "tabela_resumo_endpoints.csv";

const AGGREGATE_HEADER: [&str; 8] = [
    "Cenário",
    "Tempo Médio (ms)",
    "Tempo Máximo (ms)",
    "P90 (ms)",
    "Req/s",
    "Total Requisições",
    "Total Falhas",
    "% Sucesso",
];

const ENDPOINT_HEADER: [&str; 4] = ["Cenário", "Endpoint", "Tempo Médio (ms)", "% Sucesso"];

/// Two decimals, empty when missing
fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn aggregate_cells(row: &AggregateRow) -> [String; 8] {
    [
        row.scenario.label().to_string(),
        cell(row.avg_response_time),
        cell(row.max_response_time),
        cell(row.p90),
        cell(row.requests_per_sec),
        cell(row.total_requests),
        cell(row.total_failures),
        cell(row.success_pct),
    ]
}

fn endpoint_cells(row: &EndpointRow) -> [String; 4] {
    [
        row.scenario.label().to_string(),
        row.endpoint.clone(),
        cell(row.avg_response_time),
        cell(row.success_pct),
    ]
}

fn write_table<const N: usize>(
    path: &Path,
    header: [&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| HarnessError::csv(path, e))?;
    writer
        .write_record(header)
        .map_err(|e| HarnessError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| HarnessError::csv(path, e))?;
    }
    writer.flush().map_err(|e| HarnessError::io(path, e))
}

/// Paths of the written tables
#[derive(Debug, Clone)]
pub struct TableFiles {
    pub aggregate: PathBuf,
    pub endpoints: PathBuf,
}

/// Write both summary tables into `dir`
pub fn write_tables(dir: &Path, summary: &Summary) -> Result<TableFiles> {
    let files = TableFiles {
        aggregate: dir.join(AGGREGATE_TABLE),
        endpoints: dir.join(ENDPOINT_TABLE),
    };

    write_table(
        &files.aggregate,
        AGGREGATE_HEADER,
        summary.aggregate.iter().map(aggregate_cells),
    )?;
    write_table(
        &files.endpoints,
        ENDPOINT_HEADER,
        summary.endpoints.iter().map(endpoint_cells),
    )?;

    Ok(files)
}

/// Print the aggregate table as aligned columns
pub fn print_summary(summary: &Summary) {
    let rows: Vec<[String; 8]> = summary.aggregate.iter().map(aggregate_cells).collect();

    let mut widths = AGGREGATE_HEADER.map(|h| h.chars().count());
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (value, width))| {
                let pad = width - value.chars().count();
                if i == 0 {
                    format!("{}{}", value, " ".repeat(pad))
                } else {
                    format!("{}{}", " ".repeat(pad), value)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("\n=== Resumo agregado por cenário ===");
    println!("{}", line(AGGREGATE_HEADER.map(String::from).as_slice()));
    for row in &rows {
        println!("{}", line(row.as_slice()));
    }
    println!();
}
