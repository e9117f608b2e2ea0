//! Bar charts of the summary tables
//!
//! Eight charts, one file each: six compare scenarios on one figure of the
//! aggregate table, two compare endpoints across scenarios. Text is drawn
//! with a TrueType font loaded at runtime, so rendering needs either an
//! explicit font file or one of the usual system fonts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::Mutex;
use petclinic_core::{HarnessError, Result, Scenario};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use tracing::{debug, info};

use crate::aggregate::{AggregateRow, Pivot, Summary};

const FONT_FAMILY: &str = "sans-serif";

/// Searched in order when no font file is configured
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Horizontal space left empty on each side of a bar group
const GROUP_MARGIN: f64 = 0.1;

/// Pixels between the x axis and the category labels
const CATEGORY_LABEL_GAP: i32 = 6;

const SCENARIO_CHART_SIZE: (u32, u32) = (1000, 600);
const ENDPOINT_CHART_SIZE: (u32, u32) = (1200, 700);

const BLUE_C0: RGBColor = RGBColor(31, 119, 180);
const ORANGE_C1: RGBColor = RGBColor(255, 127, 14);
const GREEN_C2: RGBColor = RGBColor(44, 160, 44);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);

/// Image format of the chart files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// One bar series
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub label: String,
    pub color: RGBColor,
    /// One value per category, missing values draw no bar
    pub values: Vec<Option<f64>>,
}

/// A grouped bar chart, independent of any backend
#[derive(Debug, Clone)]
pub struct BarChart {
    /// File stem
    pub name: &'static str,
    pub title: &'static str,
    pub x_desc: Option<&'static str>,
    pub y_desc: &'static str,
    pub size: (u32, u32),
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    /// Fixed top of the y axis, otherwise fitted to the data
    pub y_max: Option<f64>,
}

impl BarChart {
    fn scenario_chart(
        name: &'static str,
        title: &'static str,
        y_desc: &'static str,
        summary: &Summary,
        series: Vec<BarSeries>,
    ) -> Self {
        Self {
            name,
            title,
            x_desc: None,
            y_desc,
            size: SCENARIO_CHART_SIZE,
            categories: summary
                .aggregate
                .iter()
                .map(|row| row.scenario.label().to_string())
                .collect(),
            series,
            y_max: None,
        }
    }

    fn endpoint_chart(
        name: &'static str,
        title: &'static str,
        y_desc: &'static str,
        pivot: &Pivot,
    ) -> Self {
        Self {
            name,
            title,
            x_desc: Some("Endpoint"),
            y_desc,
            size: ENDPOINT_CHART_SIZE,
            categories: pivot.endpoints.clone(),
            series: pivot
                .scenarios
                .iter()
                .map(|scenario| BarSeries {
                    label: scenario.label().to_string(),
                    color: scenario_color(*scenario),
                    values: pivot.column(*scenario),
                })
                .collect(),
            y_max: None,
        }
    }

    fn with_y_max(mut self, y_max: f64) -> Self {
        self.y_max = Some(y_max);
        self
    }

    /// Top of the y axis
    pub fn y_upper(&self) -> f64 {
        if let Some(y_max) = self.y_max {
            return y_max;
        }
        let highest = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold(0.0_f64, |acc, v| acc.max(*v));
        if highest > 0.0 {
            highest * 1.1
        } else {
            1.0
        }
    }
}

fn scenario_color(scenario: Scenario) -> RGBColor {
    match scenario {
        Scenario::Light => BLUE_C0,
        Scenario::Moderate => ORANGE_C1,
        Scenario::Peak => GREEN_C2,
    }
}

fn single(label: &str, color: RGBColor, values: Vec<Option<f64>>) -> Vec<BarSeries> {
    vec![BarSeries {
        label: label.to_string(),
        color,
        values,
    }]
}

/// The eight charts of a summary, in file order
pub fn summary_charts(summary: &Summary) -> Vec<BarChart> {
    let column = |field: fn(&AggregateRow) -> Option<f64>| {
        summary.aggregate.iter().map(field).collect::<Vec<_>>()
    };

    vec![
        BarChart::scenario_chart(
            "grafico_01_tempo_medio_max",
            "Tempo de Resposta Médio e Máximo por Cenário (Agregado)",
            "Tempo (ms)",
            summary,
            vec![
                BarSeries {
                    label: "Tempo Médio (ms)".into(),
                    color: BLUE_C0,
                    values: column(|r| r.avg_response_time),
                },
                BarSeries {
                    label: "Tempo Máximo (ms)".into(),
                    color: ORANGE_C1,
                    values: column(|r| r.max_response_time),
                },
            ],
        ),
        BarChart::scenario_chart(
            "grafico_02_req_por_segundo",
            "Requisições por Segundo (RPS) por Cenário (Agregado)",
            "Requisições/Segundo",
            summary,
            single("Req/s", BLUE, column(|r| r.requests_per_sec)),
        ),
        BarChart::scenario_chart(
            "grafico_03_sucesso_perc",
            "Porcentagem de Sucesso por Cenário (Agregado)",
            "% de Sucesso",
            summary,
            single("% Sucesso", DARK_GREEN, column(|r| r.success_pct)),
        )
        .with_y_max(101.0),
        BarChart::scenario_chart(
            "grafico_04_total_reqs",
            "Total de Requisições Atendidas por Cenário",
            "Nº de Requisições",
            summary,
            single("Total Requisições", PURPLE, column(|r| r.total_requests)),
        ),
        BarChart::scenario_chart(
            "grafico_05_tempo_p90",
            "Percentil 90 (P90) de Tempo de Resposta (Agregado)",
            "Tempo (ms)",
            summary,
            single("P90 (ms)", ORANGE, column(|r| r.p90)),
        ),
        BarChart::scenario_chart(
            "grafico_06_total_falhas",
            "Contagem Total de Falhas por Cenário (Agregado)",
            "Nº de Falhas (média das runs)",
            summary,
            single("Total Falhas", RED, column(|r| r.total_failures)),
        ),
        BarChart::endpoint_chart(
            "grafico_07_endpoint_tempo",
            "Tempo Médio de Resposta por Endpoint",
            "Tempo (ms)",
            &summary.pivot_response_time(),
        ),
        BarChart::endpoint_chart(
            "grafico_08_endpoint_sucesso",
            "Taxa de Sucesso por Endpoint",
            "% Sucesso",
            &summary.pivot_success(),
        )
        .with_y_max(101.0),
    ]
}

/// The configured font, else the first system font that exists
pub fn find_font(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.is_file().then(|| path.to_path_buf());
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// Font files read so far, each kept for the life of the process
static FONT_CACHE: OnceLock<Mutex<HashMap<PathBuf, &'static [u8]>>> = OnceLock::new();

/// Bytes of a font file, read at most once per path
fn font_bytes(path: &Path) -> Result<&'static [u8]> {
    let mut cache = FONT_CACHE.get_or_init(Default::default).lock();
    if let Some(bytes) = cache.get(path) {
        return Ok(*bytes);
    }

    let bytes = std::fs::read(path).map_err(|e| HarnessError::io(path, e))?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    cache.insert(path.to_path_buf(), bytes);
    Ok(bytes)
}

/// Load a TrueType font as the family every chart uses
fn load_font(path: &Path) -> Result<()> {
    register_font(FONT_FAMILY, FontStyle::Normal, font_bytes(path)?).map_err(|_| {
        HarnessError::Chart {
            name: FONT_FAMILY.to_string(),
            reason: format!("{} is not a usable TrueType font", path.display()),
        }
    })
}

/// Middle of category `i` on the x axis
fn category_center(i: usize) -> f64 {
    i as f64 + 0.5
}

/// Horizontal extent of bar `j` of `n` within category `i`
fn bar_span(i: usize, j: usize, n: usize) -> (f64, f64) {
    let width = (1.0 - 2.0 * GROUP_MARGIN) / n.max(1) as f64;
    let x0 = i as f64 + GROUP_MARGIN + j as f64 * width;
    (x0, x0 + width)
}

/// Writes charts into one directory
pub struct ChartRenderer {
    dir: PathBuf,
    format: ChartFormat,
}

impl ChartRenderer {
    /// Load `font` and render into `dir`
    pub fn new(dir: impl Into<PathBuf>, format: ChartFormat, font: &Path) -> Result<Self> {
        load_font(font)?;
        debug!("Chart font {}", font.display());
        Ok(Self {
            dir: dir.into(),
            format,
        })
    }

    pub fn path_for(&self, chart: &BarChart) -> PathBuf {
        self.dir
            .join(format!("{}.{}", chart.name, self.format.extension()))
    }

    /// Render one chart, returning its file
    pub fn render(&self, chart: &BarChart) -> Result<PathBuf> {
        let path = self.path_for(chart);
        let drawn = match self.format {
            ChartFormat::Png => {
                draw(BitMapBackend::new(&path, chart.size).into_drawing_area(), chart)
                    .map_err(|e| e.to_string())
            }
            ChartFormat::Svg => draw(SVGBackend::new(&path, chart.size).into_drawing_area(), chart)
                .map_err(|e| e.to_string()),
        };
        drawn.map_err(|reason| HarnessError::Chart {
            name: chart.name.to_string(),
            reason,
        })?;

        debug!("Chart saved to {}", path.display());
        Ok(path)
    }

    /// Render all charts of a summary
    pub fn render_summary(&self, summary: &Summary) -> Result<Vec<PathBuf>> {
        let files = summary_charts(summary)
            .iter()
            .map(|chart| self.render(chart))
            .collect::<Result<Vec<_>>>()?;
        info!("{} charts written to {}", files.len(), self.dir.display());
        Ok(files)
    }
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    chart: &BarChart,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let slots = chart.categories.len().max(1);
    let mut labels = Vec::with_capacity(chart.categories.len());

    {
        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title, (FONT_FAMILY, 22))
            .margin(20)
            .x_label_area_size(if chart.x_desc.is_some() { 70 } else { 40 })
            .y_label_area_size(80)
            .build_cartesian_2d(0.0..slots as f64, 0.0..chart.y_upper())?;

        // categories are labelled below, under their bar group
        let no_label = |_: &f64| String::new();
        let mut mesh = ctx.configure_mesh();
        mesh.disable_x_mesh()
            .x_label_formatter(&no_label)
            .y_label_style((FONT_FAMILY, 14))
            .y_desc(chart.y_desc);
        if let Some(x_desc) = chart.x_desc {
            mesh.x_desc(x_desc);
        }
        mesh.draw()?;

        let groups = chart.series.len();
        for (j, series) in chart.series.iter().enumerate() {
            let color = series.color;
            ctx.draw_series(series.values.iter().enumerate().filter_map(|(i, value)| {
                value.map(|v| {
                    let (x0, x1) = bar_span(i, j, groups);
                    Rectangle::new([(x0, 0.0), (x1, v)], color.filled())
                })
            }))?
            .label(series.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        if groups > 1 {
            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font((FONT_FAMILY, 14))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        for (i, category) in chart.categories.iter().enumerate() {
            let (x, y) = ctx.backend_coord(&(category_center(i), 0.0));
            labels.push((category.as_str(), (x, y + CATEGORY_LABEL_GAP)));
        }
    }

    let label_style = TextStyle::from((FONT_FAMILY, 14).into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (text, position) in labels {
        root.draw(&Text::new(text, position, label_style.clone()))?;
    }

    root.present()?;
    Ok(())
}
