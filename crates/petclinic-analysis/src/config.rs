//! Aggregator settings

use std::path::PathBuf;

use petclinic_core::{HarnessError, Result};

use crate::charts::{find_font, ChartFormat};

/// Where to read runs from and how to draw charts
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Input directory, also receives tables and charts
    pub results_dir: PathBuf,
    pub chart_format: ChartFormat,
    /// TrueType font for chart text, system fonts are searched when unset
    pub font_path: Option<PathBuf>,
    /// Render charts at all
    pub charts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            chart_format: ChartFormat::default(),
            font_path: None,
            charts: true,
        }
    }
}

impl AnalysisConfig {
    /// Font to render with.
    ///
    /// `Ok(None)` means no system font was found. A configured font
    /// that does not exist is an error.
    pub fn chart_font(&self) -> Result<Option<PathBuf>> {
        match &self.font_path {
            Some(path) => find_font(Some(path)).map(Some).ok_or_else(|| {
                HarnessError::InvalidInput(format!("font file {} not found", path.display()))
            }),
            None => Ok(find_font(None)),
        }
    }
}
