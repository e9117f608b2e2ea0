//! Load scenarios and their file-name markers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

/// One of the three predefined load profiles.
///
/// The variant order is the display order of every summary table and chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Light load (`cenario_A`)
    Light,
    /// Moderate load (`cenario_B`)
    Moderate,
    /// Peak load (`cenario_C`)
    Peak,
}

impl Scenario {
    /// All scenarios in display order
    pub const ALL: [Scenario; 3] = [Scenario::Light, Scenario::Moderate, Scenario::Peak];

    /// Substring identifying the scenario in a result file name
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Light => "cenario_A",
            Self::Moderate => "cenario_B",
            Self::Peak => "cenario_C",
        }
    }

    /// Label used in summary tables and chart axes
    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "A (Leve)",
            Self::Moderate => "B (Moderado)",
            Self::Peak => "C (Pico)",
        }
    }

    /// Single-letter code (`A`, `B`, `C`)
    pub fn code(&self) -> char {
        match self {
            Self::Light => 'A',
            Self::Moderate => 'B',
            Self::Peak => 'C',
        }
    }

    /// Infer the scenario from a file name. First matching marker wins.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| file_name.contains(scenario.marker()))
    }

    /// File-name prefix for one run of this scenario, e.g. `cenario_A_run3`
    pub fn run_prefix(&self, run: u32) -> String {
        format!("{}_run{}", self.marker(), run)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Scenario {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "light" | "leve" => Ok(Self::Light),
            "b" | "moderate" | "moderado" => Ok(Self::Moderate),
            "c" | "peak" | "pico" => Ok(Self::Peak),
            other => Err(HarnessError::InvalidInput(format!(
                "unknown scenario '{}', expected A, B or C",
                other
            ))),
        }
    }
}
