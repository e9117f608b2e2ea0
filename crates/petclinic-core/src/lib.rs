//! # PetClinic Load Harness Core
//!
//! Types shared by the load driver and the results aggregator. The two
//! components only meet through CSV files on disk, so this crate owns the
//! vocabulary of those files:
//! - `Scenario` - the three load profiles and the file-name markers that identify them
//! - `StatsRecord` - one row of a per-run statistics CSV
//! - `endpoint` - the PetClinic API surface and the analysis allow-list
//! - `HarnessError` - the error type of both components
//!
//! ```text
//!   petclinic-loadtest ──writes──► results/cenario_X_runN_stats.csv ──reads──► petclinic-analysis
//! ```

pub mod endpoint;
pub mod error;
pub mod scenario;
pub mod stats;

pub use endpoint::*;
pub use error::*;
pub use scenario::*;
pub use stats::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::endpoint::{ENDPOINT_ALLOW_LIST, OWNERS, OWNER_BY_ID_NAME, VETS};
    pub use crate::error::{HarnessError, Result};
    pub use crate::scenario::Scenario;
    pub use crate::stats::{success_percentage, StatsRecord, AGGREGATED_ROW};
}
