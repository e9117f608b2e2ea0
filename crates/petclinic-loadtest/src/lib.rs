//! # PetClinic Load Testing
//!
//! Synthetic users for the PetClinic REST backend.
//!
//! ## Features
//!
//! - **Weighted User Profile**: list owners (40), get owner by id (30), list vets (20),
//!   create owner (10)
//! - **Shared Owner Registry**: ids created during a run become lookup targets for every user
//! - **Scenario Suite**: light, moderate and peak profiles, each repeated N times
//! - **Locust-Compatible Output**: `cenario_X_runN_stats.csv` and `_failures.csv` per run
//! - **HDR Histograms**: response time percentiles per endpoint
//!
//! ## Usage
//!
//! ```bash
//! # Run the three scenarios, five runs each
//! cargo run --package petclinic-loadtest -- --host http://localhost:8080 suite
//!
//! # Run the peak scenario twice with 200 users
//! cargo run --package petclinic-loadtest -- --runs 2 run --scenario C --users 200
//! ```

pub mod config;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod runner;
pub mod session;
pub mod tasks;

pub use config::{
    LoadTestConfig, ScenarioProfile, WaitTime, MAX_REQUEST_TIMEOUT_SECS, MIN_SPAWN_RATE,
};
pub use metrics::{EndpointStats, FailureRecord, RequestStats};
pub use registry::{OwnerRegistry, SEED_OWNER_IDS};
pub use report::{RunFiles, RunSummary};
pub use runner::{run_scenario, run_suite, LoadTestRunner, VirtualUser};
pub use session::{HttpSession, Reply};
pub use tasks::{
    created_owner_id, CreateOwner, GetOwnerById, ListOwners, ListVets, NewOwner, TaskSet,
    UserContext, UserTask,
};
