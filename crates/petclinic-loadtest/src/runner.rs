//! Load test runner
//!
//! Spawns virtual users at the scenario's spawn rate, lets every user loop
//! over weighted tasks with a random think time, and stops them all when the
//! scenario duration elapses.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use petclinic_core::{HarnessError, Result, Scenario};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until};
use tracing::{debug, info, warn};

use crate::config::{LoadTestConfig, ScenarioProfile, WaitTime};
use crate::metrics::RequestStats;
use crate::registry::OwnerRegistry;
use crate::report::{RunFiles, RunSummary};
use crate::session::HttpSession;
use crate::tasks::{TaskSet, UserContext};

// ============================================================================
// VIRTUAL USER
// ============================================================================

/// One simulated PetClinic client
pub struct VirtualUser {
    id: usize,
    ctx: UserContext,
    tasks: Arc<TaskSet>,
    wait: WaitTime,
}

impl VirtualUser {
    pub fn new(id: usize, ctx: UserContext, tasks: Arc<TaskSet>, wait: WaitTime) -> Self {
        Self {
            id,
            ctx,
            tasks,
            wait,
        }
    }

    /// Run tasks until shutdown is signalled
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        debug!("User {} started", self.id);

        while !*shutdown.borrow() {
            let (task, wait) = {
                let mut rng = rand::thread_rng();
                (self.tasks.pick(&mut rng), self.wait.sample(&mut rng))
            };

            tokio::select! {
                _ = task.execute(&self.ctx) => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = sleep(wait) => {}
                _ = shutdown.changed() => break,
            }
        }

        debug!("User {} stopped", self.id);
    }
}

// ============================================================================
// LOAD TEST RUNNER
// ============================================================================

/// Runs one scenario once
pub struct LoadTestRunner {
    host: String,
    scenario: Scenario,
    profile: ScenarioProfile,
    wait: WaitTime,
    client: reqwest::Client,
    tasks: Arc<TaskSet>,
    registry: Arc<OwnerRegistry>,
    stats: Arc<RequestStats>,
}

impl LoadTestRunner {
    /// Runner for `scenario` with a fresh owner registry
    pub fn new(config: &LoadTestConfig, scenario: Scenario) -> Result<Self> {
        let profile = config.profile(scenario).clone();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(profile.users)
            .build()
            .map_err(|e| HarnessError::HttpClient(e.to_string()))?;

        Ok(Self {
            host: config.host.clone(),
            scenario,
            profile,
            wait: config.wait_time(),
            client,
            tasks: Arc::new(TaskSet::petclinic()?),
            registry: Arc::new(OwnerRegistry::new()),
            stats: Arc::new(RequestStats::new()),
        })
    }

    /// Share an existing owner registry with this runner's users
    pub fn with_registry(mut self, registry: Arc<OwnerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tasks(mut self, tasks: TaskSet) -> Self {
        self.tasks = Arc::new(tasks);
        self
    }

    pub fn registry(&self) -> &Arc<OwnerRegistry> {
        &self.registry
    }

    /// Run the scenario and summarise it as run number `run`
    pub async fn run(&self, run: u32) -> Result<RunSummary> {
        info!(
            "Starting {} run {} against {}: {} users at {}/s for {}s",
            self.scenario,
            run,
            self.host,
            self.profile.users,
            self.profile.spawn_rate,
            self.profile.duration_secs
        );

        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.profile.duration();
        self.stats.start();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut users: Vec<JoinHandle<()>> = Vec::with_capacity(self.profile.users);

        // Ramp-up phase
        for id in 0..self.profile.users {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    "Duration elapsed during ramp-up, {} of {} users started",
                    id, self.profile.users
                );
                break;
            }

            let user = VirtualUser::new(id, self.user_context(), self.tasks.clone(), self.wait);
            users.push(tokio::spawn(user.run(shutdown_rx.clone())));

            if id + 1 < self.profile.users {
                tokio::select! {
                    _ = sleep(self.profile.spawn_interval()) => {}
                    _ = sleep_until(deadline) => {}
                }
            }
        }
        info!("Ramp-up complete: {} users running", users.len());

        sleep_until(deadline).await;

        // A closed channel also stops the users
        let _ = shutdown_tx.send(true);
        let user_count = users.len();
        for result in join_all(users).await {
            if let Err(e) = result {
                warn!("Virtual user panicked: {}", e);
            }
        }

        let summary = RunSummary {
            scenario: self.scenario,
            run,
            started_at,
            duration_secs: start.elapsed().as_secs_f64(),
            users: user_count,
            records: self.stats.records(),
            failures: self.stats.failures(),
        };

        info!(
            "{} run {} complete: {} owners known",
            self.scenario,
            run,
            self.registry.len()
        );
        Ok(summary)
    }

    fn user_context(&self) -> UserContext {
        UserContext {
            session: HttpSession::new(self.client.clone(), &self.host, self.stats.clone()),
            registry: self.registry.clone(),
        }
    }
}

// ============================================================================
// SCENARIO SUITE
// ============================================================================

/// Run `scenario` `config.runs` times, writing each run's CSV files
pub async fn run_scenario(config: &LoadTestConfig, scenario: Scenario) -> Result<Vec<RunFiles>> {
    let mut written = Vec::with_capacity(config.runs as usize);

    for run in 1..=config.runs {
        let runner = LoadTestRunner::new(config, scenario)?;
        let summary = runner.run(run).await?;
        summary.print_report();
        written.push(summary.write(&config.results_dir)?);
    }

    Ok(written)
}

/// Run every scenario in display order
pub async fn run_suite(config: &LoadTestConfig) -> Result<Vec<RunFiles>> {
    let mut written = Vec::new();
    for scenario in Scenario::ALL {
        written.extend(run_scenario(config, scenario).await?);
    }

    info!(
        "Suite complete: {} result files in {}",
        written.len(),
        config.results_dir.display()
    );
    Ok(written)
}
