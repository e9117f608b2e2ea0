//! Load test configuration

use petclinic_core::{HarnessError, Result, Scenario};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted request timeout, also the ceiling of the latency histograms
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Slowest accepted ramp-up, one user every 1000 seconds
pub const MIN_SPAWN_RATE: f64 = 0.001;

/// Complete load test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestConfig {
    /// PetClinic base URL
    #[serde(default = "default_host")]
    pub host: String,

    /// Directory receiving the per-run CSV files
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Repetitions of each scenario
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Shortest think time between two tasks of a user
    #[serde(default = "default_wait_min_ms")]
    pub wait_min_ms: u64,

    /// Longest think time between two tasks of a user
    #[serde(default = "default_wait_max_ms")]
    pub wait_max_ms: u64,

    #[serde(default = "ScenarioProfile::light")]
    pub light: ScenarioProfile,

    #[serde(default = "ScenarioProfile::moderate")]
    pub moderate: ScenarioProfile,

    #[serde(default = "ScenarioProfile::peak")]
    pub peak: ScenarioProfile,
}

fn default_host() -> String {
    "http://localhost:8080".to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_runs() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_wait_min_ms() -> u64 {
    500
}

fn default_wait_max_ms() -> u64 {
    2000
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            results_dir: default_results_dir(),
            runs: default_runs(),
            request_timeout_secs: default_request_timeout_secs(),
            wait_min_ms: default_wait_min_ms(),
            wait_max_ms: default_wait_max_ms(),
            light: ScenarioProfile::light(),
            moderate: ScenarioProfile::moderate(),
            peak: ScenarioProfile::peak(),
        }
    }
}

impl LoadTestConfig {
    /// Load from a TOML file, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Profile of a scenario
    pub fn profile(&self, scenario: Scenario) -> &ScenarioProfile {
        match scenario {
            Scenario::Light => &self.light,
            Scenario::Moderate => &self.moderate,
            Scenario::Peak => &self.peak,
        }
    }

    pub fn profile_mut(&mut self, scenario: Scenario) -> &mut ScenarioProfile {
        match scenario {
            Scenario::Light => &mut self.light,
            Scenario::Moderate => &mut self.moderate,
            Scenario::Peak => &mut self.peak,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn wait_time(&self) -> WaitTime {
        WaitTime::between(
            Duration::from_millis(self.wait_min_ms),
            Duration::from_millis(self.wait_max_ms),
        )
    }

    /// Reject configurations the runner cannot execute
    pub fn validate(&self) -> Result<()> {
        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            return Err(HarnessError::Config(format!(
                "host must be an http(s) URL, got '{}'",
                self.host
            )));
        }
        if self.runs == 0 {
            return Err(HarnessError::Config("runs must be at least 1".into()));
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(HarnessError::Config(format!(
                "request_timeout_secs must be between 1 and {}, got {}",
                MAX_REQUEST_TIMEOUT_SECS, self.request_timeout_secs
            )));
        }
        if self.wait_min_ms > self.wait_max_ms {
            return Err(HarnessError::Config(format!(
                "wait_min_ms ({}) exceeds wait_max_ms ({})",
                self.wait_min_ms, self.wait_max_ms
            )));
        }
        for scenario in Scenario::ALL {
            self.profile(scenario).validate(scenario)?;
        }
        Ok(())
    }
}

/// Shape of one load scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// Number of concurrent virtual users
    pub users: usize,

    /// Users started per second until `users` are running
    pub spawn_rate: f64,

    /// Run duration in seconds, ramp-up included
    pub duration_secs: u64,
}

impl ScenarioProfile {
    pub fn light() -> Self {
        Self {
            users: 10,
            spawn_rate: 2.0,
            duration_secs: 60,
        }
    }

    pub fn moderate() -> Self {
        Self {
            users: 50,
            spawn_rate: 5.0,
            duration_secs: 60,
        }
    }

    pub fn peak() -> Self {
        Self {
            users: 100,
            spawn_rate: 10.0,
            duration_secs: 60,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Delay between two user spawns, never longer than the run itself
    pub fn spawn_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.spawn_rate)
            .unwrap_or(Duration::MAX)
            .min(self.duration())
    }

    fn validate(&self, scenario: Scenario) -> Result<()> {
        if self.users == 0 {
            return Err(HarnessError::Config(format!(
                "scenario {} needs at least one user",
                scenario
            )));
        }
        if !(self.spawn_rate.is_finite() && self.spawn_rate >= MIN_SPAWN_RATE) {
            return Err(HarnessError::Config(format!(
                "scenario {} spawn_rate must be at least {}, got {}",
                scenario, MIN_SPAWN_RATE, self.spawn_rate
            )));
        }
        if self.duration_secs == 0 {
            return Err(HarnessError::Config(format!(
                "scenario {} duration must be at least one second",
                scenario
            )));
        }
        Ok(())
    }
}

/// Uniformly distributed think time between two tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    pub fn between(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// No wait at all
    pub fn none() -> Self {
        Self::between(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LoadTestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runs, 5);
        assert_eq!(config.profile(Scenario::Peak).users, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LoadTestConfig = toml::from_str(
            r#"
            host = "http://petclinic:9966"
            runs = 2

            [peak]
            users = 250
            spawn_rate = 25.0
            duration_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "http://petclinic:9966");
        assert_eq!(config.runs, 2);
        assert_eq!(config.wait_min_ms, 500);
        assert_eq!(config.light, ScenarioProfile::light());
        assert_eq!(config.peak.users, 250);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = LoadTestConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.host, default_host());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("petclinic.toml");
        std::fs::write(&path, "runs = 0\n").unwrap();

        let err = LoadTestConfig::load(&path).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_validate() {
        let mut config = LoadTestConfig::default();
        config.host = "localhost:8080".into();
        assert!(config.validate().is_err());

        let mut config = LoadTestConfig::default();
        config.wait_min_ms = 3000;
        assert!(config.validate().is_err());

        let mut config = LoadTestConfig::default();
        config.profile_mut(Scenario::Moderate).spawn_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wait_time_sample_in_bounds() {
        let wait = WaitTime::between(Duration::from_millis(500), Duration::from_millis(2000));
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let d = wait.sample(&mut rng);
            assert!(d >= Duration::from_millis(500) && d <= Duration::from_millis(2000));
        }
        assert_eq!(WaitTime::none().sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn test_spawn_interval() {
        assert_eq!(
            ScenarioProfile::moderate().spawn_interval(),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_tiny_spawn_rate_rejected() {
        let mut config = LoadTestConfig::default();
        config.light.spawn_rate = 1e-20;
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));

        config.light.spawn_rate = MIN_SPAWN_RATE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_spawn_interval_capped_by_duration() {
        let profile = ScenarioProfile {
            users: 2,
            spawn_rate: 1e-20,
            duration_secs: 60,
        };
        assert_eq!(profile.spawn_interval(), Duration::from_secs(60));

        let profile = ScenarioProfile {
            spawn_rate: MIN_SPAWN_RATE,
            ..profile
        };
        assert_eq!(profile.spawn_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_request_timeout_bounds() {
        let mut config = LoadTestConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());

        config.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS;
        assert!(config.validate().is_ok());
    }
}
