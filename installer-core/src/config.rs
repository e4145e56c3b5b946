use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the mock install pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorConfig {
    /// Time each step spends in `running`
    pub step_delay_ms: u64,
    /// Chance in `[0, 1]` that any single step fails
    pub failure_probability: f64,
    /// How long a finished run stays readable
    pub retention_secs: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 1000,
            failure_probability: 0.1,
            retention_secs: 600,
        }
    }
}

impl SimulatorConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Clamps the probability into range; NaN is treated as zero.
    pub fn failure_probability(&self) -> f64 {
        if self.failure_probability.is_nan() {
            0.0
        } else {
            self.failure_probability.clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallerConfig {
    /// Each install gets its own subdirectory here
    pub work_root: PathBuf,
    /// External Docker network every compose file joins
    pub network: String,
    pub max_concurrent_actions: usize,
    /// Wait after `up -d` before the container status is read
    pub install_settle_ms: u64,
    /// Wait after `restart` before the container status is read
    pub restart_settle_ms: u64,
    pub simulator: SimulatorConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("monitoring-install"),
            network: "monitoring".to_string(),
            max_concurrent_actions: 4,
            install_settle_ms: 3000,
            restart_settle_ms: 2000,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl InstallerConfig {
    pub fn with_work_root(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = work_root.into();
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Zero settle delays, for tests and dry runs
    pub fn without_settle_delay(mut self) -> Self {
        self.install_settle_ms = 0;
        self.restart_settle_ms = 0;
        self
    }
}
