//! Mock install pipeline for previewing an install without touching Docker.
//!
//! Steps advance `pending -> running -> completed | failed` after a fixed
//! delay. Each step fails with a constant probability and the run stops at
//! the first failure; later steps stay pending and nothing is rolled back.

use component_registry::Catalog;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::SimulatorConfig,
    types::{ContainerState, Health, InstallStep, ServiceStatus, StepStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Snapshot of a simulated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationProgress {
    pub status: RunStatus,
    pub steps: Vec<InstallStep>,
    pub current_step: Option<String>,
    /// Percentage of finished steps
    pub overall_progress: f32,
    /// Remaining time if every pending step takes the full delay
    pub estimated_remaining_ms: u64,
    pub output: Vec<String>,
    pub services: Vec<ServiceStatus>,
}

impl SimulationProgress {
    fn new(steps: Vec<InstallStep>, step_delay_ms: u64) -> Self {
        let estimated_remaining_ms = steps.len() as u64 * step_delay_ms;
        Self {
            status: RunStatus::NotStarted,
            steps,
            current_step: None,
            overall_progress: 0.0,
            estimated_remaining_ms,
            output: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    fn refresh(&mut self, step_delay_ms: u64) {
        let finished = self.steps.iter().filter(|s| s.status.is_finished()).count();
        let pending = self.steps.len() - finished;
        self.overall_progress = if self.steps.is_empty() {
            100.0
        } else {
            finished as f32 * 100.0 / self.steps.len() as f32
        };
        self.estimated_remaining_ms = match self.status {
            RunStatus::NotStarted | RunStatus::Running => pending as u64 * step_delay_ms,
            _ => 0,
        };
    }
}

/// Pipeline steps for installing `components`, in order
pub fn pipeline_steps(catalog: &Catalog, components: &[String]) -> Vec<InstallStep> {
    let mut steps = vec![
        InstallStep::pending(
            "check-environment",
            "Check environment",
            "Verify Docker and Docker Compose are available",
        ),
        InstallStep::pending(
            "create-network",
            "Create network",
            "Create the dedicated monitoring network",
        ),
    ];

    steps.extend(components.iter().map(|id| {
        let name = catalog.get(id).map(|c| c.name).unwrap_or(id.as_str());
        InstallStep::pending(
            format!("install-{}", id),
            format!("Install {}", name),
            format!("Download and start the {} service", id),
        )
    }));

    steps.push(InstallStep::pending(
        "verify-services",
        "Verify services",
        "Check that every service is running",
    ));
    steps
}

pub struct ProgressSimulator {
    catalog: Catalog,
    config: SimulatorConfig,
    components: Vec<String>,
    progress: Arc<Mutex<SimulationProgress>>,
}

impl ProgressSimulator {
    pub fn new(catalog: Catalog, config: SimulatorConfig, components: Vec<String>) -> Self {
        let steps = pipeline_steps(&catalog, &components);
        let progress = SimulationProgress::new(steps, config.step_delay_ms);
        Self {
            catalog,
            config,
            components,
            progress: Arc::new(Mutex::new(progress)),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub async fn get_progress(&self) -> SimulationProgress {
        self.progress.lock().await.clone()
    }

    pub async fn is_finished(&self) -> bool {
        self.progress.lock().await.is_finished()
    }

    /// Marks an unfinished run as cancelled. Steps keep their last status.
    pub async fn cancel(&self) {
        let mut progress = self.progress.lock().await;
        if !progress.is_finished() {
            progress.status = RunStatus::Cancelled;
            progress.current_step = None;
            progress.refresh(self.config.step_delay_ms);
            info!("Simulation cancelled");
        }
    }

    /// Drives every step to completion or the first failure
    #[instrument(name = "simulate_install", skip_all, fields(components = self.components.len()))]
    pub async fn run<R: Rng + Send>(&self, rng: &mut R) -> SimulationProgress {
        let started = Instant::now();
        let delay = self.config.step_delay();
        let failure_probability = self.config.failure_probability();

        let step_ids: Vec<String> = {
            let mut progress = self.progress.lock().await;
            if progress.is_finished() {
                return progress.clone();
            }
            progress.status = RunStatus::Running;
            progress.steps.iter().map(|s| s.id.clone()).collect()
        };

        for (index, step_id) in step_ids.iter().enumerate() {
            if !self
                .update_step(index, started, |step| step.status = StepStatus::Running)
                .await
            {
                break;
            }
            debug!("Step {} running", step_id);

            sleep(delay).await;

            if rng.gen_bool(failure_probability) {
                warn!("Simulated failure in step {}", step_id);
                self.update_step(index, started, |step| {
                    step.status = StepStatus::Failed;
                    step.error = Some(format!("{} failed", step.name));
                })
                .await;

                let mut progress = self.progress.lock().await;
                if progress.status == RunStatus::Running {
                    progress.status = RunStatus::Failed;
                    progress.current_step = None;
                    progress.refresh(self.config.step_delay_ms);
                }
                break;
            }

            if !self
                .update_step(index, started, |step| step.status = StepStatus::Completed)
                .await
            {
                break;
            }

            if let Some(component) = step_id.strip_prefix("install-") {
                let service = self.mock_service(component, rng);
                self.progress.lock().await.services.push(service);
            }
        }

        let mut progress = self.progress.lock().await;
        if progress.status == RunStatus::Running {
            progress.status = RunStatus::Completed;
            progress.current_step = None;
            progress.refresh(self.config.step_delay_ms);
            info!("Simulated install finished in {:?}", started.elapsed());
        }
        progress.clone()
    }

    /// Applies `apply` to a step of a running run. Returns false once the
    /// run has been cancelled.
    async fn update_step<F>(&self, index: usize, started: Instant, apply: F) -> bool
    where
        F: FnOnce(&mut InstallStep),
    {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let mut progress = self.progress.lock().await;
        if progress.status != RunStatus::Running {
            return false;
        }

        let Some(step) = progress.steps.get_mut(index) else {
            return false;
        };
        apply(step);

        let line = match step.status {
            StepStatus::Running => {
                step.started_at_ms = Some(elapsed_ms);
                format!("[{:>6}ms] {}...", elapsed_ms, step.name)
            }
            StepStatus::Completed => {
                step.finished_at_ms = Some(elapsed_ms);
                format!("[{:>6}ms] {} done", elapsed_ms, step.name)
            }
            StepStatus::Failed => {
                step.finished_at_ms = Some(elapsed_ms);
                format!(
                    "[{:>6}ms] {}",
                    elapsed_ms,
                    step.error.clone().unwrap_or_default()
                )
            }
            StepStatus::Pending => return true,
        };
        let current = (step.status == StepStatus::Running).then(|| step.id.clone());

        progress.output.push(line);
        progress.current_step = current;
        progress.refresh(self.config.step_delay_ms);
        true
    }

    fn mock_service<R: Rng>(&self, component: &str, rng: &mut R) -> ServiceStatus {
        let suffix: String = (0..9)
            .map(|_| char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
            .collect();

        ServiceStatus {
            name: component.to_string(),
            status: ContainerState::Running,
            container_id: Some(format!("mock-{}-{}", component, suffix)),
            ports: self
                .catalog
                .get(component)
                .map(|c| vec![format!("{}:{}", c.default_port, c.default_port)])
                .unwrap_or_default(),
            uptime: Some("0s".to_string()),
            health: Some(Health::Healthy),
        }
    }
}
