use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::{fs, sync::Semaphore, time::sleep};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::InstallerConfig,
    error::Error,
    runtime::{ContainerRuntime, DockerCli},
    types::{ActionOutcome, EnvironmentReport, InstallAction, InstallRequest, ServiceStatus, ToolStatus},
};

/// Storage first, then collectors and agents, visualization last
pub const INSTALL_ORDER: &[&str] = &[
    "victoriametrics",
    "node-exporter",
    "categraf",
    "vmagent",
    "alertmanager",
    "snmp-exporter",
    "grafana",
];

/// Sorts components by [`INSTALL_ORDER`]; ids not listed keep their relative
/// order and go last.
pub fn install_order<I, S>(components: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = components
        .into_iter()
        .map(|c| c.as_ref().to_string())
        .collect();
    sorted.sort_by_key(|c| {
        INSTALL_ORDER
            .iter()
            .position(|known| *known == c.as_str())
            .unwrap_or(INSTALL_ORDER.len())
    });
    sorted
}

#[derive(Default)]
struct ActionLog {
    output: String,
    errors: Vec<String>,
}

impl ActionLog {
    fn line(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    fn fail(&mut self, message: String) {
        error!("{}", message);
        self.line(format!("✗ {}", message));
        self.errors.push(message);
    }

    fn finish(self) -> ActionOutcome {
        ActionOutcome {
            success: self.errors.is_empty(),
            output: Some(self.output),
            errors: self.errors,
            ..Default::default()
        }
    }
}

/// Runs install actions against a container runtime. Concurrent actions are
/// bounded but not de-duplicated.
#[derive(Clone)]
pub struct InstallService {
    runtime: Arc<dyn ContainerRuntime>,
    semaphore: Arc<Semaphore>,
    config: InstallerConfig,
}

impl InstallService {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: InstallerConfig) -> Self {
        Self {
            runtime,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_actions.max(1))),
            config,
        }
    }

    pub fn with_docker(config: InstallerConfig) -> Self {
        Self::new(Arc::new(DockerCli::new()), config)
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn get_available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn environment(&self) -> EnvironmentReport {
        let docker = tool_status(self.runtime.docker_version().await);
        let docker_compose = tool_status(self.runtime.compose_version().await);

        let running_containers = if docker.available {
            self.runtime
                .running_containers(&self.config.network)
                .await
                .unwrap_or_else(|e| {
                    warn!("Could not list running containers: {}", e);
                    Vec::new()
                })
        } else {
            Vec::new()
        };

        EnvironmentReport {
            ready: docker.available && docker_compose.available,
            docker,
            docker_compose,
            running_containers,
        }
    }

    pub async fn execute(&self, request: InstallRequest) -> Result<ActionOutcome, Error> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::System(format!("Failed to acquire action permit: {}", e)))?;

        if request.components.is_empty() {
            return Err(Error::EmptySelection);
        }

        debug!(
            "Starting {} for {:?}",
            request.action.as_str(),
            request.components
        );

        if self.runtime.docker_version().await.is_none() {
            return Err(Error::EnvironmentUnavailable(
                "Docker is not installed or not available".to_string(),
            ));
        }
        if request.action == InstallAction::Install && self.runtime.compose_version().await.is_none() {
            return Err(Error::EnvironmentUnavailable(
                "Docker Compose is not installed or not available".to_string(),
            ));
        }

        let result = match request.action {
            InstallAction::Install => {
                let configs = request.configs.as_ref().ok_or(Error::MissingConfigs)?;
                let work_dir = self.create_work_dir(configs).await?;
                let mut outcome = self.install(&request.components, &work_dir).await;
                outcome.work_dir = Some(work_dir);
                Ok(outcome)
            }
            InstallAction::Uninstall => Ok(self.uninstall(&request.components).await),
            InstallAction::Restart => Ok(self.restart(&request.components).await),
            InstallAction::Status => Ok(ActionOutcome {
                success: true,
                statuses: Some(self.statuses(&request.components).await),
                ..Default::default()
            }),
        };

        match &result {
            Ok(outcome) if outcome.success => info!("{} completed successfully", request.action.as_str()),
            Ok(outcome) => warn!(
                "{} finished with {} error(s)",
                request.action.as_str(),
                outcome.errors.len()
            ),
            Err(e) => error!("{} failed: {}", request.action.as_str(), e),
        }

        result
    }

    pub async fn statuses(&self, components: &[String]) -> Vec<ServiceStatus> {
        let mut statuses = Vec::with_capacity(components.len());
        for component in components {
            statuses.push(self.runtime.service_status(component).await);
        }
        statuses
    }

    /// Writes every config into a fresh directory under the work root
    async fn create_work_dir(&self, configs: &HashMap<String, String>) -> Result<PathBuf, Error> {
        for filename in configs.keys() {
            validate_relative(filename)?;
        }

        let work_dir = self.config.work_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&work_dir).await?;

        for (filename, content) in configs {
            let path = work_dir.join(filename);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, content).await?;

            if filename.ends_with(".sh") {
                make_executable(&path).await?;
            }
        }

        info!("Wrote {} config file(s) to {}", configs.len(), work_dir.display());
        Ok(work_dir)
    }

    async fn install(&self, components: &[String], work_dir: &Path) -> ActionOutcome {
        let mut log = ActionLog::default();
        let network = &self.config.network;

        match self.runtime.create_network(network).await {
            Ok(true) => log.line(format!("Created {} network", network)),
            Ok(false) => log.line(format!("{} network already exists", network)),
            Err(e) => {
                warn!("Network creation failed: {}", e);
                log.line(format!("Could not create {} network: {}", network, e));
            }
        }

        for component in install_order(components) {
            let compose_file = format!("docker-compose.{}.yml", component);
            if !fs::try_exists(work_dir.join(&compose_file)).await.unwrap_or(false) {
                log.fail(format!(
                    "Configuration file not found for {}: {}",
                    component, compose_file
                ));
                continue;
            }

            log.line(format!("Installing {}...", component));
            match self.runtime.compose_up(work_dir, &compose_file).await {
                Ok(out) => {
                    log.output.push_str(&out.stdout);
                    if !out.stderr.trim().is_empty() {
                        log.line(format!("Warning: {}", out.stderr.trim()));
                    }
                }
                Err(e) => {
                    log.fail(format!("Error installing {}: {}", component, e));
                    continue;
                }
            }

            self.settle(self.config.install_settle_ms).await;

            let status = self.runtime.service_status(&component).await;
            if status.is_running() {
                log.line(format!("✓ {} started successfully", component));
            } else {
                log.fail(format!(
                    "Failed to start {}: {}",
                    component,
                    state_name(&status)
                ));
            }
        }

        log.finish()
    }

    async fn uninstall(&self, components: &[String]) -> ActionOutcome {
        let mut log = ActionLog::default();

        for component in components {
            log.line(format!("Uninstalling {}...", component));
            match self.runtime.remove(component).await {
                Ok(out) => {
                    log.output.push_str(&out.stdout);
                    log.line(format!("✓ {} uninstalled successfully", component));
                }
                Err(e) if e.to_string().contains("No such container") => {
                    log.line(format!("✓ {} was not running", component));
                }
                Err(e) => log.fail(format!("Error uninstalling {}: {}", component, e)),
            }
        }

        log.finish()
    }

    async fn restart(&self, components: &[String]) -> ActionOutcome {
        let mut log = ActionLog::default();

        for component in components {
            log.line(format!("Restarting {}...", component));
            if let Err(e) = self.runtime.restart(component).await {
                log.fail(format!("Error restarting {}: {}", component, e));
                continue;
            }

            self.settle(self.config.restart_settle_ms).await;

            let status = self.runtime.service_status(component).await;
            if status.is_running() {
                log.line(format!("✓ {} restarted successfully", component));
            } else {
                log.fail(format!(
                    "Failed to restart {}: {}",
                    component,
                    state_name(&status)
                ));
            }
        }

        log.finish()
    }

    async fn settle(&self, millis: u64) {
        if millis > 0 {
            sleep(Duration::from_millis(millis)).await;
        }
    }
}

fn tool_status(version: Option<String>) -> ToolStatus {
    match version {
        Some(version) => ToolStatus {
            available: true,
            version,
        },
        None => ToolStatus::unavailable(),
    }
}

fn state_name(status: &ServiceStatus) -> String {
    serde_json::to_value(status.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Config names must stay inside the work directory
fn validate_relative(filename: &str) -> Result<(), Error> {
    let path = Path::new(filename);
    let escapes = filename.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::InvalidConfigPath(filename.to_string()));
    }
    Ok(())
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_order() {
        let sorted = install_order([
            "grafana",
            "custom-b",
            "vmagent",
            "victoriametrics",
            "custom-a",
            "node-exporter",
        ]);
        assert_eq!(
            sorted,
            vec![
                "victoriametrics",
                "node-exporter",
                "vmagent",
                "grafana",
                "custom-b",
                "custom-a"
            ]
        );
    }

    #[test]
    fn test_validate_relative() {
        assert!(validate_relative("docker-compose.grafana.yml").is_ok());
        assert!(validate_relative("grafana/provisioning/datasources/datasource.yml").is_ok());
        assert!(validate_relative("../etc/passwd").is_err());
        assert!(validate_relative("/etc/passwd").is_err());
        assert!(validate_relative("").is_err());
    }
}
