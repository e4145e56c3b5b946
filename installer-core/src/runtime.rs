use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{debug, warn};
use which::which;

use crate::{
    error::Error,
    types::{ContainerState, Health, ServiceStatus},
};

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Container engine operations used by the install service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// `None` when the engine is not installed or not answering
    async fn docker_version(&self) -> Option<String>;

    async fn compose_version(&self) -> Option<String>;

    /// Names of the running containers attached to `network`
    async fn running_containers(&self, network: &str) -> Result<Vec<String>, Error>;

    async fn service_status(&self, name: &str) -> ServiceStatus;

    /// Returns `false` if the network already existed
    async fn create_network(&self, network: &str) -> Result<bool, Error>;

    async fn compose_up(&self, work_dir: &Path, compose_file: &str) -> Result<CommandOutput, Error>;

    /// Stops and removes the container
    async fn remove(&self, name: &str) -> Result<CommandOutput, Error>;

    async fn restart(&self, name: &str) -> Result<CommandOutput, Error>;
}

/// [`ContainerRuntime`] backed by the `docker` and `docker-compose` CLIs
#[derive(Debug, Clone)]
pub struct DockerCli {
    docker: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            docker: which("docker").unwrap_or_else(|_| PathBuf::from("docker")),
        }
    }

    async fn run(&self, program: &Path, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput, Error> {
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!("Running {} {}", program.display(), args.join(" "));
        let output = command
            .output()
            .await
            .map_err(|e| Error::Command(format!("Failed to run {}: {}", program.display(), e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(Error::Command(format!(
                "{} {} failed: {}",
                program.display(),
                args.join(" "),
                result.stderr.trim()
            )));
        }

        Ok(result)
    }

    async fn docker(&self, args: &[&str]) -> Result<CommandOutput, Error> {
        self.run(&self.docker, args, None).await
    }

    /// Standalone `docker-compose` if installed, else the compose plugin
    async fn compose(&self, args: &[&str], cwd: &Path) -> Result<CommandOutput, Error> {
        match which("docker-compose") {
            Ok(path) => self.run(&path, args, Some(cwd)).await,
            Err(_) => {
                let mut plugin_args = vec!["compose"];
                plugin_args.extend_from_slice(args);
                self.run(&self.docker, &plugin_args, Some(cwd)).await
            }
        }
    }

    async fn health(&self, container_id: &str) -> Health {
        match self
            .docker(&["inspect", "--format", "{{.State.Health.Status}}", container_id])
            .await
        {
            Ok(out) => parse_health(&out.stdout),
            // containers without a healthcheck have no Health state
            Err(_) => Health::Unknown,
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn docker_version(&self) -> Option<String> {
        self.docker(&["--version"])
            .await
            .ok()
            .map(|out| out.stdout.trim().to_string())
    }

    async fn compose_version(&self) -> Option<String> {
        if let Ok(path) = which("docker-compose") {
            if let Ok(out) = self.run(&path, &["--version"], None).await {
                return Some(out.stdout.trim().to_string());
            }
        }
        self.docker(&["compose", "version"])
            .await
            .ok()
            .map(|out| out.stdout.trim().to_string())
    }

    async fn running_containers(&self, network: &str) -> Result<Vec<String>, Error> {
        let filter = format!("network={}", network);
        let out = self
            .docker(&["ps", "--filter", &filter, "--format", "{{.Names}}"])
            .await?;
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn service_status(&self, name: &str) -> ServiceStatus {
        let filter = format!("name=^{}$", name);

        let running = self
            .docker(&["ps", "--filter", &filter, "--format", "{{.ID}}|{{.Status}}|{{.Ports}}"])
            .await;
        match running {
            Ok(out) if !out.stdout.trim().is_empty() => {
                let mut status = parse_running(name, out.stdout.trim());
                if let Some(id) = status.container_id.clone() {
                    status.health = Some(self.health(&id).await);
                }
                return status;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to query status of {}: {}", name, e);
                return ServiceStatus::new(name, ContainerState::Error);
            }
        }

        match self
            .docker(&["ps", "-a", "--filter", &filter, "--format", "{{.ID}}|{{.Status}}"])
            .await
        {
            Ok(out) => parse_stopped(name, out.stdout.trim()),
            Err(e) => {
                warn!("Failed to query status of {}: {}", name, e);
                ServiceStatus::new(name, ContainerState::Error)
            }
        }
    }

    async fn create_network(&self, network: &str) -> Result<bool, Error> {
        match self.docker(&["network", "create", network]).await {
            Ok(_) => Ok(true),
            Err(Error::Command(msg)) if msg.contains("already exists") => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn compose_up(&self, work_dir: &Path, compose_file: &str) -> Result<CommandOutput, Error> {
        self.compose(&["-f", compose_file, "up", "-d"], work_dir).await
    }

    async fn remove(&self, name: &str) -> Result<CommandOutput, Error> {
        let stop = self.docker(&["stop", name]).await?;
        let rm = self.docker(&["rm", name]).await?;
        Ok(CommandOutput {
            stdout: format!("{}{}", stop.stdout, rm.stdout),
            stderr: format!("{}{}", stop.stderr, rm.stderr),
        })
    }

    async fn restart(&self, name: &str) -> Result<CommandOutput, Error> {
        self.docker(&["restart", name]).await
    }
}

/// Parses one `ID|Status|Ports` line of `docker ps`
pub(crate) fn parse_running(name: &str, line: &str) -> ServiceStatus {
    static UPTIME: OnceLock<Option<Regex>> = OnceLock::new();

    let mut parts = line.lines().next().unwrap_or_default().splitn(3, '|');
    let container_id = parts.next().unwrap_or_default().trim().to_string();
    let state = parts.next().unwrap_or_default();
    let ports = parts
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let uptime = UPTIME
        .get_or_init(|| Regex::new(r"Up ([^,(]+)").ok())
        .as_ref()
        .and_then(|re| re.captures(state))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    ServiceStatus {
        name: name.to_string(),
        status: ContainerState::Running,
        container_id: Some(container_id).filter(|id| !id.is_empty()),
        ports,
        uptime: Some(uptime),
        health: None,
    }
}

/// Parses the `ID|Status` line of `docker ps -a` for a non-running container
pub(crate) fn parse_stopped(name: &str, line: &str) -> ServiceStatus {
    if line.is_empty() {
        return ServiceStatus::new(name, ContainerState::Stopped);
    }

    let mut parts = line.lines().next().unwrap_or_default().splitn(2, '|');
    let container_id = parts.next().unwrap_or_default().trim().to_string();
    let state = parts.next().unwrap_or_default();

    let mut status = ServiceStatus::new(
        name,
        if state.contains("Exited") {
            ContainerState::Stopped
        } else {
            ContainerState::Error
        },
    );
    status.container_id = Some(container_id).filter(|id| !id.is_empty());
    status
}

pub(crate) fn parse_health(output: &str) -> Health {
    match output.trim().trim_matches('\'') {
        "healthy" => Health::Healthy,
        "unhealthy" => Health::Unhealthy,
        _ => Health::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_running_line() {
        let status = parse_running(
            "grafana",
            "3f2a1b|Up 2 hours (healthy)|0.0.0.0:3000->3000/tcp, :::3000->3000/tcp",
        );

        assert_eq!(status.status, ContainerState::Running);
        assert_eq!(status.container_id.as_deref(), Some("3f2a1b"));
        assert_eq!(status.uptime.as_deref(), Some("2 hours"));
        assert_eq!(
            status.ports,
            vec!["0.0.0.0:3000->3000/tcp", ":::3000->3000/tcp"]
        );
    }

    #[test]
    fn test_parse_stopped_line() {
        let exited = parse_stopped("vmagent", "9c1d|Exited (1) 5 minutes ago");
        assert_eq!(exited.status, ContainerState::Stopped);
        assert_eq!(exited.container_id.as_deref(), Some("9c1d"));

        let created = parse_stopped("vmagent", "9c1d|Created");
        assert_eq!(created.status, ContainerState::Error);

        let missing = parse_stopped("vmagent", "");
        assert_eq!(missing.status, ContainerState::Stopped);
        assert!(missing.container_id.is_none());
    }

    #[test]
    fn test_parse_health() {
        assert_eq!(parse_health("healthy\n"), Health::Healthy);
        assert_eq!(parse_health("'unhealthy'"), Health::Unhealthy);
        assert_eq!(parse_health("<no value>"), Health::Unknown);
    }

    #[tokio::test]
    async fn test_docker_cli_detection_does_not_fail() {
        // Only checks that probing never errors, docker may be absent
        let cli = DockerCli::new();
        let docker = cli.docker_version().await;
        if docker.is_none() {
            assert!(cli.running_containers("monitoring").await.is_err());
        }
    }
}
