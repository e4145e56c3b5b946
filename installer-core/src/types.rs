use component_registry::DeploymentMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Free-form per-component settings, keyed by component id
pub type PlanSettings = HashMap<String, serde_json::Map<String, serde_json::Value>>;

/// Format of a generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    Yaml,
    Toml,
    Sh,
    Ini,
}

/// One generated file of an install plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Path relative to the work directory
    pub filename: String,
    pub content: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ConfigKind,
}

impl ConfigFile {
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<String>,
        description: impl Into<String>,
        kind: ConfigKind,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            description: description.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total_files: usize,
    pub components: usize,
    pub estimated_install_minutes: u32,
}

/// Generated deployment files for a selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPlan {
    pub mode: DeploymentMode,
    /// Resolved version per selected component
    pub versions: BTreeMap<String, String>,
    pub files: BTreeMap<String, ConfigFile>,
    pub summary: PlanSummary,
}

impl InstallPlan {
    /// Filename to content, the shape the install action consumes
    pub fn configs(&self) -> HashMap<String, String> {
        self.files
            .iter()
            .map(|(name, file)| (name.clone(), file.content.clone()))
            .collect()
    }

    pub fn file(&self, filename: &str) -> Option<&ConfigFile> {
        self.files.get(filename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// A stage of a (simulated) install run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    /// Milliseconds since run start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallStep {
    pub fn pending(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            status: StepStatus::Pending,
            started_at_ms: None,
            finished_at_ms: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Stopped,
    Error,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: String,
    pub status: ContainerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

impl ServiceStatus {
    pub fn new(name: impl Into<String>, status: ContainerState) -> Self {
        Self {
            name: name.into(),
            status,
            container_id: None,
            ports: Vec::new(),
            uptime: None,
            health: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ContainerState::Running
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub available: bool,
    pub version: String,
}

impl ToolStatus {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            version: "Not available".to_string(),
        }
    }
}

/// Host readiness for a real install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
    pub docker: ToolStatus,
    pub docker_compose: ToolStatus,
    pub running_containers: Vec<String>,
    pub ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallAction {
    Install,
    Uninstall,
    Restart,
    Status,
}

impl InstallAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallAction::Install => "install",
            InstallAction::Uninstall => "uninstall",
            InstallAction::Restart => "restart",
            InstallAction::Status => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub action: InstallAction,
    pub components: Vec<String>,
    /// Filename to content; required for `install`
    #[serde(default)]
    pub configs: Option<HashMap<String, String>>,
}

/// Result of an install/uninstall/restart/status action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<ServiceStatus>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_request_wire_format() {
        let request: InstallRequest = serde_json::from_str(
            r#"{ "action": "status", "components": ["grafana"] }"#,
        )
        .unwrap();
        assert_eq!(request.action, InstallAction::Status);
        assert!(request.configs.is_none());

        assert!(serde_json::from_str::<InstallRequest>(
            r#"{ "action": "reboot", "components": [] }"#
        )
        .is_err());
    }

    #[test]
    fn test_outcome_omits_empty_fields() {
        let outcome = ActionOutcome {
            success: true,
            statuses: Some(vec![ServiceStatus::new("grafana", ContainerState::Stopped)]),
            ..Default::default()
        };
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "statuses": [{ "name": "grafana", "status": "stopped" }]
            })
        );
    }

    #[test]
    fn test_config_file_kind_serializes_as_type() {
        let file = ConfigFile::new("install.sh", "#!/bin/bash", "script", ConfigKind::Sh);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "sh");
    }
}
