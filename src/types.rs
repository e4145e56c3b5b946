use installer_core::{
    component_registry::DeploymentMode, ConfigFile, PlanSettings, PlanSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub release_date: String,
    pub changelog: String,
    pub is_latest: bool,
}

/// A catalog entry as served by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub versions: Vec<VersionInfo>,
    pub default_port: u16,
    pub required: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub latest_version: Option<String>,
    pub download_url: Option<String>,
    pub architecture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    pub version: String,
    pub release_date: Option<String>,
    pub download_url: Option<String>,
    pub is_latest: bool,
}

/// Published releases of one component; `source` is `github` or `catalog`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentReleasesInfo {
    pub id: String,
    pub name: String,
    pub source: String,
    pub versions: Vec<ReleaseInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub components: Vec<String>,
    pub mode: DeploymentMode,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionInfo {
    pub selected: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub components: Vec<String>,
    pub versions: BTreeMap<String, String>,
    pub deployment_mode: DeploymentMode,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub settings: PlanSettings,
}

impl PlanRequest {
    pub fn new(deployment_mode: DeploymentMode, components: Vec<String>) -> Self {
        Self {
            components,
            versions: BTreeMap::new(),
            deployment_mode,
            settings: PlanSettings::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub success: bool,
    pub configs: HashMap<String, String>,
    pub files: Vec<ConfigFile>,
    pub versions: BTreeMap<String, String>,
    pub summary: PlanSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct SimulationCreated {
    pub id: Uuid,
}
