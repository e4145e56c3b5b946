use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a component plays in the monitoring stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Collector,
    Storage,
    Visualization,
    Alerting,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collector" => Ok(Category::Collector),
            "storage" => Ok(Category::Storage),
            "visualization" => Ok(Category::Visualization),
            "alerting" => Ok(Category::Alerting),
            _ => Err(format!("Unsupported category: {}", s)),
        }
    }
}

/// Storage topology. `single` runs the standalone VictoriaMetrics binary,
/// `cluster` runs the vmstorage/vminsert/vmselect trio.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    #[serde(alias = "standalone")]
    Single,
    Cluster,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Single => "single",
            DeploymentMode::Cluster => "cluster",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "standalone" => Ok(DeploymentMode::Single),
            "cluster" => Ok(DeploymentMode::Cluster),
            _ => Err(format!("Unsupported deployment mode: {}", s)),
        }
    }
}

/// Target CPU architecture for release archives
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Amd64,
    Arm64,
    Armv7,
}

impl Architecture {
    /// Best-effort guess from a browser user-agent string. Anything
    /// inconclusive maps to amd64.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if ua.contains("arm64") || ua.contains("aarch64") {
            Architecture::Arm64
        } else if ua.contains("armv7") {
            Architecture::Armv7
        } else {
            Architecture::Amd64
        }
    }

    /// Platform suffix used in release archive names
    pub fn archive_suffix(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "linux-amd64",
            Architecture::Arm64 => "linux-arm64",
            Architecture::Armv7 => "linux-armv7",
        }
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" | "x86_64" => Ok(Architecture::Amd64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "armv7" => Ok(Architecture::Armv7),
            _ => Err(format!("Unsupported architecture: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: &'static str,
    pub release_date: &'static str,
    pub changelog: &'static str,
    pub is_latest: bool,
}

/// Rough sizing guidance shown next to each component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRequirements {
    pub cpu: &'static str,
    pub memory: &'static str,
    pub disk: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub versions: &'static [VersionRecord],
    pub default_port: u16,
    pub configurable: bool,
    /// Must be part of every selection regardless of deployment mode
    pub required: bool,
    pub dependencies: &'static [&'static str],
    pub features: &'static [&'static str],
    pub requirements: ResourceRequirements,
    pub documentation: &'static str,
    /// Naming key of the release archive, see [`crate::download_url`]
    pub artifact: &'static str,
    pub release_base_url: &'static str,
}

impl ComponentDescriptor {
    /// The version flagged latest, or the first listed one if none is flagged.
    pub fn latest_version(&self) -> Option<&'static VersionRecord> {
        self.versions
            .iter()
            .find(|v| v.is_latest)
            .or_else(|| self.versions.first())
    }

    pub fn version(&self, version: &str) -> Option<&'static VersionRecord> {
        self.versions.iter().find(|v| v.version == version)
    }
}
