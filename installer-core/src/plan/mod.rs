//! Install-plan generation: compose descriptors, companion configs and an
//! install script for a component selection.
//!
//! Everything here is string templating. Nothing is executed and the output
//! carries no dependency ordering; the install action decides the order.

mod companions;
mod compose;
mod script;

use component_registry::{Catalog, DeploymentMode};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::{
    error::Error,
    types::{InstallPlan, PlanSettings, PlanSummary},
};

pub use compose::image_for;

const MINUTES_PER_COMPONENT: u32 = 2;

/// Setting values land in single-quoted YAML and line-based files
const FORBIDDEN_SETTING_CHARS: &[char] = &['\'', '\n', '\r'];

/// Endpoints the collectors write to and Grafana reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StorageEndpoints {
    pub write_url: String,
    pub read_url: String,
}

impl StorageEndpoints {
    pub fn for_mode(mode: DeploymentMode) -> Self {
        match mode {
            DeploymentMode::Single => Self {
                write_url: "http://victoriametrics:8428/api/v1/write".to_string(),
                read_url: "http://victoriametrics:8428".to_string(),
            },
            DeploymentMode::Cluster => Self {
                write_url: "http://vminsert:8480/insert/0/prometheus/api/v1/write".to_string(),
                read_url: "http://vmselect:8481/select/0/prometheus".to_string(),
            },
        }
    }
}

/// Read access to one component's optional settings
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Settings<'a> {
    values: Option<&'a serde_json::Map<String, Value>>,
}

impl<'a> Settings<'a> {
    fn for_component(settings: &'a PlanSettings, id: &str) -> Self {
        Self {
            values: settings.get(id),
        }
    }

    /// String form of the setting, or `default` when absent, null or empty
    pub fn text(&self, key: &str, default: &str) -> String {
        match self.values.and_then(|v| v.get(key)) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    fn validate(&self, id: &str) -> Result<(), Error> {
        for (key, value) in self.values.into_iter().flatten() {
            if let Value::String(text) = value {
                if text.contains(FORBIDDEN_SETTING_CHARS) {
                    return Err(Error::InvalidSetting(format!(
                        "{}.{} must not contain quotes or line breaks",
                        id, key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn number(&self, key: &str, default: u64) -> u64 {
        match self.values.and_then(|v| v.get(key)) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.parse().unwrap_or(default),
            _ => default,
        }
    }
}

/// Everything a component template needs
pub(crate) struct ComponentContext<'a> {
    pub id: &'a str,
    pub version: &'a str,
    pub port: Option<u16>,
    pub network: &'a str,
    pub mode: DeploymentMode,
    pub endpoints: &'a StorageEndpoints,
    pub settings: Settings<'a>,
}

#[derive(Debug, Clone)]
pub struct PlanGenerator {
    catalog: Catalog,
    network: String,
}

impl Default for PlanGenerator {
    fn default() -> Self {
        Self::new(Catalog::builtin(), "monitoring")
    }
}

impl PlanGenerator {
    pub fn new(catalog: Catalog, network: impl Into<String>) -> Self {
        Self {
            catalog,
            network: network.into(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Version used for `id`: the requested one, else the catalog's latest,
    /// else `latest`.
    pub fn version_for(&self, id: &str, versions: &BTreeMap<String, String>) -> String {
        versions
            .get(id)
            .filter(|v| !v.is_empty())
            .cloned()
            .or_else(|| {
                self.catalog
                    .get(id)
                    .and_then(|c| c.latest_version())
                    .map(|v| v.version.to_string())
            })
            .unwrap_or_else(|| "latest".to_string())
    }

    pub fn generate(
        &self,
        selected: &BTreeSet<String>,
        versions: &BTreeMap<String, String>,
        mode: DeploymentMode,
        settings: &PlanSettings,
    ) -> Result<InstallPlan, Error> {
        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }
        for id in selected {
            Settings::for_component(settings, id).validate(id)?;
        }

        let endpoints = StorageEndpoints::for_mode(mode);
        let mut files = BTreeMap::new();
        let mut resolved = BTreeMap::new();

        for id in selected {
            let version = self.version_for(id, versions);
            let ctx = ComponentContext {
                id,
                version: &version,
                port: self.catalog.get(id).map(|c| c.default_port),
                network: &self.network,
                mode,
                endpoints: &endpoints,
                settings: Settings::for_component(settings, id),
            };

            let mut generated = vec![compose::compose_file(&ctx)];
            generated.extend(companions::companion_files(&ctx)?);
            debug!("Generated {} file(s) for {}", generated.len(), id);

            for file in generated {
                files.insert(file.filename.clone(), file);
            }
            resolved.insert(id.clone(), version);
        }

        let install = script::install_script(&self.catalog, &self.network, &resolved);
        files.insert(install.filename.clone(), install);

        let summary = PlanSummary {
            total_files: files.len(),
            components: selected.len(),
            estimated_install_minutes: selected.len() as u32 * MINUTES_PER_COMPONENT,
        };
        info!(
            "Generated install plan for {} component(s) in {} mode: {} files",
            summary.components, mode, summary.total_files
        );

        Ok(InstallPlan {
            mode,
            versions: resolved,
            files,
            summary,
        })
    }
}
