//! Selection state for one install, manipulated through the resolver.

use component_registry::{Catalog, DeploymentMode, Resolution, Resolver};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::{
    error::Error,
    plan::PlanGenerator,
    templates::InstallTemplate,
    types::{InstallPlan, PlanSettings},
};

/// A way in which a selection breaks the constraint table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Violation {
    MissingRequired { component: String },
    MissingAnchor { component: String, mode: DeploymentMode },
    Conflict { component: String, other: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSession {
    pub selected: BTreeSet<String>,
    pub versions: BTreeMap<String, String>,
    pub mode: DeploymentMode,
}

impl InstallSession {
    /// Required components and single-mode storage at their latest versions
    pub fn new(resolver: &Resolver) -> Result<Self, Error> {
        let mut session = Self::default();
        session.set_mode(resolver, DeploymentMode::Single)?;
        Ok(session)
    }

    pub fn set_mode(&mut self, resolver: &Resolver, mode: DeploymentMode) -> Result<Resolution, Error> {
        let resolution = resolver.resolve(&self.selected, mode)?;
        debug!(
            "Mode {} added {:?}, removed {:?}",
            mode, resolution.added, resolution.removed
        );
        self.mode = mode;
        self.apply(resolver.catalog(), &resolution);
        Ok(resolution)
    }

    /// Selects `id` if absent, deselects it otherwise. Locked components are
    /// refused with an error.
    pub fn toggle(&mut self, resolver: &Resolver, id: &str) -> Result<Resolution, Error> {
        let resolution = if self.selected.contains(id) {
            resolver.deselect(&self.selected, id, self.mode)?
        } else {
            resolver.select(&self.selected, id, self.mode)?
        };
        self.apply(resolver.catalog(), &resolution);
        Ok(resolution)
    }

    pub fn set_version(&mut self, catalog: &Catalog, id: &str, version: &str) -> Result<(), Error> {
        let record = catalog.resolve_version(id, Some(version))?;
        self.versions.insert(id.to_string(), record.version.to_string());
        Ok(())
    }

    /// Replaces the selection with exactly the template's components. The
    /// resolver is not consulted; see [`InstallSession::violations`].
    pub fn apply_template(&mut self, catalog: &Catalog, template: &InstallTemplate) {
        self.selected = template.components.iter().map(|c| c.to_string()).collect();
        self.mode = template.mode;
        self.versions = self
            .selected
            .iter()
            .filter_map(|id| {
                let latest = catalog.get(id)?.latest_version()?;
                Some((id.clone(), latest.version.to_string()))
            })
            .collect();
    }

    pub fn can_create_plan(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn violations(&self, resolver: &Resolver) -> Vec<Violation> {
        let mut violations: Vec<Violation> = resolver
            .catalog()
            .required()
            .filter(|c| !self.selected.contains(c.id))
            .map(|c| Violation::MissingRequired {
                component: c.id.to_string(),
            })
            .collect();

        violations.extend(
            resolver
                .anchors(self.mode)
                .filter(|id| !self.selected.contains(*id))
                .map(|id| Violation::MissingAnchor {
                    component: id.to_string(),
                    mode: self.mode,
                }),
        );

        for id in &self.selected {
            if let Some(rule) = resolver.rule(id) {
                for other in rule.excludes.iter().filter(|x| self.selected.contains(**x)) {
                    violations.push(Violation::Conflict {
                        component: id.clone(),
                        other: other.to_string(),
                    });
                }
            }
        }

        violations
    }

    pub fn plan(&self, generator: &PlanGenerator, settings: &PlanSettings) -> Result<InstallPlan, Error> {
        if !self.can_create_plan() {
            return Err(Error::EmptySelection);
        }
        generator.generate(&self.selected, &self.versions, self.mode, settings)
    }

    fn apply(&mut self, catalog: &Catalog, resolution: &Resolution) {
        for id in &resolution.removed {
            self.versions.remove(id);
        }
        for id in &resolution.added {
            if self.versions.contains_key(id) {
                continue;
            }
            if let Some(latest) = catalog.get(id).and_then(|c| c.latest_version()) {
                self.versions.insert(id.clone(), latest.version.to_string());
            }
        }
        self.selected = resolution.selected.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;
    use component_registry::Error as RegistryError;

    #[test]
    fn test_new_session_is_consistent() {
        let resolver = Resolver::default();
        let session = InstallSession::new(&resolver).unwrap();

        assert!(session.violations(&resolver).is_empty());
        assert!(session.selected.contains("victoriametrics"));
        assert_eq!(session.versions.get("victoriametrics").map(String::as_str), Some("1.96.0"));
        assert_eq!(session.versions.len(), session.selected.len());
    }

    #[test]
    fn test_mode_switch_keeps_exactly_one_storage_set() {
        let resolver = Resolver::default();
        let mut session = InstallSession::new(&resolver).unwrap();

        for mode in [
            DeploymentMode::Cluster,
            DeploymentMode::Cluster,
            DeploymentMode::Single,
            DeploymentMode::Cluster,
            DeploymentMode::Single,
        ] {
            session.set_mode(&resolver, mode).unwrap();
            let single = session.selected.contains("victoriametrics");
            let trio = ["vmstorage", "vminsert", "vmselect"]
                .iter()
                .all(|id| session.selected.contains(*id));
            let any_trio = ["vmstorage", "vminsert", "vmselect"]
                .iter()
                .any(|id| session.selected.contains(*id));
            assert!(single ^ trio);
            assert_eq!(trio, any_trio);
            for required in resolver.catalog().required() {
                assert!(session.selected.contains(required.id));
            }
        }
    }

    #[test]
    fn test_toggle_optional_and_locked() {
        let resolver = Resolver::default();
        let mut session = InstallSession::new(&resolver).unwrap();

        session.toggle(&resolver, "alertmanager").unwrap();
        assert!(session.selected.contains("alertmanager"));
        assert_eq!(session.versions.get("alertmanager").map(String::as_str), Some("0.26.0"));

        session.toggle(&resolver, "alertmanager").unwrap();
        assert!(!session.selected.contains("alertmanager"));
        assert!(!session.versions.contains_key("alertmanager"));

        let err = session.toggle(&resolver, "node-exporter").unwrap_err();
        assert!(matches!(err, Error::Registry(RegistryError::Required(_))));
        assert!(session.selected.contains("node-exporter"));
    }

    #[test]
    fn test_manual_removal_survives_mode_switches() {
        let resolver = Resolver::default();
        let mut session = InstallSession::new(&resolver).unwrap();
        session.toggle(&resolver, "categraf").unwrap();
        session.toggle(&resolver, "categraf").unwrap();

        session.set_mode(&resolver, DeploymentMode::Cluster).unwrap();
        session.set_mode(&resolver, DeploymentMode::Single).unwrap();
        assert!(!session.selected.contains("categraf"));
    }

    #[test]
    fn test_set_version() {
        let resolver = Resolver::default();
        let mut session = InstallSession::new(&resolver).unwrap();

        session.set_version(resolver.catalog(), "grafana", "10.2.1").unwrap();
        assert_eq!(session.versions["grafana"], "10.2.1");

        assert!(matches!(
            session.set_version(resolver.catalog(), "grafana", "1.0.0"),
            Err(Error::Registry(RegistryError::UnknownVersion { .. }))
        ));
    }

    #[test]
    fn test_template_overwrites_selection_exactly() {
        let resolver = Resolver::default();
        let mut session = InstallSession::new(&resolver).unwrap();
        session.toggle(&resolver, "snmp-exporter").unwrap();

        let template = templates::find("basic-monitoring").unwrap();
        session.apply_template(resolver.catalog(), template);

        let expected: BTreeSet<String> = template.components.iter().map(|c| c.to_string()).collect();
        assert_eq!(session.selected, expected);
        assert_eq!(session.mode, DeploymentMode::Cluster);

        // basic-monitoring leaves out vmagent
        assert_eq!(
            session.violations(&resolver),
            vec![Violation::MissingRequired {
                component: "vmagent".into()
            }]
        );
    }

    #[test]
    fn test_empty_selection_cannot_plan() {
        let session = InstallSession::default();
        assert!(!session.can_create_plan());
        assert!(matches!(
            session.plan(&PlanGenerator::default(), &PlanSettings::new()),
            Err(Error::EmptySelection)
        ));
    }
}
