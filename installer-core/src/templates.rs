//! Predefined component sets for common monitoring setups.

use component_registry::DeploymentMode;
use serde::{Serialize, Serializer};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Basic,
    Advanced,
    Enterprise,
    Custom,
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(TemplateCategory::Basic),
            "advanced" => Ok(TemplateCategory::Advanced),
            "enterprise" => Ok(TemplateCategory::Enterprise),
            "custom" => Ok(TemplateCategory::Custom),
            _ => Err(format!("Unsupported template category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: TemplateCategory,
    pub components: &'static [&'static str],
    pub mode: DeploymentMode,
    pub tags: &'static [&'static str],
    /// Suggested settings, e.g. retention and replica counts
    #[serde(serialize_with = "serialize_settings")]
    pub settings: &'static [(&'static str, &'static str)],
}

fn serialize_settings<S>(settings: &&[(&str, &str)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(settings.iter().copied())
}

static TEMPLATES: &[InstallTemplate] = &[
    InstallTemplate {
        id: "simple-monitoring",
        name: "Simple Monitoring",
        description: "Single-node VictoriaMetrics for small projects and quick deployments",
        category: TemplateCategory::Basic,
        components: &["node-exporter", "vmagent", "victoriametrics", "grafana"],
        mode: DeploymentMode::Single,
        tags: &["basic", "single-node", "quick-start"],
        settings: &[("retention", "30d")],
    },
    InstallTemplate {
        id: "basic-monitoring",
        name: "Basic Monitoring",
        description: "Core system monitoring on a VictoriaMetrics cluster for mid-sized projects",
        category: TemplateCategory::Basic,
        components: &["node-exporter", "vmstorage", "vminsert", "vmselect", "grafana"],
        mode: DeploymentMode::Cluster,
        tags: &["basic", "cluster", "quick-start"],
        settings: &[
            ("retention", "30d"),
            ("vmstorageReplicas", "1"),
            ("vminsertReplicas", "1"),
            ("vmselectReplicas", "1"),
        ],
    },
    InstallTemplate {
        id: "enterprise-monitoring",
        name: "Enterprise Monitoring",
        description: "Full monitoring stack with a highly available cluster and alerting",
        category: TemplateCategory::Enterprise,
        components: &[
            "node-exporter",
            "categraf",
            "vmagent",
            "vmstorage",
            "vminsert",
            "vmselect",
            "vmalert",
            "grafana",
            "alertmanager",
        ],
        mode: DeploymentMode::Cluster,
        tags: &["enterprise", "high-availability", "cluster", "alerting"],
        settings: &[
            ("retention", "1y"),
            ("ha", "true"),
            ("vmstorageReplicas", "3"),
            ("vminsertReplicas", "2"),
            ("vmselectReplicas", "2"),
        ],
    },
    InstallTemplate {
        id: "network-monitoring-standalone",
        name: "Network Devices (single node)",
        description: "SNMP device monitoring for small networks",
        category: TemplateCategory::Advanced,
        components: &[
            "snmp-exporter",
            "victoriametrics",
            "vmalert",
            "grafana",
            "alertmanager",
        ],
        mode: DeploymentMode::Single,
        tags: &["network", "snmp", "single-node"],
        settings: &[
            ("snmpVersion", "v2c"),
            ("community", "public"),
            ("retention", "90d"),
        ],
    },
    InstallTemplate {
        id: "network-monitoring",
        name: "Network Devices (cluster)",
        description: "SNMP device monitoring on a VictoriaMetrics cluster",
        category: TemplateCategory::Advanced,
        components: &[
            "snmp-exporter",
            "vmstorage",
            "vminsert",
            "vmselect",
            "vmalert",
            "grafana",
            "alertmanager",
        ],
        mode: DeploymentMode::Cluster,
        tags: &["network", "snmp", "cluster"],
        settings: &[
            ("snmpVersion", "v2c"),
            ("community", "public"),
            ("vmstorageReplicas", "2"),
            ("vminsertReplicas", "1"),
            ("vmselectReplicas", "1"),
        ],
    },
    InstallTemplate {
        id: "vm-cluster-ha",
        name: "VictoriaMetrics HA Cluster",
        description: "Highly available VictoriaMetrics cluster with room to scale out",
        category: TemplateCategory::Enterprise,
        components: &[
            "vmagent",
            "vmstorage",
            "vminsert",
            "vmselect",
            "vmalert",
            "grafana",
        ],
        mode: DeploymentMode::Cluster,
        tags: &["cluster", "high-availability", "autoscale", "enterprise"],
        settings: &[
            ("retention", "2y"),
            ("ha", "true"),
            ("vmstorageReplicas", "5"),
            ("vminsertReplicas", "3"),
            ("vmselectReplicas", "3"),
            ("autoScale", "true"),
        ],
    },
];

pub fn builtin() -> &'static [InstallTemplate] {
    TEMPLATES
}

pub fn find(id: &str) -> Option<&'static InstallTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Templates whose name or description contains `search` (case-insensitive)
/// and whose category matches, if one is given.
pub fn filter(search: Option<&str>, category: Option<TemplateCategory>) -> Vec<&'static InstallTemplate> {
    let needle = search.map(str::to_lowercase).unwrap_or_default();

    TEMPLATES
        .iter()
        .filter(|t| {
            needle.is_empty()
                || t.name.to_lowercase().contains(&needle)
                || t.description.to_lowercase().contains(&needle)
        })
        .filter(|t| category.map_or(true, |c| t.category == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use component_registry::Catalog;

    #[test]
    fn test_template_components_are_known() {
        let catalog = Catalog::builtin();
        for template in builtin() {
            for id in template.components {
                assert!(catalog.contains(id), "{} references {}", template.id, id);
            }
        }
    }

    #[test]
    fn test_filter_by_search_and_category() {
        let network = filter(Some("SNMP"), None);
        assert_eq!(network.len(), 2);

        let enterprise = filter(None, Some(TemplateCategory::Enterprise));
        let ids: Vec<_> = enterprise.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["enterprise-monitoring", "vm-cluster-ha"]);

        assert_eq!(filter(Some("cluster"), Some(TemplateCategory::Basic)).len(), 1);
        assert!(filter(Some("nothing like this"), None).is_empty());
        assert_eq!(filter(Some(""), None).len(), builtin().len());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("vm-cluster-ha").map(|t| t.mode), Some(DeploymentMode::Cluster));
        assert!(find("missing").is_none());
    }
}
