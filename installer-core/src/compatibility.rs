use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Advisory only: `compatible` is never false, problems surface as warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub compatible: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

const MIN_GRAFANA_MAJOR: u32 = 9;

fn major_version(version: &str) -> Option<u32> {
    static MAJOR: OnceLock<Option<Regex>> = OnceLock::new();
    let re = MAJOR.get_or_init(|| Regex::new(r"^v?(\d+)").ok()).as_ref()?;
    re.captures(version)?.get(1)?.as_str().parse().ok()
}

pub fn check_compatibility(
    components: &[String],
    versions: &HashMap<String, String>,
) -> CompatibilityReport {
    let has = |id: &str| components.iter().any(|c| c == id);
    let version_of = |id: &str| versions.get(id).map(String::as_str).unwrap_or("unspecified");

    let mut report = CompatibilityReport {
        compatible: true,
        ..Default::default()
    };

    if has("victoriametrics") && has("vmagent") {
        let vm = version_of("victoriametrics");
        let agent = version_of("vmagent");
        if vm != agent {
            report.warnings.push(format!(
                "VictoriaMetrics ({}) and vmagent ({}) versions differ; use the same release for both",
                vm, agent
            ));
        }
    }

    if has("grafana") {
        let grafana = version_of("grafana");
        if let Some(major) = major_version(grafana) {
            if major < MIN_GRAFANA_MAJOR {
                report.warnings.push(format!(
                    "Grafana {} is outdated; upgrade to {}.0+ for better performance and features",
                    grafana, MIN_GRAFANA_MAJOR
                ));
            }
        }
    }

    if has("node-exporter") && !has("categraf") {
        report
            .recommendations
            .push("Install Categraf alongside node-exporter for richer host metrics".to_string());
    }

    if has("victoriametrics") && !has("alertmanager") {
        report
            .recommendations
            .push("Add Alertmanager to route alerts from VictoriaMetrics".to_string());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn versions(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_vm_and_vmagent_mismatch_warns() {
        let report = check_compatibility(
            &ids(&["victoriametrics", "vmagent", "alertmanager"]),
            &versions(&[("victoriametrics", "1.96.0"), ("vmagent", "1.95.1")]),
        );
        assert!(report.compatible);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("1.95.1"));
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_old_grafana_warns() {
        let report = check_compatibility(&ids(&["grafana"]), &versions(&[("grafana", "8.5.27")]));
        assert_eq!(report.warnings.len(), 1);

        let report = check_compatibility(&ids(&["grafana"]), &versions(&[("grafana", "10.2.3")]));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unparseable_grafana_version_is_ignored() {
        let report = check_compatibility(&ids(&["grafana"]), &versions(&[("grafana", "nightly")]));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_recommendations() {
        let report = check_compatibility(
            &ids(&["node-exporter", "victoriametrics"]),
            &HashMap::new(),
        );
        assert!(report.compatible);
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("10.2.3"), Some(10));
        assert_eq!(major_version("v9.0.0"), Some(9));
        assert_eq!(major_version("latest"), None);
    }
}
