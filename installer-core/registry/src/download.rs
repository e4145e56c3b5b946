use crate::types::{Architecture, ComponentDescriptor};

/// Builds the release-archive URL for `artifact` following each upstream
/// project's naming convention. Unknown artifacts echo `base_url` unchanged.
/// No reachability check is performed.
pub fn download_url(artifact: &str, base_url: &str, version: &str, arch: Architecture) -> String {
    let suffix = arch.archive_suffix();

    match artifact {
        "node_exporter" => format!(
            "https://github.com/prometheus/node_exporter/releases/download/v{version}/node_exporter-{version}.{suffix}.tar.gz"
        ),
        "categraf" => format!(
            "https://github.com/flashcatcloud/categraf/releases/download/v{version}/categraf-v{version}-{suffix}.tar.gz"
        ),
        "vmutils" => format!(
            "https://github.com/VictoriaMetrics/VictoriaMetrics/releases/download/v{version}/vmutils-{suffix}-v{version}.tar.gz"
        ),
        "victoria-metrics" => format!(
            "https://github.com/VictoriaMetrics/VictoriaMetrics/releases/download/v{version}/victoria-metrics-{suffix}-v{version}.tar.gz"
        ),
        "grafana" => format!("{base_url}grafana-{version}.{suffix}.tar.gz"),
        "snmp_exporter" => format!(
            "https://github.com/prometheus/snmp_exporter/releases/download/v{version}/snmp_exporter-{version}.{suffix}.tar.gz"
        ),
        "alertmanager" => format!(
            "https://github.com/prometheus/alertmanager/releases/download/v{version}/alertmanager-{version}.{suffix}.tar.gz"
        ),
        _ => base_url.to_string(),
    }
}

/// GitHub `owner/repo` publishing releases of `artifact`
pub fn release_repository(artifact: &str) -> Option<&'static str> {
    match artifact {
        "node_exporter" => Some("prometheus/node_exporter"),
        "categraf" => Some("flashcatcloud/categraf"),
        "vmutils" | "victoria-metrics" => Some("VictoriaMetrics/VictoriaMetrics"),
        "grafana" => Some("grafana/grafana"),
        "snmp_exporter" => Some("prometheus/snmp_exporter"),
        "alertmanager" => Some("prometheus/alertmanager"),
        _ => None,
    }
}

impl ComponentDescriptor {
    pub fn download_url(&self, version: &str, arch: Architecture) -> String {
        download_url(self.artifact, self.release_base_url, version, arch)
    }

    pub fn release_repository(&self) -> Option<&'static str> {
        release_repository(self.artifact)
    }
}
