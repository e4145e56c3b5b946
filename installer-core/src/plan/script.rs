use component_registry::Catalog;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::{
    service::install_order,
    types::{ConfigFile, ConfigKind},
};

/// `install.sh`: creates the network and brings every selected service up
pub(crate) fn install_script(
    catalog: &Catalog,
    network: &str,
    versions: &BTreeMap<String, String>,
) -> ConfigFile {
    let mut out = String::new();

    let _ = writeln!(out, "#!/bin/bash");
    let _ = writeln!(out, "set -e\n");
    let _ = writeln!(out, "if command -v docker-compose >/dev/null 2>&1; then");
    let _ = writeln!(out, "  COMPOSE=\"docker-compose\"");
    let _ = writeln!(out, "else");
    let _ = writeln!(out, "  COMPOSE=\"docker compose\"");
    let _ = writeln!(out, "fi\n");
    let _ = writeln!(out, "echo \"Installing monitoring components...\"");
    let _ = writeln!(out, "docker network create {} 2>/dev/null || true", network);
    let _ = writeln!(out, "mkdir -p ./data ./logs");

    for id in install_order(versions.keys()) {
        let name = catalog.get(&id).map(|c| c.name).unwrap_or(id.as_str());
        let version = versions.get(&id).map(String::as_str).unwrap_or("latest");

        let _ = writeln!(out, "\necho \"Starting {} {}...\"", name, version);
        if id == "grafana" {
            let _ = writeln!(out, "mkdir -p ./grafana/provisioning/datasources ./grafana/provisioning/dashboards");
        }
        let _ = writeln!(out, "$COMPOSE -f docker-compose.{}.yml up -d", id);
    }

    let _ = writeln!(out, "\necho \"Waiting for services to start...\"");
    let _ = writeln!(out, "sleep 10");
    let _ = writeln!(
        out,
        "docker ps --filter \"network={}\" --format \"table {{{{.Names}}}}\\t{{{{.Status}}}}\\t{{{{.Ports}}}}\"",
        network
    );
    let _ = writeln!(out, "\necho \"Installation complete.\"");

    for id in versions.keys() {
        if let Some(component) = catalog.get(id) {
            let _ = writeln!(
                out,
                "echo \"  {}: http://localhost:{}\"",
                component.name, component.default_port
            );
        }
    }

    ConfigFile::new("install.sh", out, "One-step install script", ConfigKind::Sh)
}
