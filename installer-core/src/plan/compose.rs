use std::fmt::Write;

use super::ComponentContext;
use crate::types::{ConfigFile, ConfigKind};

/// Container image for `id` at `version`. Ids without a known image fall
/// back to `<id>:<version>`.
pub fn image_for(id: &str, version: &str) -> String {
    let tag = if version == "latest" {
        "latest".to_string()
    } else {
        format!("v{}", version.trim_start_matches('v'))
    };

    match id {
        "node-exporter" => format!("prom/node-exporter:{}", tag),
        "categraf" => format!("flashcatcloud/categraf:{}", tag),
        "vmagent" => format!("victoriametrics/vmagent:{}", tag),
        "victoriametrics" => format!("victoriametrics/victoria-metrics:{}", tag),
        "vmstorage" | "vminsert" | "vmselect" => {
            if version == "latest" {
                format!("victoriametrics/{}:latest-cluster", id)
            } else {
                format!("victoriametrics/{}:{}-cluster", id, tag)
            }
        }
        "vmalert" => format!("victoriametrics/vmalert:{}", tag),
        // Grafana tags carry no `v` prefix
        "grafana" => format!("grafana/grafana:{}", version),
        "snmp-exporter" => format!("prom/snmp-exporter:{}", tag),
        "alertmanager" => format!("prom/alertmanager:{}", tag),
        _ => format!("{}:{}", id, version),
    }
}

/// Service-specific parts of the compose skeleton
#[derive(Debug, Default)]
struct ServiceSpec {
    publish_port: bool,
    hostname: Option<String>,
    command: Vec<String>,
    environment: Vec<String>,
    volumes: Vec<String>,
    named_volumes: Vec<String>,
}

fn service_spec(ctx: &ComponentContext<'_>) -> ServiceSpec {
    let s = &ctx.settings;

    match ctx.id {
        "node-exporter" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--path.procfs=/host/proc".into(),
                "--path.rootfs=/rootfs".into(),
                "--path.sysfs=/host/sys".into(),
                "--collector.filesystem.mount-points-exclude=^/(sys|proc|dev|host|etc)($$|/)".into(),
            ],
            volumes: vec![
                "/proc:/host/proc:ro".into(),
                "/sys:/host/sys:ro".into(),
                "/:/rootfs:ro".into(),
            ],
            ..Default::default()
        },
        "categraf" => ServiceSpec {
            // shares 9100 with node-exporter, so it stays unpublished
            publish_port: false,
            hostname: Some(s.text("hostname", "categraf-host")),
            environment: vec!["HOST_PROC=/host/proc".into(), "HOST_SYS=/host/sys".into()],
            volumes: vec![
                "./categraf.toml:/etc/categraf/conf/config.toml".into(),
                "/proc:/host/proc:ro".into(),
                "/sys:/host/sys:ro".into(),
                "/var/run/docker.sock:/var/run/docker.sock:ro".into(),
            ],
            ..Default::default()
        },
        "victoriametrics" => {
            let data = s.text("storageDataPath", "/victoria-metrics-data");
            ServiceSpec {
                publish_port: true,
                command: vec![
                    format!("--storageDataPath={}", data),
                    format!("--retentionPeriod={}", s.text("retentionPeriod", "1y")),
                    "--httpListenAddr=:8428".into(),
                    "--maxConcurrentInserts=8".into(),
                    "--maxInsertRequestSize=32MB".into(),
                ],
                volumes: vec![format!("vm-data:{}", data)],
                named_volumes: vec!["vm-data".into()],
                ..Default::default()
            }
        }
        "vmstorage" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--storageDataPath=/storage".into(),
                format!("--retentionPeriod={}", s.text("retentionPeriod", "1y")),
                "--httpListenAddr=:8482".into(),
                "--vminsertAddr=:8400".into(),
                "--vmselectAddr=:8401".into(),
            ],
            volumes: vec!["vmstorage-data:/storage".into()],
            named_volumes: vec!["vmstorage-data".into()],
            ..Default::default()
        },
        "vminsert" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--storageNode=vmstorage:8400".into(),
                "--httpListenAddr=:8480".into(),
            ],
            ..Default::default()
        },
        "vmselect" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--storageNode=vmstorage:8401".into(),
                "--httpListenAddr=:8481".into(),
            ],
            ..Default::default()
        },
        "vmagent" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--promscrape.config=/etc/vmagent/config.yml".into(),
                format!(
                    "--remoteWrite.url={}",
                    s.text("remoteWriteUrl", &ctx.endpoints.write_url)
                ),
                "--httpListenAddr=:8429".into(),
            ],
            volumes: vec!["./vmagent.yml:/etc/vmagent/config.yml".into()],
            ..Default::default()
        },
        "vmalert" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--rule=/etc/vmalert/rules/*.yml".into(),
                format!("--datasource.url={}", ctx.endpoints.read_url),
                format!(
                    "--remoteWrite.url={}",
                    ctx.endpoints.write_url.trim_end_matches("/api/v1/write")
                ),
                "--notifier.url=http://alertmanager:9093".into(),
                "--httpListenAddr=:8880".into(),
            ],
            volumes: vec!["./vmalert/rules:/etc/vmalert/rules".into()],
            ..Default::default()
        },
        "grafana" => ServiceSpec {
            publish_port: true,
            environment: vec![
                format!(
                    "GF_SECURITY_ADMIN_PASSWORD={}",
                    s.text("adminPassword", "admin123")
                ),
                "GF_USERS_ALLOW_SIGN_UP=false".into(),
            ],
            volumes: vec![
                "grafana-data:/var/lib/grafana".into(),
                "./grafana/provisioning:/etc/grafana/provisioning".into(),
            ],
            named_volumes: vec!["grafana-data".into()],
            ..Default::default()
        },
        "snmp-exporter" => ServiceSpec {
            publish_port: true,
            command: vec!["--config.file=/etc/snmp_exporter/snmp.yml".into()],
            volumes: vec!["./snmp.yml:/etc/snmp_exporter/snmp.yml".into()],
            ..Default::default()
        },
        "alertmanager" => ServiceSpec {
            publish_port: true,
            command: vec![
                "--config.file=/etc/alertmanager/alertmanager.yml".into(),
                "--storage.path=/alertmanager".into(),
                "--web.external-url=http://localhost:9093".into(),
            ],
            volumes: vec![
                "./alertmanager.yml:/etc/alertmanager/alertmanager.yml".into(),
                "alertmanager-data:/alertmanager".into(),
            ],
            named_volumes: vec!["alertmanager-data".into()],
            ..Default::default()
        },
        _ => ServiceSpec {
            publish_port: true,
            ..Default::default()
        },
    }
}

fn list(out: &mut String, key: &str, items: &[String], quote: bool) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "    {}:", key);
    for item in items {
        if quote {
            let _ = writeln!(out, "      - '{}'", item);
        } else {
            let _ = writeln!(out, "      - {}", item);
        }
    }
}

/// `docker-compose.<id>.yml` from the shared skeleton
pub(crate) fn compose_file(ctx: &ComponentContext<'_>) -> ConfigFile {
    let spec = service_spec(ctx);
    let mut out = String::new();

    let _ = writeln!(out, "version: '3.8'");
    let _ = writeln!(out, "services:");
    let _ = writeln!(out, "  {}:", ctx.id);
    let _ = writeln!(out, "    image: {}", image_for(ctx.id, ctx.version));
    let _ = writeln!(out, "    container_name: {}", ctx.id);
    let _ = writeln!(out, "    restart: unless-stopped");
    if let Some(hostname) = &spec.hostname {
        let _ = writeln!(out, "    hostname: {}", hostname);
    }
    if let (true, Some(port)) = (spec.publish_port, ctx.port) {
        let _ = writeln!(out, "    ports:");
        let _ = writeln!(out, "      - \"{}:{}\"", port, port);
    }
    list(&mut out, "command", &spec.command, true);
    list(&mut out, "environment", &spec.environment, false);
    list(&mut out, "volumes", &spec.volumes, false);
    let _ = writeln!(out, "    networks:");
    let _ = writeln!(out, "      - {}", ctx.network);

    if !spec.named_volumes.is_empty() {
        let _ = writeln!(out, "\nvolumes:");
        for volume in &spec.named_volumes {
            let _ = writeln!(out, "  {}:", volume);
        }
    }

    let _ = writeln!(out, "\nnetworks:");
    let _ = writeln!(out, "  {}:", ctx.network);
    let _ = write!(out, "    external: true");

    ConfigFile::new(
        format!("docker-compose.{}.yml", ctx.id),
        out,
        format!("Docker Compose service for {}", ctx.id),
        ConfigKind::Yaml,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Settings, StorageEndpoints};
    use component_registry::DeploymentMode;

    fn render(id: &str, version: &str, port: Option<u16>) -> String {
        let endpoints = StorageEndpoints::for_mode(DeploymentMode::Single);
        compose_file(&ComponentContext {
            id,
            version,
            port,
            network: "monitoring",
            mode: DeploymentMode::Single,
            endpoints: &endpoints,
            settings: Settings::default(),
        })
        .content
    }

    #[test]
    fn test_image_lookup() {
        assert_eq!(image_for("node-exporter", "1.7.0"), "prom/node-exporter:v1.7.0");
        assert_eq!(image_for("grafana", "10.2.3"), "grafana/grafana:10.2.3");
        assert_eq!(
            image_for("vmstorage", "1.96.0"),
            "victoriametrics/vmstorage:v1.96.0-cluster"
        );
        assert_eq!(image_for("vmagent", "latest"), "victoriametrics/vmagent:latest");
        assert_eq!(image_for("mystery", "0.1.0"), "mystery:0.1.0");
    }

    #[test]
    fn test_skeleton_substitution() {
        let content = render("alertmanager", "0.26.0", Some(9093));

        assert!(content.starts_with("version: '3.8'\nservices:\n  alertmanager:\n"));
        assert!(content.contains("    image: prom/alertmanager:v0.26.0\n"));
        assert!(content.contains("      - \"9093:9093\"\n"));
        assert!(content.contains("\nvolumes:\n  alertmanager-data:\n"));
        assert!(content.ends_with("networks:\n  monitoring:\n    external: true"));
    }

    #[test]
    fn test_categraf_port_is_not_published() {
        let content = render("categraf", "0.3.60", Some(9100));
        assert!(!content.contains("ports:"));
        assert!(content.contains("hostname: categraf-host"));
    }
}
