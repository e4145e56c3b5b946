//! Configuration files that accompany a component's compose descriptor.

use component_registry::DeploymentMode;
use serde::Serialize;
use std::collections::BTreeMap;

use super::ComponentContext;
use crate::{
    error::Error,
    types::{ConfigFile, ConfigKind},
};

pub(crate) fn companion_files(ctx: &ComponentContext<'_>) -> Result<Vec<ConfigFile>, Error> {
    let files = match ctx.id {
        "node-exporter" => vec![node_exporter_unit()],
        "categraf" => vec![categraf_config(ctx)?],
        "victoriametrics" => vec![prometheus_config()],
        "vmagent" => vec![vmagent_config(ctx)],
        "vmalert" => vec![vmalert_rules()],
        "grafana" => grafana_provisioning(ctx),
        "alertmanager" => vec![alertmanager_config(ctx)],
        "snmp-exporter" => vec![snmp_config()],
        _ => Vec::new(),
    };
    Ok(files)
}

fn node_exporter_unit() -> ConfigFile {
    let content = r#"[Unit]
Description=Node Exporter
Wants=network-online.target
After=network-online.target

[Service]
User=node_exporter
Group=node_exporter
Type=simple
ExecStart=/usr/local/bin/node_exporter \
    --path.procfs=/proc \
    --path.sysfs=/sys \
    --collector.filesystem.mount-points-exclude="^/(sys|proc|dev|host|etc)($$|/)"

[Install]
WantedBy=multi-user.target"#;

    ConfigFile::new(
        "node-exporter.service",
        content,
        "systemd unit for running node-exporter on the host",
        ConfigKind::Ini,
    )
}

#[derive(Serialize)]
struct CategrafConfig {
    global: CategrafGlobal,
    writer_opt: WriterOptions,
    writers: Vec<Writer>,
    log: LogOptions,
    inputs: BTreeMap<&'static str, Vec<Input>>,
}

#[derive(Serialize)]
struct CategrafGlobal {
    hostname: String,
    interval: u64,
    providers: Vec<&'static str>,
}

#[derive(Serialize)]
struct WriterOptions {
    batch: u32,
    chan_size: u32,
}

#[derive(Serialize)]
struct Writer {
    url: String,
    timeout: u32,
}

#[derive(Serialize)]
struct LogOptions {
    file_name: &'static str,
    level: &'static str,
}

#[derive(Serialize)]
struct Input {
    interval: u64,
    collect: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interfaces: Option<Vec<&'static str>>,
}

fn categraf_config(ctx: &ComponentContext<'_>) -> Result<ConfigFile, Error> {
    let interval = ctx.settings.number("interval", 15);

    let inputs = ["cpu", "mem", "disk", "diskio", "net", "netstat", "processes"]
        .into_iter()
        .map(|name| {
            let input = Input {
                interval,
                collect: vec![name],
                interfaces: (name == "net").then(|| vec!["eth*", "en*"]),
            };
            (name, vec![input])
        })
        .collect();

    let config = CategrafConfig {
        global: CategrafGlobal {
            hostname: ctx.settings.text("hostname", "localhost"),
            interval,
            providers: vec!["local"],
        },
        writer_opt: WriterOptions {
            batch: 2000,
            chan_size: 10000,
        },
        writers: vec![Writer {
            url: ctx.settings.text("remoteWriteUrl", &ctx.endpoints.write_url),
            timeout: 5000,
        }],
        log: LogOptions {
            file_name: "stdout",
            level: "INFO",
        },
        inputs,
    };

    let content = toml::to_string(&config).map_err(|e| Error::Serialization(e.to_string()))?;

    Ok(ConfigFile::new(
        "categraf.toml",
        content,
        "Categraf agent configuration",
        ConfigKind::Toml,
    ))
}

fn prometheus_config() -> ConfigFile {
    let content = r#"global:
  scrape_interval: 15s
  evaluation_interval: 15s

rule_files:
  - "rules/*.yml"

alerting:
  alertmanagers:
    - static_configs:
        - targets:
          - alertmanager:9093

scrape_configs:
  - job_name: 'victoriametrics'
    static_configs:
      - targets: ['localhost:8428']

  - job_name: 'node-exporter'
    static_configs:
      - targets: ['node-exporter:9100']

  - job_name: 'categraf'
    static_configs:
      - targets: ['categraf:9100']"#;

    ConfigFile::new(
        "prometheus.yml",
        content,
        "Prometheus-compatible scrape configuration",
        ConfigKind::Yaml,
    )
}

fn vmagent_config(ctx: &ComponentContext<'_>) -> ConfigFile {
    let s = &ctx.settings;
    let content = format!(
        r#"global:
  scrape_interval: 15s
  external_labels:
    cluster: '{cluster}'
    replica: '{replica}'

scrape_configs:
  - job_name: 'node-exporter'
    static_configs:
      - targets: ['node-exporter:9100']

  - job_name: 'categraf'
    static_configs:
      - targets: ['categraf:9100']

remote_write:
  - url: {url}
    queue_config:
      max_samples_per_send: 10000
      batch_send_deadline: 5s
      max_shards: 30"#,
        cluster = s.text("cluster", "default"),
        replica = s.text("replica", "1"),
        url = s.text("remoteWriteUrl", &ctx.endpoints.write_url),
    );

    ConfigFile::new("vmagent.yml", content, "vmagent scrape and remote-write configuration", ConfigKind::Yaml)
}

fn vmalert_rules() -> ConfigFile {
    let content = r#"groups:
  - name: host
    rules:
      - alert: InstanceDown
        expr: up == 0
        for: 1m
        labels:
          severity: critical
        annotations:
          summary: "Instance {{ $labels.instance }} down"
          description: "{{ $labels.job }} target {{ $labels.instance }} has been down for more than 1 minute."
      - alert: HighCpuUsage
        expr: 100 - (avg by (instance) (rate(node_cpu_seconds_total{mode="idle"}[5m])) * 100) > 80
        for: 5m
        labels:
          severity: warning
        annotations:
          summary: "High CPU usage on {{ $labels.instance }}""#;

    ConfigFile::new(
        "vmalert/rules/alerts.yml",
        content,
        "vmalert alerting rules",
        ConfigKind::Yaml,
    )
}

fn grafana_provisioning(ctx: &ComponentContext<'_>) -> Vec<ConfigFile> {
    let name = match ctx.mode {
        DeploymentMode::Single => "VictoriaMetrics",
        DeploymentMode::Cluster => "VictoriaMetrics Cluster",
    };
    let datasource = format!(
        r#"apiVersion: 1

datasources:
  - name: {name}
    type: prometheus
    access: proxy
    url: {url}
    isDefault: true
    editable: true"#,
        name = name,
        url = ctx.endpoints.read_url,
    );

    let dashboards = r#"apiVersion: 1

providers:
  - name: 'default'
    orgId: 1
    folder: ''
    type: file
    disableDeletion: false
    updateIntervalSeconds: 10
    allowUiUpdates: true
    options:
      path: /etc/grafana/provisioning/dashboards"#;

    vec![
        ConfigFile::new(
            "grafana/provisioning/datasources/datasource.yml",
            datasource,
            "Grafana datasource provisioning",
            ConfigKind::Yaml,
        ),
        ConfigFile::new(
            "grafana/provisioning/dashboards/dashboard.yml",
            dashboards,
            "Grafana dashboard provisioning",
            ConfigKind::Yaml,
        ),
    ]
}

fn alertmanager_config(ctx: &ComponentContext<'_>) -> ConfigFile {
    let s = &ctx.settings;
    let smtp_from = s.text("smtpFrom", "alerts@example.com");
    let content = format!(
        r#"global:
  smtp_smarthost: '{smtp_host}:587'
  smtp_from: '{smtp_from}'
  smtp_auth_username: '{smtp_from}'
  smtp_auth_password: 'your-password'

route:
  group_by: ['alertname']
  group_wait: 10s
  group_interval: 10s
  repeat_interval: 1h
  receiver: 'web.hook'

receivers:
  - name: 'web.hook'
    webhook_configs:
      - url: '{webhook}'
        send_resolved: true

inhibit_rules:
  - source_match:
      severity: 'critical'
    target_match:
      severity: 'warning'
    equal: ['alertname', 'dev', 'instance']"#,
        smtp_host = s.text("smtpHost", "smtp.example.com"),
        smtp_from = smtp_from,
        webhook = s.text("webhookUrl", "http://localhost:9093/webhook"),
    );

    ConfigFile::new("alertmanager.yml", content, "Alertmanager routing configuration", ConfigKind::Yaml)
}

fn snmp_config() -> ConfigFile {
    let content = r#"auths:
  public_v2:
    community: public
    security_level: noAuthNoPriv
    auth_protocol: MD5
    priv_protocol: DES
    version: 2

modules:
  if_mib:
    walk:
      - 1.3.6.1.2.1.2.2.1.2  # ifDescr
      - 1.3.6.1.2.1.2.2.1.3  # ifType
      - 1.3.6.1.2.1.2.2.1.5  # ifSpeed
      - 1.3.6.1.2.1.2.2.1.8  # ifOperStatus
      - 1.3.6.1.2.1.2.2.1.10 # ifInOctets
      - 1.3.6.1.2.1.2.2.1.16 # ifOutOctets
    metrics:
      - name: ifOperStatus
        oid: 1.3.6.1.2.1.2.2.1.8
        type: gauge
        help: The current operational state of the interface.
        indexes:
          - labelname: ifIndex
            type: gauge
        lookups:
          - labels:
              - ifIndex
            labelname: ifDescr
            oid: 1.3.6.1.2.1.2.2.1.2
            type: DisplayString"#;

    ConfigFile::new("snmp.yml", content, "SNMP exporter module configuration", ConfigKind::Yaml)
}
