use crate::{
    error::{Error, Result},
    types::{Category, ComponentDescriptor, ResourceRequirements, VersionRecord},
};
use std::collections::BTreeMap;

const GITHUB: &str = "https://github.com/";

static COMPONENTS: &[ComponentDescriptor] = &[
    ComponentDescriptor {
        id: "node-exporter",
        name: "Node Exporter",
        description: "Host metrics collector for CPU, memory, disk and network statistics",
        category: Category::Collector,
        versions: &[
            VersionRecord {
                version: "1.7.0",
                release_date: "2023-12-15",
                changelog: "- Added network interface metrics\n- Fixed disk IO accounting\n- Performance improvements",
                is_latest: true,
            },
            VersionRecord {
                version: "1.6.1",
                release_date: "2023-10-10",
                changelog: "- Fixed memory statistics\n- Improved CPU usage calculation",
                is_latest: false,
            },
            VersionRecord {
                version: "1.6.0",
                release_date: "2023-09-01",
                changelog: "- Added filesystem collector\n- More Linux kernel metrics",
                is_latest: false,
            },
        ],
        default_port: 9100,
        configurable: false,
        required: true,
        dependencies: &[],
        features: &["System load", "CPU usage", "Memory usage", "Disk usage", "Network traffic"],
        requirements: ResourceRequirements {
            cpu: "1 core",
            memory: "64MB",
            disk: "20MB",
        },
        documentation: "https://github.com/prometheus/node_exporter",
        artifact: "node_exporter",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "categraf",
        name: "Categraf",
        description: "Plugin-based metrics agent covering databases, middleware and applications",
        category: Category::Collector,
        versions: &[
            VersionRecord {
                version: "0.3.60",
                release_date: "2024-01-10",
                changelog: "- Added Kafka input\n- Improved MySQL monitoring\n- Fixed log rotation",
                is_latest: true,
            },
            VersionRecord {
                version: "0.3.59",
                release_date: "2023-12-20",
                changelog: "- Added Redis input\n- Faster configuration loading",
                is_latest: false,
            },
            VersionRecord {
                version: "0.3.58",
                release_date: "2023-12-01",
                changelog: "- More protocols\n- Fixed memory leak",
                is_latest: false,
            },
        ],
        default_port: 9100,
        configurable: true,
        required: false,
        dependencies: &[],
        features: &["Multi-protocol", "Plugin architecture", "Low footprint", "Hot reload"],
        requirements: ResourceRequirements {
            cpu: "1 core",
            memory: "128MB",
            disk: "50MB",
        },
        documentation: "https://github.com/flashcatcloud/categraf",
        artifact: "categraf",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "vmagent",
        name: "VMAgent",
        description: "Lightweight scrape agent that forwards samples to VictoriaMetrics",
        category: Category::Collector,
        versions: VM_VERSIONS,
        default_port: 8429,
        configurable: true,
        required: true,
        dependencies: &["victoriametrics"],
        features: &["High throughput", "Compression", "Service discovery", "Remote write"],
        requirements: ResourceRequirements {
            cpu: "2 cores",
            memory: "512MB",
            disk: "100MB",
        },
        documentation: "https://docs.victoriametrics.com/vmagent.html",
        artifact: "vmutils",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "victoriametrics",
        name: "VictoriaMetrics",
        description: "Single-node VictoriaMetrics time series database for small and medium deployments",
        category: Category::Storage,
        versions: VM_VERSIONS,
        default_port: 8428,
        configurable: true,
        // Mandatory only in single mode, see the resolver's constraint table
        required: false,
        dependencies: &[],
        features: &["PromQL compatible", "Compression", "Fast queries", "Single binary"],
        requirements: ResourceRequirements {
            cpu: "2 cores",
            memory: "1GB",
            disk: "10GB",
        },
        documentation: "https://docs.victoriametrics.com/",
        artifact: "victoria-metrics",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "vmstorage",
        name: "VMStorage",
        description: "Cluster storage node persisting raw samples",
        category: Category::Storage,
        versions: VM_VERSIONS,
        default_port: 8482,
        configurable: true,
        required: false,
        dependencies: &[],
        features: &["Persistence", "Compression", "Horizontal scaling", "Replication"],
        requirements: ResourceRequirements {
            cpu: "4 cores",
            memory: "8GB",
            disk: "100GB SSD",
        },
        documentation: "https://docs.victoriametrics.com/Cluster-VictoriaMetrics.html#vmstorage",
        artifact: "victoria-metrics",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "vminsert",
        name: "VMInsert",
        description: "Cluster ingestion node sharding writes across vmstorage nodes",
        category: Category::Storage,
        versions: VM_VERSIONS,
        default_port: 8480,
        configurable: true,
        required: false,
        dependencies: &["vmstorage"],
        features: &["Concurrent writes", "Load balancing", "Sharding", "Failover"],
        requirements: ResourceRequirements {
            cpu: "2 cores",
            memory: "2GB",
            disk: "10GB",
        },
        documentation: "https://docs.victoriametrics.com/Cluster-VictoriaMetrics.html#vminsert",
        artifact: "victoria-metrics",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "vmselect",
        name: "VMSelect",
        description: "Cluster query node merging results from vmstorage nodes",
        category: Category::Storage,
        versions: VM_VERSIONS,
        default_port: 8481,
        configurable: true,
        required: false,
        dependencies: &["vmstorage"],
        features: &["Fast queries", "Prometheus compatible", "Query cache", "Multi-tenancy"],
        requirements: ResourceRequirements {
            cpu: "2 cores",
            memory: "4GB",
            disk: "10GB",
        },
        documentation: "https://docs.victoriametrics.com/Cluster-VictoriaMetrics.html#vmselect",
        artifact: "victoria-metrics",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "vmalert",
        name: "VMAlert",
        description: "Alerting and recording rule evaluator",
        category: Category::Alerting,
        versions: VM_VERSIONS,
        default_port: 8880,
        configurable: true,
        required: false,
        dependencies: &["vmselect"],
        features: &["Rule evaluation", "Prometheus compatible", "Recording rules"],
        requirements: ResourceRequirements {
            cpu: "1 core",
            memory: "512MB",
            disk: "1GB",
        },
        documentation: "https://docs.victoriametrics.com/vmalert.html",
        artifact: "vmutils",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "grafana",
        name: "Grafana",
        description: "Dashboards and visualization",
        category: Category::Visualization,
        versions: &[
            VersionRecord {
                version: "10.2.3",
                release_date: "2024-01-20",
                changelog: "- Dashboard templates\n- Improved alert management\n- Security fixes",
                is_latest: true,
            },
            VersionRecord {
                version: "10.2.2",
                release_date: "2023-12-15",
                changelog: "- Fixed UI rendering\n- Improved authentication",
                is_latest: false,
            },
            VersionRecord {
                version: "10.2.1",
                release_date: "2023-12-01",
                changelog: "- New data sources\n- Query performance",
                is_latest: false,
            },
        ],
        default_port: 3000,
        configurable: true,
        required: true,
        dependencies: &[],
        features: &["Many data sources", "Rich visualizations", "Alerting", "Plugins"],
        requirements: ResourceRequirements {
            cpu: "2 cores",
            memory: "512MB",
            disk: "200MB",
        },
        documentation: "https://grafana.com/docs/grafana/latest/",
        artifact: "grafana",
        release_base_url: "https://dl.grafana.com/oss/release/",
    },
    ComponentDescriptor {
        id: "snmp-exporter",
        name: "SNMP Exporter",
        description: "Translates SNMP device data into Prometheus metrics",
        category: Category::Collector,
        versions: &[
            VersionRecord {
                version: "0.24.1",
                release_date: "2023-12-10",
                changelog: "- More device MIBs\n- Fixed SNMP v3 authentication",
                is_latest: true,
            },
            VersionRecord {
                version: "0.24.0",
                release_date: "2023-11-15",
                changelog: "- Better error handling\n- Performance",
                is_latest: false,
            },
            VersionRecord {
                version: "0.23.0",
                release_date: "2023-10-01",
                changelog: "- More network devices\n- Auto discovery",
                is_latest: false,
            },
        ],
        default_port: 9116,
        configurable: true,
        required: false,
        dependencies: &[],
        features: &["SNMP v1/v2c/v3", "MIB conversion", "Multi-device", "Custom metrics"],
        requirements: ResourceRequirements {
            cpu: "1 core",
            memory: "128MB",
            disk: "50MB",
        },
        documentation: "https://github.com/prometheus/snmp_exporter",
        artifact: "snmp_exporter",
        release_base_url: GITHUB,
    },
    ComponentDescriptor {
        id: "alertmanager",
        name: "Alertmanager",
        description: "Alert grouping, inhibition, silencing and notification routing",
        category: Category::Alerting,
        versions: &[
            VersionRecord {
                version: "0.26.0",
                release_date: "2023-12-20",
                changelog: "- Alert grouping\n- Better notification templates\n- More receivers",
                is_latest: true,
            },
            VersionRecord {
                version: "0.25.1",
                release_date: "2023-11-10",
                changelog: "- Fixed HA sync\n- Web UI improvements",
                is_latest: false,
            },
            VersionRecord {
                version: "0.25.0",
                release_date: "2023-10-15",
                changelog: "- Silences\n- More integrations",
                is_latest: false,
            },
        ],
        default_port: 9093,
        configurable: true,
        required: false,
        dependencies: &[],
        features: &["Grouping", "Inhibition", "Silencing", "Notifications", "HA mode"],
        requirements: ResourceRequirements {
            cpu: "1 core",
            memory: "128MB",
            disk: "50MB",
        },
        documentation: "https://prometheus.io/docs/alerting/latest/alertmanager/",
        artifact: "alertmanager",
        release_base_url: GITHUB,
    },
];

/// VictoriaMetrics components ship from the same release train
const VM_VERSIONS: &[VersionRecord] = &[
    VersionRecord {
        version: "1.96.0",
        release_date: "2024-01-15",
        changelog: "- Faster queries\n- Better compression\n- Fixed memory usage",
        is_latest: true,
    },
    VersionRecord {
        version: "1.95.1",
        release_date: "2023-12-20",
        changelog: "- Stability fixes under high concurrency\n- Lower memory usage",
        is_latest: false,
    },
    VersionRecord {
        version: "1.95.0",
        release_date: "2023-12-10",
        changelog: "- Stream aggregation\n- Improved HTTP API",
        is_latest: false,
    },
];

/// Read-only view over the component table
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    components: &'static [ComponentDescriptor],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            components: COMPONENTS,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'static ComponentDescriptor> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ComponentDescriptor> {
        self.components.iter()
    }

    pub fn by_category(
        &self,
        category: Category,
    ) -> impl Iterator<Item = &'static ComponentDescriptor> {
        self.components
            .iter()
            .filter(move |c| c.category == category)
    }

    pub fn required(&self) -> impl Iterator<Item = &'static ComponentDescriptor> {
        self.components.iter().filter(|c| c.required)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Latest version of every component, keyed by id
    pub fn latest_versions(&self) -> BTreeMap<String, String> {
        self.components
            .iter()
            .filter_map(|c| {
                c.latest_version()
                    .map(|v| (c.id.to_string(), v.version.to_string()))
            })
            .collect()
    }

    /// Looks up a specific version record, or the latest one when no version
    /// is requested.
    pub fn resolve_version(
        &self,
        id: &str,
        requested: Option<&str>,
    ) -> Result<&'static VersionRecord> {
        let component = self
            .get(id)
            .ok_or_else(|| Error::UnknownComponent(id.to_string()))?;

        let record = match requested {
            Some(version) => component.version(version),
            None => component.latest_version(),
        };

        record.ok_or_else(|| Error::UnknownVersion {
            component: id.to_string(),
            version: requested.unwrap_or("latest").to_string(),
        })
    }
}
