mod service;
mod utils;
mod workflow;

mod test_cases {
    pub const STANDALONE_STACK: &[&str] = &["node-exporter", "vmagent", "victoriametrics", "grafana"];
    pub const CLUSTER_STACK: &[&str] = &[
        "node-exporter",
        "vmagent",
        "vmstorage",
        "vminsert",
        "vmselect",
        "grafana",
    ];
    pub const DOCKER_VERSION: &str = "Docker version 24.0.7, build afdd53b";
    pub const COMPOSE_VERSION: &str = "Docker Compose version v2.23.0";
}
