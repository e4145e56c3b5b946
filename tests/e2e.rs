use installer_core::{
    component_registry::{Architecture, DeploymentMode},
    InstallerConfig, RunStatus, SimulatorConfig,
};
use installer_server::{create_app, serve};
use monitoring_installer::{ClientConfig, Error, InstallerClient, PlanRequest};
use std::time::Duration;
use tokio::net::TcpListener;

/// Serves the real router on an ephemeral port
async fn spawn_server(
    work_root: &std::path::Path,
) -> color_eyre::Result<(String, tokio::task::JoinHandle<()>)> {
    let config = InstallerConfig {
        simulator: SimulatorConfig {
            step_delay_ms: 5,
            failure_probability: 0.0,
            ..SimulatorConfig::default()
        },
        ..InstallerConfig::default()
    }
    .with_work_root(work_root)
    .without_settle_delay();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_app(config)?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            eprintln!("Server error: {}", e);
        }
    });

    Ok((format!("http://{}", addr), handle))
}

#[tokio::test]
async fn test_installer_api() -> color_eyre::Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let (url, server_handle) = spawn_server(temp_dir.path()).await?;

    let client = InstallerClient::new(ClientConfig::new(url).with_timeout(Duration::from_secs(10)))?;
    assert!(client.health().await?);

    // Catalog
    let components = client.components(Some(Architecture::Amd64)).await?;
    assert_eq!(components.len(), 11);
    assert!(components
        .iter()
        .filter_map(|c| c.download_url.as_deref())
        .any(|url| url.contains("linux-amd64")));

    match client.component("prometheus").await {
        Err(Error::Api { status_code, .. }) => assert_eq!(status_code, 404),
        other => panic!("Expected 404, got {:?}", other.map(|c| c.id)),
    }

    // Cluster selection through the resolver, then a plan for it
    let single = client.resolve(DeploymentMode::Single, &[], None).await?;
    assert!(single.selected.contains(&"victoriametrics".to_string()));

    let cluster = client
        .resolve(DeploymentMode::Cluster, &single.selected, Some("alertmanager"))
        .await?;
    assert!(!cluster.selected.contains(&"victoriametrics".to_string()));
    for id in ["vmstorage", "vminsert", "vmselect", "alertmanager"] {
        assert!(cluster.selected.contains(&id.to_string()), "missing {}", id);
    }

    let plan = client
        .generate_config(&PlanRequest::new(DeploymentMode::Cluster, cluster.selected.clone()))
        .await?;
    assert!(plan.success);
    assert_eq!(plan.summary.components, cluster.selected.len());
    let datasource = &plan.configs["grafana/provisioning/datasources/datasource.yml"];
    assert!(datasource.contains("http://vmselect:8481/select/0/prometheus"));
    assert!(plan.configs.contains_key("install.sh"));

    // Readiness reflects whatever the host has
    let readiness = client.environment().await?;
    assert_eq!(
        readiness.ready,
        readiness.docker.available && readiness.docker_compose.available
    );

    // Mock install to completion
    let id = client
        .start_simulation(&["node-exporter".to_string(), "grafana".to_string()])
        .await?;
    let mut progress = client.simulation(id).await?;
    for _ in 0..200 {
        if progress.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        progress = client.simulation(id).await?;
    }
    assert_eq!(progress.status, RunStatus::Completed);
    assert_eq!(progress.services.len(), 2);

    server_handle.abort();
    Ok(())
}
