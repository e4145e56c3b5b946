use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use super::{
    fixtures::{docker_missing_runtime, installing_runtime, no_such_container, ready_runtime},
    test_cases::DOCKER_VERSION,
    utils::defaults::{ids, test_config},
};
use crate::{
    runtime::CommandOutput, ContainerState, Error, InstallAction, InstallRequest, InstallService,
    ServiceStatus,
};

fn compose_configs(components: &[&str]) -> HashMap<String, String> {
    let mut configs: HashMap<String, String> = components
        .iter()
        .map(|id| {
            (
                format!("docker-compose.{}.yml", id),
                format!("services:\n  {}: {{}}\n", id),
            )
        })
        .collect();
    configs.insert("install.sh".to_string(), "#!/bin/bash\n".to_string());
    configs
}

#[tokio::test]
async fn test_environment_report() {
    let root = TempDir::new().unwrap();
    let mut runtime = ready_runtime();
    runtime
        .expect_running_containers()
        .returning(|_| Ok(vec!["grafana".to_string()]));
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let report = service.environment().await;

    assert!(report.ready);
    assert_eq!(report.docker.version, DOCKER_VERSION);
    assert_eq!(report.running_containers, vec!["grafana"]);
}

#[tokio::test]
async fn test_environment_not_ready_without_compose() {
    let root = TempDir::new().unwrap();
    let mut runtime = crate::runtime::MockContainerRuntime::new();
    runtime
        .expect_docker_version()
        .returning(|| Some(DOCKER_VERSION.to_string()));
    runtime.expect_compose_version().returning(|| None);
    runtime.expect_running_containers().returning(|_| Ok(vec![]));
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let report = service.environment().await;

    assert!(report.docker.available);
    assert!(!report.docker_compose.available);
    assert_eq!(report.docker_compose.version, "Not available");
    assert!(!report.ready);
}

#[tokio::test]
async fn test_empty_components_rejected() {
    let root = TempDir::new().unwrap();
    let service = InstallService::new(Arc::new(ready_runtime()), test_config(&root));

    let result = service
        .execute(InstallRequest {
            action: InstallAction::Status,
            components: vec![],
            configs: None,
        })
        .await;

    assert!(matches!(result, Err(Error::EmptySelection)));
    assert_eq!(service.get_available_slots(), 4);
}

#[tokio::test]
async fn test_docker_missing_rejected() {
    let root = TempDir::new().unwrap();
    let service = InstallService::new(Arc::new(docker_missing_runtime()), test_config(&root));

    let result = service
        .execute(InstallRequest {
            action: InstallAction::Status,
            components: ids(&["grafana"]),
            configs: None,
        })
        .await;

    assert!(matches!(result, Err(Error::EnvironmentUnavailable(_))));
}

#[tokio::test]
async fn test_install_requires_configs() {
    let root = TempDir::new().unwrap();
    let service = InstallService::new(Arc::new(ready_runtime()), test_config(&root));

    let result = service
        .execute(InstallRequest {
            action: InstallAction::Install,
            components: ids(&["grafana"]),
            configs: None,
        })
        .await;

    assert!(matches!(result, Err(Error::MissingConfigs)));
}

#[tokio::test]
async fn test_install_rejects_escaping_paths() {
    let root = TempDir::new().unwrap();
    let service = InstallService::new(Arc::new(ready_runtime()), test_config(&root));

    let mut configs = compose_configs(&["grafana"]);
    configs.insert("../outside.yml".to_string(), String::new());

    let result = service
        .execute(InstallRequest {
            action: InstallAction::Install,
            components: ids(&["grafana"]),
            configs: Some(configs),
        })
        .await;

    assert!(matches!(result, Err(Error::InvalidConfigPath(_))));
}

#[tokio::test]
async fn test_install_follows_fixed_order() {
    let root = TempDir::new().unwrap();
    let (runtime, started) = installing_runtime(&[]);
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let components = ["grafana", "vmagent", "node-exporter", "victoriametrics"];
    let outcome = service
        .execute(InstallRequest {
            action: InstallAction::Install,
            components: ids(&components),
            configs: Some(compose_configs(&components)),
        })
        .await
        .unwrap();

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(
        *started.lock().unwrap(),
        vec![
            "docker-compose.victoriametrics.yml",
            "docker-compose.node-exporter.yml",
            "docker-compose.vmagent.yml",
            "docker-compose.grafana.yml",
        ]
    );

    let work_dir = outcome.work_dir.unwrap();
    assert!(work_dir.starts_with(root.path()));
    assert!(work_dir.join("docker-compose.grafana.yml").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(work_dir.join("install.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[tokio::test]
async fn test_install_continues_past_missing_compose_file() {
    let root = TempDir::new().unwrap();
    let (runtime, started) = installing_runtime(&["grafana"]);
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let outcome = service
        .execute(InstallRequest {
            action: InstallAction::Install,
            components: ids(&["alertmanager", "grafana", "node-exporter"]),
            configs: Some(compose_configs(&["grafana", "node-exporter"])),
        })
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].contains("docker-compose.alertmanager.yml"));
    assert_eq!(outcome.errors[1], "Failed to start grafana: error");
    assert_eq!(started.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_uninstall_treats_missing_container_as_success() {
    let root = TempDir::new().unwrap();
    let mut runtime = ready_runtime();
    runtime.expect_remove().returning(|name| {
        if name == "grafana" {
            Ok(CommandOutput::default())
        } else {
            Err(no_such_container(name))
        }
    });
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let outcome = service
        .execute(InstallRequest {
            action: InstallAction::Uninstall,
            components: ids(&["grafana", "vmagent"]),
            configs: None,
        })
        .await
        .unwrap();

    assert!(outcome.success);
    let output = outcome.output.unwrap();
    assert!(output.contains("grafana uninstalled successfully"));
    assert!(output.contains("vmagent was not running"));
}

#[tokio::test]
async fn test_restart_reports_per_component() {
    let root = TempDir::new().unwrap();
    let mut runtime = ready_runtime();
    runtime.expect_restart().returning(|name| {
        if name == "vmagent" {
            Err(Error::Command("docker restart vmagent failed".to_string()))
        } else {
            Ok(CommandOutput::default())
        }
    });
    runtime
        .expect_service_status()
        .returning(|name| ServiceStatus::new(name, ContainerState::Running));
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let outcome = service
        .execute(InstallRequest {
            action: InstallAction::Restart,
            components: ids(&["grafana", "vmagent"]),
            configs: None,
        })
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.output.unwrap().contains("grafana restarted successfully"));
}

#[tokio::test]
async fn test_status_lists_every_component() {
    let root = TempDir::new().unwrap();
    let mut runtime = ready_runtime();
    runtime
        .expect_service_status()
        .returning(|name| ServiceStatus::new(name, ContainerState::Stopped));
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let outcome = service
        .execute(InstallRequest {
            action: InstallAction::Status,
            components: ids(&["grafana", "vmagent"]),
            configs: None,
        })
        .await
        .unwrap();

    assert!(outcome.success);
    let statuses = outcome.statuses.unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[1].name, "vmagent");
    assert_eq!(statuses[1].status, ContainerState::Stopped);
}

#[tokio::test]
async fn test_concurrent_actions_are_not_deduplicated() {
    let root = TempDir::new().unwrap();
    let (runtime, started) = installing_runtime(&[]);
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let request = InstallRequest {
        action: InstallAction::Install,
        components: ids(&["grafana"]),
        configs: Some(compose_configs(&["grafana"])),
    };

    let (first, second) = tokio::join!(
        service.execute(request.clone()),
        service.execute(request.clone())
    );

    assert_ne!(first.unwrap().work_dir, second.unwrap().work_dir);
    assert_eq!(started.lock().unwrap().len(), 2);
    assert_eq!(service.get_available_slots(), 4);
}
