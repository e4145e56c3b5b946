use std::sync::Arc;
use tempfile::TempDir;

use super::{
    fixtures::installing_runtime,
    test_cases::{CLUSTER_STACK, STANDALONE_STACK},
    utils::defaults::test_config,
};
use crate::{
    component_registry::{DeploymentMode, Resolver},
    templates, InstallAction, InstallRequest, InstallService, InstallSession, PlanGenerator,
    PlanSettings,
};

#[test]
fn test_new_session_plans_standalone_stack() {
    let resolver = Resolver::default();
    let session = InstallSession::new(&resolver).unwrap();
    let plan = session
        .plan(&PlanGenerator::default(), &PlanSettings::new())
        .unwrap();

    for id in STANDALONE_STACK {
        assert!(plan.file(&format!("docker-compose.{}.yml", id)).is_some());
    }
    assert_eq!(plan.summary.components, STANDALONE_STACK.len());
    assert_eq!(plan.versions["victoriametrics"], "1.96.0");
}

#[test]
fn test_cluster_switch_replaces_storage_descriptors() {
    let resolver = Resolver::default();
    let mut session = InstallSession::new(&resolver).unwrap();
    session.set_mode(&resolver, DeploymentMode::Cluster).unwrap();

    let plan = session
        .plan(&PlanGenerator::default(), &PlanSettings::new())
        .unwrap();

    assert!(plan.file("docker-compose.victoriametrics.yml").is_none());
    assert!(plan.file("prometheus.yml").is_none());
    for id in CLUSTER_STACK {
        assert!(plan.file(&format!("docker-compose.{}.yml", id)).is_some());
    }
}

#[test]
fn test_template_plan_matches_template_components() {
    let resolver = Resolver::default();
    let mut session = InstallSession::default();
    let template = templates::find("network-monitoring-standalone").unwrap();
    session.apply_template(resolver.catalog(), template);

    let plan = session
        .plan(&PlanGenerator::default(), &PlanSettings::new())
        .unwrap();

    let planned: Vec<&String> = plan.versions.keys().collect();
    let mut expected: Vec<&str> = template.components.to_vec();
    expected.sort();
    assert_eq!(planned, expected);
    assert!(plan.file("snmp.yml").is_some());
    assert!(plan.file("vmalert/rules/alerts.yml").is_some());
}

#[tokio::test]
async fn test_generated_plan_installs() {
    let root = TempDir::new().unwrap();
    let (runtime, started) = installing_runtime(&[]);
    let service = InstallService::new(Arc::new(runtime), test_config(&root));

    let resolver = Resolver::default();
    let mut session = InstallSession::new(&resolver).unwrap();
    session.toggle(&resolver, "alertmanager").unwrap();
    let plan = session
        .plan(&PlanGenerator::default(), &PlanSettings::new())
        .unwrap();

    let outcome = service
        .execute(InstallRequest {
            action: InstallAction::Install,
            components: session.selected.iter().cloned().collect(),
            configs: Some(plan.configs()),
        })
        .await
        .unwrap();

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(started.lock().unwrap().len(), session.selected.len());

    let work_dir = outcome.work_dir.unwrap();
    assert!(work_dir
        .join("grafana/provisioning/datasources/datasource.yml")
        .exists());
    let written = std::fs::read_to_string(work_dir.join("alertmanager.yml")).unwrap();
    assert_eq!(written, plan.files["alertmanager.yml"].content);
    assert_eq!(plan.versions.len(), session.selected.len());
}
