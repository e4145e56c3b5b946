//! Handlers for `/api/monitoring/*`

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use installer_core::{
    check_compatibility,
    component_registry::{
        Architecture, Category, ComponentDescriptor, DeploymentMode, Resolution,
    },
    templates::{self, InstallTemplate, TemplateCategory},
    ActionOutcome, CompatibilityReport, ConfigFile, EnvironmentReport, InstallRequest,
    PlanSettings, PlanSummary, ProgressSimulator, SimulationProgress,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    releases::{ComponentReleases, CATALOG_RELEASE_LIMIT, COMPONENT_RELEASE_LIMIT},
    ApiJson, AppState, ServerError, SimulationRun,
};

/// A catalog entry with the download link for one architecture
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    #[serde(flatten)]
    pub component: &'static ComponentDescriptor,
    pub latest_version: Option<&'static str>,
    pub download_url: Option<String>,
    pub architecture: Architecture,
}

impl ComponentView {
    fn new(component: &'static ComponentDescriptor, arch: Architecture) -> Self {
        let latest = component.latest_version();
        Self {
            component,
            latest_version: latest.map(|v| v.version),
            download_url: latest.map(|v| component.download_url(v.version, arch)),
            architecture: arch,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ComponentQuery {
    pub arch: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub mode: DeploymentMode,
    #[serde(default)]
    pub components: Vec<String>,
    /// Select this id if absent from `components`, deselect it otherwise
    #[serde(default)]
    pub toggle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReleaseQuery {
    pub component: Option<String>,
}

/// One component's releases when filtered, the whole catalog otherwise
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReleasesResponse {
    One(ComponentReleases),
    All(Vec<ComponentReleases>),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VersionsRequest {
    pub components: Vec<String>,
    #[serde(default)]
    pub versions: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfigRequest {
    pub components: Vec<String>,
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
    #[serde(default)]
    pub deployment_mode: DeploymentMode,
    #[serde(default)]
    pub settings: PlanSettings,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfigResponse {
    pub success: bool,
    pub configs: HashMap<String, String>,
    pub files: Vec<ConfigFile>,
    pub versions: BTreeMap<String, String>,
    pub summary: PlanSummary,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationRequest {
    pub components: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationCreated {
    pub id: Uuid,
}

/// `arch` from the query, else detected from the user agent
fn requested_arch(query: &ComponentQuery, headers: &HeaderMap) -> Result<Architecture, ServerError> {
    match query.arch.as_deref() {
        Some(arch) => arch.parse().map_err(ServerError::InvalidInput),
        None => Ok(headers
            .get(header::USER_AGENT)
            .and_then(|ua| ua.to_str().ok())
            .map(Architecture::detect)
            .unwrap_or_default()),
    }
}

pub async fn list_components(
    State(state): State<AppState>,
    Query(query): Query<ComponentQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<ComponentView>>, ServerError> {
    let arch = requested_arch(&query, &headers)?;

    let views = match query.category.as_deref() {
        Some(category) => {
            let category: Category = category.parse().map_err(ServerError::InvalidInput)?;
            state
                .catalog()
                .by_category(category)
                .map(|c| ComponentView::new(c, arch))
                .collect()
        }
        None => state
            .catalog()
            .iter()
            .map(|c| ComponentView::new(c, arch))
            .collect(),
    };

    Ok(Json(views))
}

pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ComponentQuery>,
    headers: HeaderMap,
) -> Result<Json<ComponentView>, ServerError> {
    let arch = requested_arch(&query, &headers)?;

    state
        .catalog()
        .get(&id)
        .map(|c| Json(ComponentView::new(c, arch)))
        .ok_or_else(|| ServerError::NotFound(format!("component {}", id)))
}

pub async fn list_templates(
    Query(query): Query<TemplateQuery>,
) -> Result<Json<Vec<&'static InstallTemplate>>, ServerError> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<TemplateCategory>)
        .transpose()
        .map_err(ServerError::InvalidInput)?;

    Ok(Json(templates::filter(query.search.as_deref(), category)))
}

pub async fn resolve(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResolveRequest>,
) -> Result<Json<Resolution>, ServerError> {
    let resolver = &state.resolver;
    let before: BTreeSet<String> = payload.components.iter().cloned().collect();
    let resolved = resolver
        .resolve(&payload.components, payload.mode)
        .map_err(installer_core::Error::from)?;

    let resolution = match payload.toggle.as_deref() {
        Some(id) if resolved.selected.contains(id) => {
            resolver.deselect(&resolved.selected, id, payload.mode)
        }
        Some(id) => resolver.select(&resolved.selected, id, payload.mode),
        None => Ok(resolved),
    }
    .map_err(installer_core::Error::from)?;

    debug!(
        "Resolved {} component(s) in {} mode",
        resolution.selected.len(),
        payload.mode
    );
    Ok(Json(Resolution::between(&before, resolution.selected)))
}

pub async fn list_releases(
    State(state): State<AppState>,
    Query(query): Query<ReleaseQuery>,
) -> Result<Json<ReleasesResponse>, ServerError> {
    match query.component.as_deref() {
        Some(id) => {
            let component = state
                .catalog()
                .get(id)
                .ok_or_else(|| ServerError::NotFound(format!("component {}", id)))?;
            let releases = state.releases.releases(component, COMPONENT_RELEASE_LIMIT).await;
            Ok(Json(ReleasesResponse::One(releases)))
        }
        None => {
            let mut all = Vec::new();
            for component in state.catalog().iter() {
                all.push(state.releases.releases(component, CATALOG_RELEASE_LIMIT).await);
            }
            Ok(Json(ReleasesResponse::All(all)))
        }
    }
}

pub async fn check_versions(ApiJson(payload): ApiJson<VersionsRequest>) -> Json<CompatibilityReport> {
    Json(check_compatibility(&payload.components, &payload.versions))
}

pub async fn generate_config(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateConfigRequest>,
) -> Result<Json<GenerateConfigResponse>, ServerError> {
    let selected: BTreeSet<String> = payload.components.into_iter().collect();
    let plan = state.generator.generate(
        &selected,
        &payload.versions,
        payload.deployment_mode,
        &payload.settings,
    )?;

    info!(
        "Generated {} file(s) for {} component(s)",
        plan.summary.total_files, plan.summary.components
    );

    Ok(Json(GenerateConfigResponse {
        success: true,
        configs: plan.configs(),
        files: plan.files.into_values().collect(),
        versions: plan.versions,
        summary: plan.summary,
    }))
}

pub async fn environment(State(state): State<AppState>) -> Json<EnvironmentReport> {
    Json(state.service.environment().await)
}

pub async fn execute_action(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<InstallRequest>,
) -> Result<Json<ActionOutcome>, ServerError> {
    Ok(Json(state.service.execute(payload).await?))
}

pub async fn start_simulation(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SimulationRequest>,
) -> Result<(StatusCode, Json<SimulationCreated>), ServerError> {
    if payload.components.is_empty() {
        return Err(installer_core::Error::EmptySelection.into());
    }
    if let Some(unknown) = payload
        .components
        .iter()
        .find(|id| !state.catalog().contains(id))
    {
        return Err(ServerError::InvalidInput(format!(
            "Unknown component: {}",
            unknown
        )));
    }

    let id = Uuid::new_v4();
    let simulator = Arc::new(ProgressSimulator::new(
        *state.catalog(),
        state.simulator.clone(),
        payload.components,
    ));

    let runner = simulator.clone();
    let task = tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        runner.run(&mut rng).await;
    });

    state
        .track_simulation(
            id,
            SimulationRun {
                simulator,
                task,
                created: Instant::now(),
            },
        )
        .await;

    info!("Started simulation {}", id);
    Ok((StatusCode::CREATED, Json(SimulationCreated { id })))
}

pub async fn simulation_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SimulationProgress>, ServerError> {
    let simulator = {
        let runs = state.simulations.read().await;
        runs.get(&id)
            .map(|run| run.simulator.clone())
            .ok_or_else(|| ServerError::NotFound(format!("simulation {}", id)))?
    };

    Ok(Json(simulator.get_progress().await))
}

/// Cancels the run and aborts its task. The run stays readable.
pub async fn cancel_simulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SimulationProgress>, ServerError> {
    let runs = state.simulations.read().await;
    let run = runs
        .get(&id)
        .ok_or_else(|| ServerError::NotFound(format!("simulation {}", id)))?;

    run.simulator.cancel().await;
    run.task.abort();

    info!("Cancelled simulation {}", id);
    Ok(Json(run.simulator.get_progress().await))
}
