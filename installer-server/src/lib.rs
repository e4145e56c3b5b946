use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use installer_core::{
    component_registry::{self, Catalog, Resolver},
    InstallService, InstallerConfig, PlanGenerator, ProgressSimulator, SimulatorConfig,
};
use serde_json::json;
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Instant};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};
use uuid::Uuid;

pub mod releases;
pub mod routes;

pub use releases::{ComponentReleases, ReleaseClient, ReleaseSource, ReleaseVersion};
pub use routes::{
    ComponentView, GenerateConfigRequest, GenerateConfigResponse, ReleaseQuery, ReleasesResponse,
    ResolveRequest, SimulationCreated, SimulationRequest, VersionsRequest,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Installer(#[from] installer_core::Error),
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        use component_registry::Error as RegistryError;
        use installer_core::Error as CoreError;

        let status = match &self {
            ServerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Installer(CoreError::Registry(e)) => match e {
                RegistryError::UnknownComponent(_) | RegistryError::UnknownVersion { .. } => {
                    StatusCode::BAD_REQUEST
                }
                RegistryError::Required(_)
                | RegistryError::Anchored { .. }
                | RegistryError::Conflict { .. } => StatusCode::CONFLICT,
            },
            ServerError::Installer(
                CoreError::EmptySelection
                | CoreError::MissingConfigs
                | CoreError::InvalidConfigPath(_)
                | CoreError::InvalidSetting(_),
            ) => StatusCode::BAD_REQUEST,
            ServerError::Installer(_) | ServerError::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            ServerError::ServerError(e) => {
                error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidInput(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the `{ "error": ... }` shape
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// A simulated install running on its own task
struct SimulationRun {
    simulator: Arc<ProgressSimulator>,
    task: JoinHandle<()>,
    created: Instant,
}

#[derive(Clone)]
pub struct AppState {
    resolver: Resolver,
    generator: Arc<PlanGenerator>,
    service: Arc<InstallService>,
    simulator: SimulatorConfig,
    simulations: Arc<RwLock<HashMap<Uuid, SimulationRun>>>,
    releases: Arc<ReleaseClient>,
}

impl AppState {
    pub fn new(service: InstallService, releases: ReleaseClient) -> Self {
        let config = service.config().clone();
        Self {
            resolver: Resolver::default(),
            generator: Arc::new(PlanGenerator::new(Catalog::builtin(), config.network.clone())),
            simulator: config.simulator,
            service: Arc::new(service),
            simulations: Arc::new(RwLock::new(HashMap::new())),
            releases: Arc::new(releases),
        }
    }

    fn catalog(&self) -> &Catalog {
        self.resolver.catalog()
    }

    /// Stores a new run and drops finished runs older than the retention
    /// window
    async fn track_simulation(&self, id: Uuid, run: SimulationRun) {
        let retention = self.simulator.retention();
        let mut runs = self.simulations.write().await;

        let mut expired = Vec::new();
        for (run_id, existing) in runs.iter() {
            if existing.created.elapsed() >= retention && existing.simulator.is_finished().await {
                expired.push(*run_id);
            }
        }
        for run_id in expired {
            runs.remove(&run_id);
            debug!("Evicted simulation {}", run_id);
        }

        runs.insert(id, run);
    }
}

/// Router backed by the local Docker CLI and the public GitHub API
pub fn create_app(config: InstallerConfig) -> Result<Router, ServerError> {
    let releases = ReleaseClient::github().map_err(|e| ServerError::ServerError(e.to_string()))?;
    Ok(create_app_with(InstallService::with_docker(config), releases))
}

pub fn create_app_with(service: InstallService, releases: ReleaseClient) -> Router {
    let state = AppState::new(service, releases);

    let cors = CorsLayer::permissive();

    let api = Router::new()
        .route("/components", get(routes::list_components))
        .route("/components/:id", get(routes::get_component))
        .route("/templates", get(routes::list_templates))
        .route("/resolve", post(routes::resolve))
        .route(
            "/versions",
            get(routes::list_releases).post(routes::check_versions),
        )
        .route("/generate-config", post(routes::generate_config))
        .route(
            "/install",
            get(routes::environment).post(routes::execute_action),
        )
        .route("/simulations", post(routes::start_simulation))
        .route(
            "/simulations/:id",
            get(routes::simulation_progress).delete(routes::cancel_simulation),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/monitoring", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    info!("Starting monitoring installer server on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    serve(listener, app).await
}

/// Serves `app` on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
