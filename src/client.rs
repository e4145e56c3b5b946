use installer_core::{
    component_registry::{Architecture, DeploymentMode},
    ActionOutcome, CompatibilityReport, EnvironmentReport, InstallRequest, SimulationProgress,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    error::Error,
    types::{
        ComponentInfo, ComponentReleasesInfo, GeneratedPlan, PlanRequest, ResolutionInfo,
        SimulationCreated, TemplateInfo,
    },
};

/// Client for the installer HTTP API
pub struct InstallerClient {
    client: Client,
    config: ClientConfig,
}

impl InstallerClient {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health(&self) -> Result<bool, Error> {
        let response = self
            .client
            .get(format!("{}/health", self.config.api_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    pub async fn components(&self, arch: Option<Architecture>) -> Result<Vec<ComponentInfo>, Error> {
        let mut request = self.client.get(self.config.endpoint("components"));
        if let Some(arch) = arch {
            request = request.query(&[("arch", arch_name(arch))]);
        }
        self.send(request).await
    }

    pub async fn component(&self, id: &str) -> Result<ComponentInfo, Error> {
        self.send(self.client.get(self.config.endpoint(&format!("components/{}", id))))
            .await
    }

    pub async fn templates(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<TemplateInfo>, Error> {
        let mut query = Vec::new();
        if let Some(search) = search {
            query.push(("search", search));
        }
        if let Some(category) = category {
            query.push(("category", category));
        }
        self.send(self.client.get(self.config.endpoint("templates")).query(&query))
            .await
    }

    /// Resolves `components` for `mode`, then toggles `toggle` if given
    pub async fn resolve(
        &self,
        mode: DeploymentMode,
        components: &[String],
        toggle: Option<&str>,
    ) -> Result<ResolutionInfo, Error> {
        let body = json!({
            "mode": mode,
            "components": components,
            "toggle": toggle,
        });
        self.send(self.client.post(self.config.endpoint("resolve")).json(&body))
            .await
    }

    /// Live releases of one component, or the catalog's when the lookup
    /// failed server-side
    pub async fn releases(&self, component: &str) -> Result<ComponentReleasesInfo, Error> {
        self.send(
            self.client
                .get(self.config.endpoint("versions"))
                .query(&[("component", component)]),
        )
        .await
    }

    pub async fn check_versions(
        &self,
        components: &[String],
        versions: &HashMap<String, String>,
    ) -> Result<CompatibilityReport, Error> {
        let body = json!({ "components": components, "versions": versions });
        self.send(self.client.post(self.config.endpoint("versions")).json(&body))
            .await
    }

    pub async fn generate_config(&self, request: &PlanRequest) -> Result<GeneratedPlan, Error> {
        self.send(
            self.client
                .post(self.config.endpoint("generate-config"))
                .json(request),
        )
        .await
    }

    pub async fn environment(&self) -> Result<EnvironmentReport, Error> {
        self.send(self.client.get(self.config.endpoint("install")))
            .await
    }

    pub async fn execute(&self, request: &InstallRequest) -> Result<ActionOutcome, Error> {
        self.send(self.client.post(self.config.endpoint("install")).json(request))
            .await
    }

    pub async fn start_simulation(&self, components: &[String]) -> Result<Uuid, Error> {
        let created: SimulationCreated = self
            .send(
                self.client
                    .post(self.config.endpoint("simulations"))
                    .json(&json!({ "components": components })),
            )
            .await?;
        Ok(created.id)
    }

    pub async fn simulation(&self, id: Uuid) -> Result<SimulationProgress, Error> {
        self.send(
            self.client
                .get(self.config.endpoint(&format!("simulations/{}", id))),
        )
        .await
    }

    pub async fn cancel_simulation(&self, id: Uuid) -> Result<SimulationProgress, Error> {
        self.send(
            self.client
                .delete(self.config.endpoint(&format!("simulations/{}", id))),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url());
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    if !response.status().is_success() {
        let status_code = response.status().as_u16();
        let text = response.text().await?;
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(text);
        return Err(Error::Api {
            status_code,
            message,
        });
    }

    response.json::<T>().await.map_err(Error::HttpClient)
}

fn arch_name(arch: Architecture) -> &'static str {
    match arch {
        Architecture::Amd64 => "amd64",
        Architecture::Arm64 => "arm64",
        Architecture::Armv7 => "armv7",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use installer_core::InstallAction;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(uri: String) -> InstallerClient {
        InstallerClient::new(ClientConfig::new(uri)).unwrap()
    }

    fn grafana_json() -> serde_json::Value {
        json!({
            "id": "grafana",
            "name": "Grafana",
            "description": "Dashboards",
            "category": "visualization",
            "versions": [{
                "version": "10.2.3",
                "releaseDate": "2023-12-18",
                "changelog": "Bug fixes",
                "isLatest": true
            }],
            "defaultPort": 3000,
            "required": true,
            "dependencies": [],
            "latestVersion": "10.2.3",
            "downloadUrl": "https://dl.grafana.com/oss/release/grafana-10.2.3.linux-arm64.tar.gz",
            "architecture": "arm64"
        })
    }

    #[tokio::test]
    async fn test_components_with_arch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/monitoring/components"))
            .and(query_param("arch", "arm64"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([grafana_json()])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let components = client.components(Some(Architecture::Arm64)).await.unwrap();

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].latest_version.as_deref(), Some("10.2.3"));
        assert!(components[0].versions[0].is_latest);
    }

    #[tokio::test]
    async fn test_api_error_handling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/monitoring/components/prometheus"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "error": "Not found: component prometheus" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let result = client.component("prometheus").await;

        match result {
            Err(Error::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 404);
                assert_eq!(message, "Not found: component prometheus");
            }
            other => panic!("Expected API error, got {:?}", other.map(|c| c.id)),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/monitoring/install"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        match client.environment().await {
            Err(Error::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_sends_toggle() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/monitoring/resolve"))
            .and(body_json(json!({
                "mode": "cluster",
                "components": ["grafana"],
                "toggle": "alertmanager"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "selected": ["alertmanager", "grafana", "vminsert"],
                "added": ["alertmanager", "vminsert"],
                "removed": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let resolution = client
            .resolve(
                DeploymentMode::Cluster,
                &["grafana".to_string()],
                Some("alertmanager"),
            )
            .await
            .unwrap();

        assert_eq!(resolution.added, vec!["alertmanager", "vminsert"]);
    }

    #[tokio::test]
    async fn test_component_releases() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/monitoring/versions"))
            .and(query_param("component", "grafana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "grafana",
                "name": "Grafana",
                "source": "github",
                "versions": [{
                    "version": "10.2.3",
                    "releaseDate": "2023-12-18T09:00:00Z",
                    "downloadUrl": "https://github.com/grafana/grafana/releases/tag/v10.2.3",
                    "isLatest": true
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let releases = client.releases("grafana").await.unwrap();

        assert_eq!(releases.source, "github");
        assert_eq!(releases.versions[0].version, "10.2.3");
        assert!(releases.versions[0].is_latest);
    }

    #[tokio::test]
    async fn test_execute_install_action() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/monitoring/install"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "output": "Installing grafana...\n",
                "errors": ["Failed to start grafana: error"],
                "workDir": "/tmp/monitoring-install/abc"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let outcome = client
            .execute(&InstallRequest {
                action: InstallAction::Install,
                components: vec!["grafana".to_string()],
                configs: Some(HashMap::new()),
            })
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.work_dir.is_some());
    }

    #[tokio::test]
    async fn test_start_simulation() {
        let mock_server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/api/monitoring/simulations"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": id })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let started = client
            .start_simulation(&["grafana".to_string()])
            .await
            .unwrap();

        assert_eq!(started, id);
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            InstallerClient::new(ClientConfig::new("localhost:3000")),
            Err(Error::Configuration(_))
        ));
    }
}
