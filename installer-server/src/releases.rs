//! Live release lookup against the GitHub releases API, with the static
//! catalog as fallback.

use installer_core::component_registry::ComponentDescriptor;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Releases listed when a single component is requested
pub const COMPONENT_RELEASE_LIMIT: usize = 10;
/// Releases listed per component when the whole catalog is requested
pub const CATALOG_RELEASE_LIMIT: usize = 5;

const USER_AGENT: &str = concat!("monitoring-installer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseVersion {
    pub version: String,
    pub release_date: Option<String>,
    /// Release page for GitHub entries
    pub download_url: Option<String>,
    pub is_latest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseSource {
    Github,
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReleases {
    pub id: String,
    pub name: String,
    pub source: ReleaseSource,
    pub versions: Vec<ReleaseVersion>,
}

type CacheEntry = (Instant, Vec<ReleaseVersion>);

/// Client for the GitHub releases API. Successful lookups are cached per
/// repository.
pub struct ReleaseClient {
    client: Client,
    api_url: String,
    cache_ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl ReleaseClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cache_ttl: Duration::from_secs(3600),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn github() -> Result<Self, reqwest::Error> {
        Self::new(GITHUB_API_URL)
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Newest stable releases of `component`, at most `limit` of them.
    /// Falls back to the catalog versions when the lookup fails.
    pub async fn releases(
        &self,
        component: &ComponentDescriptor,
        limit: usize,
    ) -> ComponentReleases {
        let fetched = match component.release_repository() {
            Some(repo) => match self.fetch(repo).await {
                Ok(versions) if !versions.is_empty() => Some(versions),
                Ok(_) => {
                    debug!("No stable releases published for {}", repo);
                    None
                }
                Err(e) => {
                    warn!("Release lookup for {} failed: {}", repo, e);
                    None
                }
            },
            None => None,
        };

        match fetched {
            Some(mut versions) => {
                versions.truncate(limit);
                ComponentReleases {
                    id: component.id.to_string(),
                    name: component.name.to_string(),
                    source: ReleaseSource::Github,
                    versions,
                }
            }
            None => catalog_releases(component, limit),
        }
    }

    async fn fetch(&self, repo: &str) -> Result<Vec<ReleaseVersion>, reqwest::Error> {
        if let Some((fetched_at, versions)) = self.cache.read().await.get(repo) {
            if fetched_at.elapsed() < self.cache_ttl {
                return Ok(versions.clone());
            }
        }

        let releases: Vec<GithubRelease> = self
            .client
            .get(format!("{}/repos/{}/releases", self.api_url, repo))
            .header(header::ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let versions: Vec<ReleaseVersion> = releases
            .into_iter()
            .filter(|r| !r.draft && !r.prerelease)
            .enumerate()
            .map(|(index, release)| ReleaseVersion {
                version: release
                    .tag_name
                    .strip_prefix('v')
                    .unwrap_or(&release.tag_name)
                    .to_string(),
                release_date: release.published_at,
                download_url: release.html_url,
                is_latest: index == 0,
            })
            .collect();

        debug!("Fetched {} stable release(s) of {}", versions.len(), repo);
        self.cache
            .write()
            .await
            .insert(repo.to_string(), (Instant::now(), versions.clone()));
        Ok(versions)
    }
}

fn catalog_releases(component: &ComponentDescriptor, limit: usize) -> ComponentReleases {
    ComponentReleases {
        id: component.id.to_string(),
        name: component.name.to_string(),
        source: ReleaseSource::Catalog,
        versions: component
            .versions
            .iter()
            .take(limit)
            .map(|v| ReleaseVersion {
                version: v.version.to_string(),
                release_date: Some(v.release_date.to_string()),
                download_url: None,
                is_latest: v.is_latest,
            })
            .collect(),
    }
}
