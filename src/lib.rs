//! # Monitoring Installer
//!
//! Client for the monitoring installer HTTP API. The server lives in the
//! `installer-server` crate; plan generation, the resolver and the install
//! service live in `installer-core`.
//!
//! ```rust,no_run
//! use monitoring_installer::{ClientConfig, InstallerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InstallerClient::new(ClientConfig::new("http://localhost:3000"))?;
//!     let readiness = client.environment().await?;
//!     println!("ready: {}", readiness.ready);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod config_dir;
mod error;
mod types;

pub use client::InstallerClient;
pub use config::ClientConfig;
pub use config_dir::read_config_dir;
pub use error::Error;
pub use installer_core;
pub use types::{
    ComponentInfo, ComponentReleasesInfo, GeneratedPlan, PlanRequest, ReleaseInfo,
    ResolutionInfo, TemplateInfo, VersionInfo,
};
