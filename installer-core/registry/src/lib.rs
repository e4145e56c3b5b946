//! Component Registry
//!
//! Static reference data for the monitoring stack: the component catalog,
//! release version records, per-architecture download URLs and the
//! deployment-mode resolver that keeps a component selection consistent.

pub mod catalog;
pub mod download;
pub mod error;
pub mod resolver;
mod types;

pub use catalog::Catalog;
pub use download::{download_url, release_repository};
pub use error::{Error, Result};
pub use resolver::{ConstraintRule, Resolution, Resolver};
pub use types::{
    Architecture, Category, ComponentDescriptor, DeploymentMode, ResourceRequirements,
    VersionRecord,
};
