//! # Monitoring Installer Core
//!
//! Turns a monitoring-component selection into deployable files and drives
//! the install against Docker.
//!
//! - [`InstallSession`] keeps a selection consistent through the resolver
//! - [`PlanGenerator`] renders compose descriptors, companion configs and an
//!   install script
//! - [`ProgressSimulator`] animates a mock install pipeline
//! - [`InstallService`] runs install/uninstall/restart/status actions through
//!   a [`ContainerRuntime`]

pub mod compatibility;
mod config;
mod error;
pub mod plan;
pub mod runtime;
mod service;
mod session;
pub mod simulator;
pub mod templates;
mod types;

#[cfg(test)]
mod tests;

pub use component_registry;
pub use compatibility::{check_compatibility, CompatibilityReport};
pub use config::{InstallerConfig, SimulatorConfig};
pub use error::Error;
pub use plan::PlanGenerator;
pub use runtime::{CommandOutput, ContainerRuntime, DockerCli};
pub use service::{install_order, InstallService, INSTALL_ORDER};
pub use session::{InstallSession, Violation};
pub use simulator::{ProgressSimulator, RunStatus, SimulationProgress};
pub use templates::{InstallTemplate, TemplateCategory};
pub use types::{
    ActionOutcome, ConfigFile, ConfigKind, ContainerState, EnvironmentReport, Health,
    InstallAction, InstallPlan, InstallRequest, InstallStep, PlanSettings, PlanSummary,
    ServiceStatus, StepStatus, ToolStatus,
};

/// Result type for installer operations
pub type Result<T> = std::result::Result<T, Error>;
