use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] component_registry::Error),

    #[error("No components selected")]
    EmptySelection,

    #[error("Environment not ready: {0}")]
    EnvironmentUnavailable(String),

    #[error("Configuration files are required to install")]
    MissingConfigs,

    #[error("Invalid config file name: {0}")]
    InvalidConfigPath(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("System error: {0}")]
    System(String),
}
