use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Unknown version {version} for component {component}")]
    UnknownVersion { component: String, version: String },

    #[error("Component {0} is required and cannot be deselected")]
    Required(String),

    #[error("Component {component} is required in {mode} mode")]
    Anchored { component: String, mode: String },

    #[error("Component {component} conflicts with {other}")]
    Conflict { component: String, other: String },
}

pub type Result<T> = std::result::Result<T, Error>;
