use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = StimulusError> = std::result::Result<T, E>;

/// Build-side failures.
#[derive(Debug, Error)]
pub enum StimulusError {
    /// The controller manifest does not have the expected shape.
    #[error("invalid controller manifest: {field} {message}")]
    InvalidManifest { field: String, message: String },

    #[error("the package \"{package}\" could not be found. Try running \"npm i {package}\".")]
    MissingPackage { package: String },

    #[error(
        "the controller \"{controller}\" does not exist in the package \"{package}\" and cannot be compiled"
    )]
    MissingController { package: String, controller: String },

    #[error("the controller manifest {} could not be found", path.display())]
    MissingManifest { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StimulusError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        StimulusError::InvalidManifest {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Runtime failures of the controller bridge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no controller is registered as '{identifier}'")]
    Unregistered { identifier: String },

    #[error("failed to load controller '{identifier}': {message}")]
    LoadFailed { identifier: String, message: String },

    /// A background import was requested outside a tokio runtime.
    #[error("cannot import controller '{identifier}' in the background: no tokio runtime is running")]
    NoRuntime { identifier: String },
}
