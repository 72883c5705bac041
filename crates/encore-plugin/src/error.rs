use std::path::PathBuf;

use encore_config::{ConfigError, ValidationError};
use encore_manifest::ManifestError;
use encore_stimulus::StimulusError;

/// Error types for plugin lifecycle operations.
///
/// Every variant is terminal: the build stops and the message names the
/// offending configuration key or file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed plugin options.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Well-formed options that contradict the host configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// A package the plugin relies on is not installed.
    #[error("the package \"{package}\" could not be found. Try running \"{hint}\".")]
    MissingDependency { package: String, hint: String },

    /// A referenced controller manifest or controller does not exist.
    #[error("{message}")]
    MissingResource { resource: String, message: String },

    /// The controller manifest exists but has the wrong shape.
    #[error("invalid controller manifest: {field} {message}")]
    ControllerManifest { field: String, message: String },

    /// The final location of the entrypoints artifact is unknown.
    #[error("could not get the entrypoints file location: {reason}")]
    IntegrityResolution { reason: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// I/O error with the path it happened on.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize or parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn integrity(reason: impl Into<String>) -> Self {
        Error::IntegrityResolution {
            reason: reason.into(),
        }
    }
}

impl From<StimulusError> for Error {
    fn from(error: StimulusError) -> Self {
        match error {
            StimulusError::MissingPackage { package } => Error::MissingDependency {
                hint: format!("npm i {package}"),
                package,
            },
            StimulusError::MissingController {
                ref package,
                ref controller,
            } => Error::MissingResource {
                resource: format!("{package}/{controller}"),
                message: error.to_string(),
            },
            StimulusError::MissingManifest { ref path } => Error::MissingResource {
                resource: path.display().to_string(),
                message: error.to_string(),
            },
            StimulusError::InvalidManifest { field, message } => {
                Error::ControllerManifest { field, message }
            }
            StimulusError::Io { path, source } => Error::Io { path, source },
            StimulusError::Json { path, source } => Error::Json { path, source },
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::MissingDependency { .. } => "MISSING_DEPENDENCY",
            Error::MissingResource { .. } => "MISSING_RESOURCE",
            Error::ControllerManifest { .. } => "INVALID_CONTROLLER_MANIFEST",
            Error::IntegrityResolution { .. } => "INTEGRITY_RESOLUTION",
            Error::Manifest(_) => "MANIFEST_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Json { .. } => "JSON_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Validation(error) => Some(Box::new(format!(
                "Check the plugin options passed to vite-encore-plugin.\nOffending field: {}",
                error.field().unwrap_or("options")
            ))),
            Error::Configuration(error) => Some(Box::new(format!(
                "The option '{}' does not match the host configuration. Set it explicitly.",
                error.field()
            ))),
            Error::MissingDependency { hint, .. } => {
                Some(Box::new(format!("Install it with `{hint}`, then restart the build.")))
            }
            Error::MissingResource { resource, .. } => Some(Box::new(format!(
                "Check that '{resource}' exists, or remove it from assets/controllers.json."
            ))),
            Error::ControllerManifest { field, .. } => Some(Box::new(format!(
                "Fix the field '{field}' in your controller manifest."
            ))),
            Error::IntegrityResolution { .. } => Some(Box::new(
                "Integrity hashes need an output directory. Disable enableIntegrityHashes or set build.outDir.",
            )),
            Error::Manifest(ManifestError::UnsupportedAlgorithm { .. }) => Some(Box::new(
                "Supported integrity algorithms are sha256, sha384 and sha512.",
            )),
            Error::Io { .. } => Some(Box::new(
                "Check that the path exists and that you have permission to access it.",
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_missing_package_becomes_missing_dependency() {
        let error = Error::from(StimulusError::MissingPackage {
            package: "@symfony/ux-dropzone".into(),
        });
        assert!(matches!(
            &error,
            Error::MissingDependency { package, hint }
                if package == "@symfony/ux-dropzone" && hint == "npm i @symfony/ux-dropzone"
        ));
        assert_eq!(error.code().unwrap().to_string(), "MISSING_DEPENDENCY");
        assert!(error.help().unwrap().to_string().contains("npm i @symfony/ux-dropzone"));
    }

    #[test]
    fn test_missing_controller_becomes_missing_resource() {
        let error = Error::from(StimulusError::MissingController {
            package: "@symfony/ux-chartjs".into(),
            controller: "pie".into(),
        });
        match &error {
            Error::MissingResource { resource, message } => {
                assert_eq!(resource, "@symfony/ux-chartjs/pie");
                assert!(message.contains("\"pie\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(error.code().unwrap().to_string(), "MISSING_RESOURCE");
    }

    #[test]
    fn test_configuration_help_names_the_field() {
        let error = Error::from(ConfigError::Configuration {
            field: "manifestOptions.keyPrefix".into(),
            message: "is required".into(),
        });
        assert_eq!(error.code().unwrap().to_string(), "CONFIGURATION_ERROR");
        assert!(error.help().unwrap().to_string().contains("manifestOptions.keyPrefix"));
    }
}
