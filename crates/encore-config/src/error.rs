//! Error types for option validation and resolution.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field, e.g. `manifestOptions.keyPrefix`.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.message)
    }
}

/// Malformed user configuration.
///
/// Carries every violation found in one pass together with the raw input it
/// was found in.
#[derive(Debug, Clone, Error)]
#[error("invalid plugin options: {}", format_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
    pub input: Value,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>, input: Value) -> Self {
        Self { violations, input }
    }

    /// Path of the first offending field.
    pub fn field(&self) -> Option<&str> {
        self.violations.first().map(|v| v.path.as_str())
    }

    /// Whether a violation was reported for `path`.
    pub fn has_violation(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Well-shaped options that are inconsistent with the host configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} {message}")]
    Configuration { field: String, message: String },

    #[error("server.origin is not a valid URL: {origin} ({reason})")]
    InvalidOrigin { origin: String, reason: String },
}

impl ConfigError {
    /// The configuration key the error is about.
    pub fn field(&self) -> &str {
        match self {
            ConfigError::Configuration { field, .. } => field,
            ConfigError::InvalidOrigin { .. } => "server.origin",
        }
    }
}
