//! Optional runtime packages, probed once per build.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::error::{Result, StimulusError};
use crate::package::PackageLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `@hotwired/stimulus`
    Stimulus,
    /// `@symfony/stimulus-bridge`
    StimulusBridge,
}

impl Capability {
    /// Capabilities the generated controller table needs at runtime.
    pub const REQUIRED: [Capability; 2] = [Capability::Stimulus, Capability::StimulusBridge];

    pub fn package(self) -> &'static str {
        match self {
            Capability::Stimulus => "@hotwired/stimulus",
            Capability::StimulusBridge => "@symfony/stimulus-bridge",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.package())
    }
}

/// The set of installed capabilities. Downstream code checks flags here and
/// never probes the filesystem again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    installed: HashSet<Capability>,
}

impl Capabilities {
    pub fn probe(locator: &dyn PackageLocator) -> Self {
        let installed: HashSet<_> = Capability::REQUIRED
            .into_iter()
            .filter(|capability| locator.is_installed(capability.package()))
            .collect();
        debug!(?installed, "probed stimulus capabilities");
        Self { installed }
    }

    pub fn from_installed(installed: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            installed: installed.into_iter().collect(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.installed.contains(&capability)
    }

    /// Fails with the first required capability that is not installed.
    pub fn require_all(&self) -> Result<()> {
        match Capability::REQUIRED
            .into_iter()
            .find(|capability| !self.has(*capability))
        {
            Some(missing) => Err(StimulusError::MissingPackage {
                package: missing.package().to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_first_missing_package() {
        let capabilities = Capabilities::from_installed([Capability::Stimulus]);
        let err = capabilities.require_all().unwrap_err();
        assert_eq!(
            err.to_string(),
            "the package \"@symfony/stimulus-bridge\" could not be found. Try running \"npm i @symfony/stimulus-bridge\"."
        );
    }

    #[test]
    fn test_all_installed() {
        let capabilities = Capabilities::from_installed(Capability::REQUIRED);
        assert!(capabilities.require_all().is_ok());
        assert!(capabilities.has(Capability::StimulusBridge));
    }
}
