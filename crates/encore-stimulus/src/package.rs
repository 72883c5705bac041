//! Lookup of installed npm packages and their controller descriptors.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::trace;

use crate::error::{Result, StimulusError};
use crate::manifest::PackageControllerInfo;

/// Finds installed packages.
pub trait PackageLocator {
    /// Path of the package's `package.json`, if installed.
    fn package_json(&self, package: &str) -> Option<PathBuf>;

    fn is_installed(&self, package: &str) -> bool {
        self.package_json(package).is_some()
    }

    /// The package's `symfony.controllers` map.
    fn controllers(&self, package: &str) -> Result<IndexMap<String, PackageControllerInfo>> {
        let path = self
            .package_json(package)
            .ok_or_else(|| StimulusError::MissingPackage {
                package: package.to_string(),
            })?;
        read_controllers(&path)
    }
}

/// Resolves packages the way Node does: `node_modules/<package>` in the
/// project root, then in each of its ancestors.
#[derive(Debug, Clone)]
pub struct NodeModulesLocator {
    root: PathBuf,
}

impl NodeModulesLocator {
    /// A relative root is made absolute so that its ancestors can be searched.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            root: std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageLocator for NodeModulesLocator {
    fn package_json(&self, package: &str) -> Option<PathBuf> {
        self.root.ancestors().find_map(|dir| {
            let candidate = dir.join("node_modules").join(package).join("package.json");
            trace!(candidate = %candidate.display(), "probing package");
            candidate.is_file().then_some(candidate)
        })
    }
}

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    symfony: Option<SymfonySection>,
}

#[derive(Deserialize)]
struct SymfonySection {
    #[serde(default)]
    controllers: IndexMap<String, PackageControllerInfo>,
}

fn read_controllers(path: &Path) -> Result<IndexMap<String, PackageControllerInfo>> {
    let source = fs::read_to_string(path).map_err(|source| StimulusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let package: PackageJson = serde_json::from_str(&source).map_err(|source| StimulusError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(package
        .symfony
        .map(|symfony| symfony.controllers)
        .unwrap_or_default())
}
