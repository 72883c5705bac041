//! `entrypoints.json`: entry name to the scripts and styles it needs.

use std::path::Path;

use encore_config::{HostConfig, ResolvedOptions};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::manifest::ManifestStore;
use crate::public_path::{OutputMode, PublicPathResolver};

const STYLESHEET_EXTENSIONS: &[&str] = &["css", "sass", "scss", "less", "styl", "stylus"];

/// Whether `filename` has a stylesheet extension.
pub fn is_stylesheet(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| STYLESHEET_EXTENSIONS.contains(&ext))
}

/// Serialized form of `entrypoints.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrypointsManifest {
    pub entrypoints: IndexMap<String, Entrypoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IndexMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrypoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<Vec<String>>,
}

/// Scripts and styles of one entry. Adding a path twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrypointRecord {
    pub js: IndexSet<String>,
    pub css: IndexSet<String>,
}

impl EntrypointRecord {
    pub fn add_script(&mut self, path: impl Into<String>) -> &mut Self {
        self.js.insert(path.into());
        self
    }

    pub fn add_style(&mut self, path: impl Into<String>) -> &mut Self {
        self.css.insert(path.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.is_empty()
    }
}

/// Accumulates entrypoints and integrity digests across the build phases.
#[derive(Debug, Clone)]
pub struct EntrypointsStore {
    entries: IndexMap<String, EntrypointRecord>,
    integrity: IndexMap<String, String>,
    public_path: PublicPathResolver,
}

impl EntrypointsStore {
    pub fn new(options: &ResolvedOptions) -> Self {
        Self::with_resolver(PublicPathResolver::from_options(options))
    }

    pub fn with_resolver(public_path: PublicPathResolver) -> Self {
        Self {
            entries: IndexMap::new(),
            integrity: IndexMap::new(),
            public_path,
        }
    }

    /// Returns the record for `name`, creating it on first use, with the given
    /// paths added.
    pub fn add_entry<S: AsRef<str>>(
        &mut self,
        name: &str,
        scripts: &[S],
        styles: &[S],
    ) -> &mut EntrypointRecord {
        let record = self.entries.entry(name.to_string()).or_default();
        for script in scripts {
            record.js.insert(script.as_ref().to_string());
        }
        for style in styles {
            record.css.insert(style.as_ref().to_string());
        }
        record
    }

    /// Records the space-joined digest tokens of one built file.
    pub fn add_integrity_entry(&mut self, file: impl Into<String>, digest: impl Into<String>) {
        self.integrity.insert(file.into(), digest.into());
    }

    pub fn entry(&self, name: &str) -> Option<&EntrypointRecord> {
        self.entries.get(name)
    }

    pub fn use_dev_server(&mut self) {
        self.public_path = self.public_path.clone().with_mode(OutputMode::DevServer);
    }

    pub fn is_dev_server(&self) -> bool {
        self.public_path.mode() == OutputMode::DevServer
    }

    /// Renders the accumulated entries. Entries without any path are left out.
    pub fn build(&self) -> Result<EntrypointsManifest> {
        let mut manifest = EntrypointsManifest::default();
        for (name, record) in self.entries.iter().filter(|(_, record)| !record.is_empty()) {
            let entry = Entrypoint {
                js: self.resolve_all(&record.js)?,
                css: self.resolve_all(&record.css)?,
            };
            manifest.entrypoints.insert(name.clone(), entry);
        }

        if !self.integrity.is_empty() {
            let mut integrity = IndexMap::with_capacity(self.integrity.len());
            for (file, digest) in &self.integrity {
                integrity.insert(self.public_path.resolve(file)?, digest.clone());
            }
            manifest.integrity = Some(integrity);
        }

        Ok(manifest)
    }

    /// Registers the dev-server client and every configured build input.
    ///
    /// Each input becomes an entry loading the client followed by the input
    /// itself, and gets a manifest record named after the entry with a `.css`
    /// or `.js` extension.
    pub fn inject_dev_server_entrypoints(&mut self, host: &HostConfig, manifest: &mut ManifestStore) {
        let client = host.server.client.as_str();
        self.add_entry(client, &[client], &[]);

        let Some(input) = &host.build.input else {
            return;
        };
        for (name, file) in input.entries() {
            let basename = Path::new(&file)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.clone());
            let entry = self.add_entry(&name, &[client], &[]);
            let extension = if is_stylesheet(&basename) {
                entry.add_style(file.as_str());
                "css"
            } else {
                entry.add_script(file.as_str());
                "js"
            };
            manifest.add_asset(&format!("{name}.{extension}"), Some(file.as_str()));
            debug!(entry = %name, input = %file, "injected dev-server entrypoint");
        }
    }

    fn resolve_all(&self, paths: &IndexSet<String>) -> Result<Option<Vec<String>>> {
        if paths.is_empty() {
            return Ok(None);
        }
        paths
            .iter()
            .map(|path| self.public_path.resolve(path))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_detection() {
        for name in ["a.css", "a.scss", "dir/a.sass", "a.less", "a.styl", "a.stylus"] {
            assert!(is_stylesheet(name), "{name}");
        }
        for name in ["a.js", "a.ts", "css", "a.css.map"] {
            assert!(!is_stylesheet(name), "{name}");
        }
    }

    #[test]
    fn test_record_deduplicates_paths() {
        let mut record = EntrypointRecord::default();
        record.add_script("a.js").add_script("a.js").add_style("a.css");
        assert_eq!(record.js.len(), 1);
        assert_eq!(record.css.len(), 1);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_serialization_omits_empty_kinds() {
        let manifest = EntrypointsManifest {
            entrypoints: IndexMap::from([(
                "app".to_string(),
                Entrypoint {
                    js: Some(vec!["app.js".into()]),
                    css: None,
                },
            )]),
            integrity: None,
        };
        assert_eq!(
            serde_json::to_value(&manifest).unwrap(),
            serde_json::json!({ "entrypoints": { "app": { "js": ["app.js"] } } })
        );
    }
}
