//! `manifest.json`: logical asset key to built path.

use std::path::Path;

use encore_config::{KeyHashPattern, ResolvedOptions};
use indexmap::IndexMap;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::Result;
use crate::public_path::{OutputMode, PublicPathResolver, join_posix};

/// Rendered manifest, in insertion order.
pub type ManifestSnapshot = IndexMap<String, String>;

/// Accumulates manifest records across the build phases.
///
/// At most one key maps to a given built path: adding an asset whose built path
/// is already recorded under another key removes that key first.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    records: IndexMap<String, String>,
    key_prefix: Option<String>,
    remove_key_hash: Option<KeyHashPattern>,
    seed: IndexMap<String, String>,
    public_path: PublicPathResolver,
}

impl ManifestStore {
    pub fn new(options: &ResolvedOptions) -> Self {
        Self::with_resolver(options, PublicPathResolver::from_options(options))
    }

    pub fn with_resolver(options: &ResolvedOptions, public_path: PublicPathResolver) -> Self {
        Self {
            records: IndexMap::new(),
            key_prefix: options.manifest.key_prefix.clone(),
            remove_key_hash: options.manifest.remove_key_hash.clone(),
            seed: options.manifest.seed.clone(),
            public_path,
        }
    }

    /// Records `key -> path`, or `key -> key` when no built path is given.
    ///
    /// ```
    /// # use encore_config::{HostConfig, OptionsResolver, ValidatedOptions};
    /// # use encore_manifest::ManifestStore;
    /// # let options = OptionsResolver::resolve(ValidatedOptions::default(), &HostConfig {
    /// #     base: String::new(),
    /// #     ..HostConfig::default()
    /// # }).unwrap();
    /// let mut manifest = ManifestStore::new(&options);
    /// manifest.add_asset("a.js", Some("a.abc123.js"));
    /// manifest.add_asset("b.js", Some("a.abc123.js"));
    ///
    /// let snapshot = manifest.build().unwrap();
    /// assert_eq!(snapshot.len(), 1);
    /// assert_eq!(snapshot["b.js"], "a.abc123.js");
    /// ```
    pub fn add_asset(&mut self, key: &str, path: Option<&str>) {
        if let Some(path) = path {
            let before = self.records.len();
            self.records.retain(|_, value| value.as_str() != path);
            if self.records.len() != before {
                debug!(key, path, "replacing manifest record with the same built path");
            }
        }

        // An existing key keeps its position.
        self.records
            .insert(key.to_string(), path.unwrap_or(key).to_string());
    }

    /// Registers every regular file below `root` under its relative path.
    ///
    /// Unreadable entries are skipped. Returns the number of files registered.
    pub fn seed_from_directory(&mut self, root: &Path) -> usize {
        let mut added = 0;
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let key = relative.trim_start_matches('/').to_string();
            trace!(file = %relative, "seeding manifest from static directory");
            self.records.insert(key, relative);
            added += 1;
        }

        debug!(root = %root.display(), files = added, "seeded manifest");
        added
    }

    /// Switches resolution of built paths to the dev-server origin. There is no way back.
    pub fn use_dev_server(&mut self) {
        self.public_path = self.public_path.clone().with_mode(OutputMode::DevServer);
    }

    pub fn is_dev_server(&self) -> bool {
        self.public_path.mode() == OutputMode::DevServer
    }

    /// Renders the accumulated records.
    ///
    /// Keys get the key prefix and lose their content hash. Values are resolved
    /// to public paths.
    pub fn build(&self) -> Result<ManifestSnapshot> {
        let mut snapshot = IndexMap::with_capacity(self.records.len());
        for (key, value) in &self.records {
            snapshot.insert(self.output_key(key), self.public_path.resolve(value)?);
        }
        Ok(snapshot)
    }

    /// [`build`](Self::build) merged over the configured seed. Built records
    /// win on key collisions.
    pub fn build_with_seed(&self) -> Result<ManifestSnapshot> {
        let mut merged = self.seed.clone();
        merged.extend(self.build()?);
        Ok(merged)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw records before prefixing and path resolution.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn output_key(&self, key: &str) -> String {
        let key = match &self.key_prefix {
            Some(prefix) => join_posix(prefix, key)
                .trim_start_matches('/')
                .to_string(),
            None => key.to_string(),
        };
        match &self.remove_key_hash {
            Some(pattern) => pattern.strip(&key).into_owned(),
            None => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_config::{HostConfig, OptionsResolver, ValidatedOptions};

    fn store() -> ManifestStore {
        let host = HostConfig {
            base: String::new(),
            ..HostConfig::default()
        };
        let options = OptionsResolver::resolve(ValidatedOptions::default(), &host).unwrap();
        ManifestStore::new(&options)
    }

    #[test]
    fn test_key_without_path_maps_to_itself() {
        let mut manifest = store();
        manifest.add_asset("a.js", Some("a.js"));
        manifest.add_asset("a.js", None);
        manifest.add_asset("b.js", None);
        assert_eq!(manifest.get("a.js"), Some("a.js"));
        assert_eq!(manifest.get("b.js"), Some("b.js"));
    }

    #[test]
    fn test_existing_key_keeps_position() {
        let mut manifest = store();
        manifest.add_asset("a.js", Some("a.1.js"));
        manifest.add_asset("b.js", Some("b.1.js"));
        manifest.add_asset("a.js", Some("a.2.js"));
        let keys: Vec<_> = manifest.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a.js", "b.js"]);
    }

    #[test]
    fn test_reinserted_value_moves_to_end() {
        let mut manifest = store();
        manifest.add_asset("a.js", Some("shared.js"));
        manifest.add_asset("b.js", Some("b.js"));
        manifest.add_asset("c.js", Some("shared.js"));
        let keys: Vec<_> = manifest.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b.js", "c.js"]);
    }

    #[test]
    fn test_dev_server_switch_is_one_way() {
        let mut manifest = store();
        assert!(!manifest.is_dev_server());
        manifest.use_dev_server();
        manifest.use_dev_server();
        assert!(manifest.is_dev_server());
    }
}
