//! Per-build state threaded through the lifecycle phases.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use encore_config::ResolvedOptions;
use encore_manifest::{EntrypointsStore, IntegrityComputer, ManifestSnapshot, ManifestStore};

use crate::error::Result;
use crate::host::FileHandle;

/// Everything one build accumulates.
///
/// Created by [`EncorePlugin::config_resolved`](crate::EncorePlugin::config_resolved)
/// once the host configuration is final, then passed to every later phase and
/// dropped when the build ends.
#[derive(Debug)]
pub struct BuildState {
    pub(crate) options: Arc<ResolvedOptions>,
    pub(crate) manifest: ManifestStore,
    pub(crate) entrypoints: EntrypointsStore,
    pub(crate) integrity: Option<IntegrityComputer>,
    pub(crate) entrypoints_handle: Option<FileHandle>,
}

impl BuildState {
    pub(crate) fn new(options: ResolvedOptions) -> Result<Self> {
        let integrity = options
            .enabled_integrity_algorithms()
            .map(IntegrityComputer::new)
            .transpose()?;
        Ok(Self {
            manifest: ManifestStore::new(&options),
            entrypoints: EntrypointsStore::new(&options),
            options: Arc::new(options),
            integrity,
            entrypoints_handle: None,
        })
    }

    pub fn options(&self) -> &Arc<ResolvedOptions> {
        &self.options
    }

    pub fn manifest(&self) -> &ManifestStore {
        &self.manifest
    }

    pub fn entrypoints(&self) -> &EntrypointsStore {
        &self.entrypoints
    }

    /// Handle of the emitted entrypoints artifact, once the bundle was generated.
    pub fn entrypoints_handle(&self) -> Option<&FileHandle> {
        self.entrypoints_handle.as_ref()
    }

    /// Manifest records with the configured seed merged underneath.
    pub fn manifest_snapshot(&self) -> Result<ManifestSnapshot> {
        Ok(self.manifest.build_with_seed()?)
    }

    /// Output directory, relative paths taken from the project root.
    pub fn out_dir(&self) -> PathBuf {
        project_path(&self.options.host.root, &self.options.host.build.out_dir)
    }
}

pub(crate) fn project_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
