//! Build artifacts consumed by server-side template layers.
//!
//! Two stores accumulate records while the host bundler runs:
//!
//! - [`ManifestStore`] maps logical asset keys to built paths and renders
//!   `manifest.json`.
//! - [`EntrypointsStore`] collects the scripts and styles of every entry and
//!   renders `entrypoints.json`, optionally with subresource-integrity digests
//!   produced by [`IntegrityComputer`].
//!
//! Both stores resolve the paths they emit through a [`PublicPathResolver`],
//! either against the static public base or, once switched to dev-server mode,
//! against the dev-server origin.

pub mod entrypoints;
pub mod error;
pub mod integrity;
pub mod manifest;
pub mod public_path;

pub use entrypoints::{
    Entrypoint, EntrypointRecord, EntrypointsManifest, EntrypointsStore, is_stylesheet,
};
pub use error::{ManifestError, Result};
pub use integrity::{HashAlgorithm, IntegrityComputer};
pub use manifest::{ManifestSnapshot, ManifestStore};
pub use public_path::{OutputMode, PublicPathResolver, join_posix};

/// File name of the entrypoints artifact.
pub const ENTRYPOINTS_FILE_NAME: &str = "entrypoints.json";
