//! Encore-compatible build artifacts for a modern bundler.
//!
//! [`EncorePlugin`] hooks into the host bundler's lifecycle and produces the
//! two files server-side template layers read:
//!
//! - `manifest.json`: logical asset path to built path.
//! - `entrypoints.json`: scripts and styles of every entry, optionally with
//!   subresource-integrity digests.
//!
//! The host owns the lifecycle. It reports its configuration and bundle
//! outputs through the types in [`host`] and offers emission services through
//! [`BundleContext`].
//!
//! ```
//! use encore_plugin::{EncorePlugin, HostConfig};
//! use serde_json::json;
//!
//! let mut plugin = EncorePlugin::new(&json!({ "enableIntegrityHashes": true })).unwrap();
//! let host = HostConfig { base: "/build/".into(), ..HostConfig::default() };
//!
//! assert!(plugin.config(&host).unwrap().is_none());
//! let state = plugin.config_resolved(&host).unwrap();
//! assert_eq!(state.options().manifest.key_prefix.as_deref(), Some("build/"));
//! ```
//!
//! With the `logging` feature, [`logging`] installs a `tracing` subscriber.

pub mod error;
pub mod host;
#[cfg(feature = "logging")]
pub mod logging;
pub mod plugin;
#[cfg(feature = "rolldown-integration")]
pub mod rolldown;
pub mod state;
pub mod writer;

pub use encore_config::{HostConfig, InputOption, ResolvedOptions, ValidatedOptions};
pub use error::{Error, Result};
pub use host::{
    BundleContext, BundleFormat, ConfigPatch, ENTRYPOINTS_ENTRY_NAME, EmittedAsset, FileHandle,
    MANIFEST_ENTRY_NAME, OutputAsset, OutputChunk, OutputItem, WriteOptions,
};
pub use plugin::EncorePlugin;
pub use state::BuildState;
