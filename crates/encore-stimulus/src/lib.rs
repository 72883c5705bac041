//! Stimulus controller support.
//!
//! Build side: a controller manifest (`assets/controllers.json`) names
//! controllers shipped by installed packages. [`parse_controller_manifest`]
//! reads it, [`generate_controller_table`] looks every controller up in its
//! package descriptor and renders the table module the browser bridge imports.
//!
//! Runtime side: [`bridge::Application`] registers controllers under
//! normalized identifiers, eagerly, lazily on first activation, or from an
//! external table.

pub mod bridge;
pub mod capabilities;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod normalize;
pub mod package;

pub use bridge::{
    Activation, Application, BridgeOptions, ContextEntry, ExternalController, ImportError,
    Importer, LoaderKind, importer, start_app,
};
pub use capabilities::{Capabilities, Capability};
pub use error::{BridgeError, Result, StimulusError};
pub use generator::{ControllerSpec, ControllerTable, generate_controller_table};
pub use manifest::{
    ControllerInfo, ControllerManifest, FetchMode, PackageControllerInfo,
    parse_controller_manifest,
};
pub use normalize::normalize_identifier;
pub use package::{NodeModulesLocator, PackageLocator};

/// Placeholder in the bridge runtime replaced by the generated controller table.
pub const CONTROLLERS_PLACEHOLDER: &str = "__VITE_ENCORE_PLUGIN_UX_CONTROLLERS__";

/// Module alias pointing the bridge package at the plugin's own runtime.
pub const BRIDGE_ALIAS: (&str, &str) = (
    "@symfony/stimulus-bridge",
    "vite-encore-plugin/stimulus-bridge",
);
