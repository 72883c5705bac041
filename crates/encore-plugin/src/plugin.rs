//! Lifecycle phase handlers.
//!
//! The host drives the build through these phases, in order:
//!
//! 1. [`EncorePlugin::config`]: contributes the controller bridge alias and inputs.
//! 2. [`EncorePlugin::config_resolved`]: resolves options and creates the [`BuildState`].
//! 3. [`EncorePlugin::transform`]: injects the controller table into the bridge runtime.
//! 4. Either [`EncorePlugin::configure_server`] when serving, or
//!    [`EncorePlugin::generate_bundle`] followed by [`EncorePlugin::write_bundle`]
//!    when building.

use std::path::Path;

use encore_config::{
    ConfigValidator, DEFAULT_MANIFEST_FILE_NAME, HostConfig, InputOption, OptionsResolver,
    ValidatedOptions,
};
use encore_manifest::{ENTRYPOINTS_FILE_NAME, is_stylesheet};
use encore_stimulus::{
    BRIDGE_ALIAS, CONTROLLERS_PLACEHOLDER, Capabilities, ControllerManifest, NodeModulesLocator,
    PackageLocator, StimulusError, generate_controller_table,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::host::{
    BundleContext, BundleFormat, ConfigPatch, ENTRYPOINTS_ENTRY_NAME, EmittedAsset,
    MANIFEST_ENTRY_NAME, OutputChunk, OutputItem, WriteOptions,
};
use crate::state::{BuildState, project_path};
use crate::writer::{render_json, write_json};

/// Controller table used when no controller manifest could be read.
const EMPTY_CONTROLLER_TABLE: &str = "{}";

/// The plugin as registered with the host bundler.
#[derive(Debug, Clone)]
pub struct EncorePlugin {
    options: ValidatedOptions,
    controllers_code: Option<String>,
    capabilities: Option<Capabilities>,
}

impl EncorePlugin {
    pub const NAME: &'static str = "vite-encore-plugin";

    /// Validates raw plugin options. `null` selects every default.
    pub fn new(raw: &Value) -> Result<Self> {
        Ok(Self::from_options(ConfigValidator.validate(raw)?))
    }

    pub fn from_options(options: ValidatedOptions) -> Self {
        Self {
            options,
            controllers_code: None,
            capabilities: None,
        }
    }

    pub fn options(&self) -> &ValidatedOptions {
        &self.options
    }

    /// Generated controller table expression, once `config` ran with the bridge enabled.
    pub fn controllers_code(&self) -> Option<&str> {
        self.controllers_code.as_deref()
    }

    /// `config` phase, resolving controller packages from `node_modules`.
    pub fn config(&mut self, host: &HostConfig) -> Result<Option<ConfigPatch>> {
        let locator = NodeModulesLocator::new(&host.root);
        self.config_with_locator(host, &locator)
    }

    /// `config` phase with a custom package locator.
    ///
    /// Does nothing unless the controller bridge is enabled. Otherwise aliases
    /// the bridge package, generates the controller table from the controller
    /// manifest and adds the manifest's entrypoints as build inputs.
    ///
    /// # Errors
    ///
    /// A missing controller manifest is only an error when its path was given
    /// explicitly. Missing packages or controllers always are.
    pub fn config_with_locator(
        &mut self,
        host: &HostConfig,
        locator: &dyn PackageLocator,
    ) -> Result<Option<ConfigPatch>> {
        let Some(bridge) = self.options.enabled_controller_bridge() else {
            return Ok(None);
        };

        let mut patch = ConfigPatch::default();
        patch
            .aliases
            .insert(BRIDGE_ALIAS.0.to_string(), BRIDGE_ALIAS.1.to_string());

        let path = project_path(&host.root, Path::new(&bridge.controller_json_path));
        if path.is_file() {
            let manifest = ControllerManifest::from_path(&path)?;
            let capabilities = self
                .capabilities
                .get_or_insert_with(|| Capabilities::probe(locator));
            let table = generate_controller_table(&manifest, locator, capabilities)?;
            info!(controllers = table.len(), path = %path.display(), "loaded controller manifest");

            self.controllers_code = Some(table.to_expression());
            patch.input = controller_inputs(&manifest, host);
        } else if bridge.required {
            return Err(StimulusError::MissingManifest { path }.into());
        } else {
            warn!(path = %path.display(), "the controller manifest could not be found");
        }

        self.controllers_code
            .get_or_insert_with(|| EMPTY_CONTROLLER_TABLE.to_string());
        Ok(Some(patch))
    }

    /// `configResolved` phase: fixes the options for this build.
    ///
    /// Static files of the host's public directory are registered in the
    /// manifest under their relative paths.
    pub fn config_resolved(&self, host: &HostConfig) -> Result<BuildState> {
        let options = OptionsResolver::resolve(self.options.clone(), host)?;
        let mut state = BuildState::new(options)?;

        if let Some(public_dir) = &host.public_dir {
            let public_dir = project_path(&host.root, public_dir);
            let seeded = state.manifest.seed_from_directory(&public_dir);
            debug!(files = seeded, dir = %public_dir.display(), "seeded manifest from public directory");
        }

        Ok(state)
    }

    /// `transform` phase: replaces the first controller table placeholder.
    ///
    /// Returns `None` when the code is left untouched.
    pub fn transform(&self, code: &str) -> Option<String> {
        let controllers = self.controllers_code.as_deref()?;
        if !code.contains(CONTROLLERS_PLACEHOLDER) {
            return None;
        }
        debug!("injected controller table");
        Some(code.replacen(CONTROLLERS_PLACEHOLDER, controllers, 1))
    }

    /// `configureServer` phase: writes dev-server artifacts into the output directory.
    ///
    /// Both stores switch to dev-server URLs for the rest of the build.
    pub fn configure_server(&self, state: &mut BuildState) -> Result<()> {
        state.entrypoints.use_dev_server();
        state
            .entrypoints
            .inject_dev_server_entrypoints(&state.options.host, &mut state.manifest);
        state.manifest.use_dev_server();

        let out_dir = state.out_dir();
        write_json(&out_dir.join(ENTRYPOINTS_FILE_NAME), &state.entrypoints.build()?)?;
        write_json(&out_dir.join(DEFAULT_MANIFEST_FILE_NAME), &state.manifest_snapshot()?)?;
        Ok(())
    }

    /// `generateBundle` phase: records every output and emits both artifacts.
    pub fn generate_bundle(
        &self,
        state: &mut BuildState,
        context: &mut dyn BundleContext,
        format: BundleFormat,
        outputs: &[OutputItem],
    ) -> Result<()> {
        for output in outputs {
            match output {
                OutputItem::Chunk(chunk) if chunk.is_entry => record_entry(state, chunk, format),
                other => state.manifest.add_asset(other.file_name(), None),
            }
        }

        let file_name = state.options.manifest.file_name().to_string();
        let manifest = render_json(&file_name, &state.manifest_snapshot()?)?;
        context.emit_file(EmittedAsset {
            name: MANIFEST_ENTRY_NAME.to_string(),
            file_name,
            source: manifest,
        });

        let entrypoints = render_json(ENTRYPOINTS_FILE_NAME, &state.entrypoints.build()?)?;
        let handle = context.emit_file(EmittedAsset {
            name: ENTRYPOINTS_ENTRY_NAME.to_string(),
            file_name: ENTRYPOINTS_FILE_NAME.to_string(),
            source: entrypoints,
        });
        debug!(handle = handle.as_str(), "emitted entrypoints");
        state.entrypoints_handle = Some(handle);
        Ok(())
    }

    /// `writeBundle` phase: digests the written outputs and rewrites the
    /// entrypoints artifact with them.
    ///
    /// Does nothing unless integrity hashes are enabled. Digests are taken
    /// here because output content is only final once written.
    ///
    /// # Errors
    ///
    /// [`Error::IntegrityResolution`] when the output directory or the final
    /// name of the entrypoints artifact is unknown.
    pub fn write_bundle(
        &self,
        state: &mut BuildState,
        context: &dyn BundleContext,
        options: &WriteOptions,
        outputs: &[OutputItem],
    ) -> Result<()> {
        let Some(integrity) = &state.integrity else {
            return Ok(());
        };

        let digested = integrity.apply(
            outputs
                .iter()
                .filter(|output| !output.is_plugin_artifact())
                .map(|output| (output.file_name(), output.bytes())),
            &mut state.entrypoints,
        );
        debug!(files = digested, "computed integrity hashes");

        let dir = options
            .dir
            .as_deref()
            .ok_or_else(|| Error::integrity("the output directory is unknown"))?;
        let handle = state
            .entrypoints_handle
            .as_ref()
            .ok_or_else(|| Error::integrity("the entrypoints file was never emitted"))?;
        let file_name = context.file_name(handle).ok_or_else(|| {
            Error::integrity(format!("the host has no file name for '{}'", handle.as_str()))
        })?;

        write_json(&dir.join(file_name), &state.entrypoints.build()?)
    }
}

/// Records an entry chunk: its script, its styles and their manifest keys.
fn record_entry(state: &mut BuildState, chunk: &OutputChunk, format: BundleFormat) {
    let is_style_entry = chunk
        .facade_module_id
        .as_deref()
        .is_some_and(is_stylesheet);
    let name = if format.is_es() {
        chunk.name.clone()
    } else {
        format!("{}-legacy", chunk.name)
    };

    for (index, css) in chunk.imported_css.iter().enumerate() {
        if is_style_entry && index == 0 {
            state.manifest.add_asset(&format!("{name}.css"), Some(css.as_str()));
        } else {
            state.manifest.add_asset(css, None);
        }
    }

    let scripts: &[String] = if is_style_entry {
        &[]
    } else {
        std::slice::from_ref(&chunk.file_name)
    };
    state.entrypoints.add_entry(&name, scripts, &chunk.imported_css);

    if !is_style_entry {
        state
            .manifest
            .add_asset(&format!("{name}.js"), Some(chunk.file_name.as_str()));
    }
    debug!(entry = %name, style = is_style_entry, "recorded entry chunk");
}

/// Controller manifest entrypoints in the shape of the user's own inputs.
fn controller_inputs(manifest: &ControllerManifest, host: &HostConfig) -> Option<InputOption> {
    if manifest.entrypoints.is_empty() {
        return None;
    }
    let named = host.build.input.as_ref().is_some_and(InputOption::is_named);
    Some(if named {
        InputOption::Named(
            manifest
                .entrypoints
                .iter()
                .map(|entry| (entry.clone(), entry.clone()))
                .collect(),
        )
    } else {
        InputOption::List(manifest.entrypoints.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disabled_bridge_leaves_config_alone() {
        let mut plugin = EncorePlugin::new(&Value::Null).unwrap();
        assert_eq!(plugin.config(&HostConfig::default()).unwrap(), None);
        assert_eq!(plugin.controllers_code(), None);
        assert_eq!(plugin.transform("__VITE_ENCORE_PLUGIN_UX_CONTROLLERS__"), None);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let err = EncorePlugin::new(&json!({ "enableIntegrityHashes": { "enabled": true } }))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if e.has_violation("enableIntegrityHashes.algorithms")));
    }

    #[test]
    fn test_controller_inputs_follow_the_user_shape() {
        let manifest = ControllerManifest {
            entrypoints: vec!["assets/admin.js".into()],
            ..ControllerManifest::default()
        };

        let mut host = HostConfig::default();
        assert_eq!(
            controller_inputs(&manifest, &host),
            Some(InputOption::List(vec!["assets/admin.js".into()]))
        );

        host.build.input = Some(InputOption::Named(
            [("app".to_string(), "assets/app.js".to_string())].into_iter().collect(),
        ));
        assert_eq!(
            controller_inputs(&manifest, &host),
            Some(InputOption::Named(
                [("assets/admin.js".to_string(), "assets/admin.js".to_string())]
                    .into_iter()
                    .collect()
            ))
        );

        assert_eq!(controller_inputs(&ControllerManifest::default(), &host), None);
    }
}
