//! What the host bundler hands to the plugin, and what it offers back.

use encore_config::InputOption;
use indexmap::IndexMap;
use std::path::PathBuf;

/// Name under which the manifest artifact is emitted.
pub const MANIFEST_ENTRY_NAME: &str = "virtual:vite-encore-plugin/manifest";

/// Name under which the entrypoints artifact is emitted.
pub const ENTRYPOINTS_ENTRY_NAME: &str = "virtual:vite-encore-plugin/entrypoints";

/// Output format of the bundle being generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BundleFormat {
    #[default]
    Es,
    Cjs,
    Iife,
    Umd,
    System,
}

impl BundleFormat {
    pub fn is_es(self) -> bool {
        matches!(self, BundleFormat::Es)
    }
}

/// A code chunk of the generated bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputChunk {
    pub name: String,
    pub file_name: String,
    pub is_entry: bool,
    /// Module the entry chunk was created for.
    pub facade_module_id: Option<String>,
    /// Style files emitted for this chunk, in import order.
    pub imported_css: Vec<String>,
    pub code: String,
}

/// A non-code file of the generated bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputAsset {
    pub name: Option<String>,
    pub file_name: String,
    pub source: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputItem {
    Chunk(OutputChunk),
    Asset(OutputAsset),
}

impl OutputItem {
    pub fn name(&self) -> Option<&str> {
        match self {
            OutputItem::Chunk(chunk) => Some(chunk.name.as_str()),
            OutputItem::Asset(asset) => asset.name.as_deref(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            OutputItem::Chunk(chunk) => &chunk.file_name,
            OutputItem::Asset(asset) => &asset.file_name,
        }
    }

    /// The exact bytes written to disk.
    pub fn bytes(&self) -> &[u8] {
        match self {
            OutputItem::Chunk(chunk) => chunk.code.as_bytes(),
            OutputItem::Asset(asset) => &asset.source,
        }
    }

    /// Whether this is one of the artifacts the plugin emits itself.
    pub fn is_plugin_artifact(&self) -> bool {
        matches!(self.name(), Some(MANIFEST_ENTRY_NAME | ENTRYPOINTS_ENTRY_NAME))
    }
}

/// An asset the plugin asks the host to add to the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub name: String,
    pub file_name: String,
    pub source: String,
}

/// Opaque reference to an emitted asset, issued by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle(String);

impl FileHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Services the host offers while a bundle is generated and written.
pub trait BundleContext {
    /// Adds an asset to the bundle.
    fn emit_file(&mut self, asset: EmittedAsset) -> FileHandle;

    /// Final file name of a previously emitted asset, relative to the output directory.
    fn file_name(&self, handle: &FileHandle) -> Option<String>;
}

/// Options of the write that just finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub dir: Option<PathBuf>,
}

/// Additions to the host configuration requested during the `config` phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// Module specifier to replacement.
    pub aliases: IndexMap<String, String>,
    /// Extra build inputs.
    pub input: Option<InputOption>,
}
