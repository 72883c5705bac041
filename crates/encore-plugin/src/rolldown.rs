//! Conversions from rolldown bundle outputs.
//!
//! Only available with the `rolldown-integration` feature.

use rolldown_common::Output;

use crate::host::{OutputAsset, OutputChunk, OutputItem};

impl From<&rolldown_common::OutputChunk> for OutputChunk {
    fn from(chunk: &rolldown_common::OutputChunk) -> Self {
        Self {
            name: chunk.name.to_string(),
            file_name: chunk.filename.to_string(),
            is_entry: chunk.is_entry,
            facade_module_id: chunk.facade_module_id.as_ref().map(|id| id.to_string()),
            // rolldown lists emitted stylesheets among the chunk imports
            imported_css: chunk
                .imports
                .iter()
                .filter(|file| file.ends_with(".css"))
                .map(|file| file.to_string())
                .collect(),
            code: chunk.code.clone(),
        }
    }
}

impl From<&rolldown_common::OutputAsset> for OutputAsset {
    fn from(asset: &rolldown_common::OutputAsset) -> Self {
        Self {
            name: asset.names.first().cloned(),
            file_name: asset.filename.to_string(),
            source: asset.source.as_bytes().to_vec(),
        }
    }
}

impl From<&Output> for OutputItem {
    fn from(output: &Output) -> Self {
        match output {
            Output::Chunk(chunk) => OutputItem::Chunk(OutputChunk::from(chunk.as_ref())),
            Output::Asset(asset) => OutputItem::Asset(OutputAsset::from(asset.as_ref())),
        }
    }
}

/// Converts a whole rolldown bundle, keeping its order.
pub fn outputs_from_rolldown(outputs: &[Output]) -> Vec<OutputItem> {
    outputs.iter().map(OutputItem::from).collect()
}
