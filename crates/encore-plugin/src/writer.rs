//! JSON artifact rendering and writing.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

/// Pretty JSON with two-space indentation. `name` only labels errors.
pub fn render_json<T: Serialize>(name: &str, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| Error::json(name, source))
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value).map_err(|source| Error::json(path, source))?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
    }
    fs::write(path, contents).map_err(|source| Error::io(path, source))?;
    info!(path = %path.display(), "wrote artifact");
    Ok(())
}
