//! Controller manifest (`controllers.json`) and package descriptor types.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StimulusError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Eager,
    Lazy,
}

/// User settings for one controller of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Unset defers to the package, which defaults to eager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoimport: Option<IndexMap<String, bool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerManifest {
    /// Package name to controller name to settings.
    #[serde(default)]
    pub controllers: IndexMap<String, IndexMap<String, ControllerInfo>>,

    /// Extra build inputs requested by the packages.
    #[serde(default)]
    pub entrypoints: Vec<String>,
}

impl ControllerManifest {
    /// Reads and parses a manifest file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| StimulusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Value = serde_json::from_str(&source).map_err(|source| StimulusError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        parse_controller_manifest(&raw)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// One controller as described by its package's `package.json`, under
/// `symfony.controllers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageControllerInfo {
    pub main: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    #[serde(default)]
    pub fetch: FetchMode,
}

impl ControllerInfo {
    /// Fetch mode of the controller given the package's own setting.
    pub fn effective_fetch(&self, package: FetchMode) -> FetchMode {
        self.fetch.unwrap_or(package)
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Validates an untyped controller manifest.
///
/// ```
/// use encore_stimulus::{FetchMode, parse_controller_manifest};
/// use serde_json::json;
///
/// let manifest = parse_controller_manifest(&json!({
///     "controllers": {
///         "@symfony/ux-chartjs": { "chart": { "enabled": true, "fetch": "lazy" } }
///     },
///     "entrypoints": []
/// }))
/// .unwrap();
/// let chart = &manifest.controllers["@symfony/ux-chartjs"]["chart"];
/// assert_eq!(chart.fetch, Some(FetchMode::Lazy));
/// ```
pub fn parse_controller_manifest(raw: &Value) -> Result<ControllerManifest> {
    let object = expect_object("manifest", raw)?;
    let mut manifest = ControllerManifest::default();

    match object.get("entrypoints") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for item in items {
                let Value::String(entry) = item else {
                    return Err(StimulusError::invalid(
                        "entrypoints",
                        "must be an array of strings",
                    ));
                };
                manifest.entrypoints.push(entry.clone());
            }
        }
        Some(_) => {
            return Err(StimulusError::invalid(
                "entrypoints",
                "must be an array of strings",
            ));
        }
    }

    if let Some(controllers) = object.get("controllers").filter(|value| !value.is_null()) {
        for (package, controllers) in expect_object("controllers", controllers)? {
            let path = format!("controllers.{package}");
            let mut parsed = IndexMap::new();
            for (controller, info) in expect_object(&path, controllers)? {
                let path = format!("{path}.{controller}");
                parsed.insert(controller.clone(), parse_controller_info(&path, info)?);
            }
            manifest.controllers.insert(package.clone(), parsed);
        }
    }

    Ok(manifest)
}

fn parse_controller_info(path: &str, raw: &Value) -> Result<ControllerInfo> {
    let object = expect_object(path, raw)?;
    let mut info = ControllerInfo::default();

    match object.get("enabled") {
        None => {}
        Some(Value::Bool(enabled)) => info.enabled = Some(*enabled),
        Some(_) => return Err(StimulusError::invalid(format!("{path}.enabled"), "must be a boolean")),
    }

    match object.get("fetch") {
        None => {}
        Some(Value::String(fetch)) => {
            info.fetch = match fetch.as_str() {
                "eager" => Some(FetchMode::Eager),
                "lazy" => Some(FetchMode::Lazy),
                _ => {
                    return Err(StimulusError::invalid(
                        format!("{path}.fetch"),
                        "must be 'eager' or 'lazy'",
                    ));
                }
            }
        }
        Some(_) => return Err(StimulusError::invalid(format!("{path}.fetch"), "must be a string")),
    }

    match object.get("name") {
        None => {}
        Some(Value::String(name)) if name.is_empty() => {
            return Err(StimulusError::invalid(
                format!("{path}.name"),
                "must be a non-empty string",
            ));
        }
        Some(Value::String(name)) => info.name = Some(name.clone()),
        Some(_) => return Err(StimulusError::invalid(format!("{path}.name"), "must be a string")),
    }

    if let Some(autoimport) = object.get("autoimport") {
        let autoimport_path = format!("{path}.autoimport");
        let mut parsed = IndexMap::new();
        for (file, enabled) in expect_object(&autoimport_path, autoimport)? {
            let Value::Bool(enabled) = enabled else {
                return Err(StimulusError::invalid(
                    format!("{autoimport_path}.{file}"),
                    "must be a boolean",
                ));
            };
            parsed.insert(file.clone(), *enabled);
        }
        info.autoimport = Some(parsed);
    }

    Ok(info)
}

fn expect_object<'a>(path: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| StimulusError::invalid(path, "must be an object"))
}
