//! Validation of untyped plugin options.
//!
//! Validation runs in two stages. The shape stage checks types field by field
//! and keeps shorthands as written; the initialize stage expands shorthands,
//! applies defaults and checks the rules that depend on a value rather than its
//! type. Every violation found is reported together, never just the first.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{ValidationError, Violation};
use crate::options::{
    ControllerBridgeOptions, IntegrityHashes, KeyHashPattern, ManifestOptions, ValidatedOptions,
    is_absolute_url,
};

/// Validates raw plugin options.
///
/// # Example
///
/// ```
/// use encore_config::ConfigValidator;
/// use serde_json::json;
///
/// let options = ConfigValidator
///     .validate(&json!({ "enableStimulusBridge": true }))
///     .unwrap();
/// let bridge = options.enabled_controller_bridge().unwrap();
/// assert_eq!(bridge.controller_json_path, "assets/controllers.json");
///
/// let err = ConfigValidator
///     .validate(&json!({ "manifestOptions": { "keyPrefix": "https://cdn.example.com/" } }))
///     .unwrap_err();
/// assert_eq!(err.field(), Some("manifestOptions.keyPrefix"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(&self, raw: &Value) -> Result<ValidatedOptions, ValidationError> {
        let mut violations = Vec::new();
        let parsed = parse_shape(raw, &mut violations);
        if !violations.is_empty() {
            return Err(ValidationError::new(violations, raw.clone()));
        }

        let validated = initialize(parsed, &mut violations);
        if !violations.is_empty() {
            return Err(ValidationError::new(violations, raw.clone()));
        }

        Ok(validated)
    }
}

/// Shorthand for `ConfigValidator.validate(raw)`.
pub fn validate_options(raw: &Value) -> Result<ValidatedOptions, ValidationError> {
    ConfigValidator.validate(raw)
}

/// A field that accepts either `true`/`false` or a detailed object.
#[derive(Debug)]
enum Toggle<T> {
    Flag(bool),
    Detailed(T),
}

#[derive(Debug)]
struct RawIntegrity {
    enabled: bool,
    algorithms: Vec<String>,
}

#[derive(Debug)]
struct RawBridge {
    enabled: bool,
    controller_json_path: String,
}

#[derive(Debug)]
enum RawKeyHash {
    Flag(bool),
    Pattern(String),
}

#[derive(Debug, Default)]
struct RawManifest {
    file_name: Option<String>,
    key_prefix: Option<String>,
    seed: Option<IndexMap<String, String>>,
    remove_key_hash: Option<RawKeyHash>,
}

#[derive(Debug, Default)]
struct ParsedOptions {
    integrity_hashes: Option<Toggle<RawIntegrity>>,
    controller_bridge: Option<Toggle<RawBridge>>,
    manifest: RawManifest,
}

/// `None` for absent and `null` fields.
fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|value| !value.is_null())
}

fn parse_shape(raw: &Value, violations: &mut Vec<Violation>) -> ParsedOptions {
    let mut parsed = ParsedOptions::default();
    let object = match raw {
        Value::Null => return parsed,
        Value::Object(object) => object,
        _ => {
            violations.push(Violation::new("options", "must be an object"));
            return parsed;
        }
    };

    parsed.integrity_hashes = field(object, "enableIntegrityHashes")
        .and_then(|value| parse_integrity(value, violations));
    parsed.controller_bridge = field(object, "enableStimulusBridge")
        .and_then(|value| parse_bridge(value, violations));
    if let Some(value) = field(object, "manifestOptions") {
        parsed.manifest = parse_manifest(value, violations);
    }

    parsed
}

fn parse_integrity(value: &Value, violations: &mut Vec<Violation>) -> Option<Toggle<RawIntegrity>> {
    let object = match value {
        Value::Bool(flag) => return Some(Toggle::Flag(*flag)),
        Value::Object(object) => object,
        _ => {
            violations.push(Violation::new(
                "enableIntegrityHashes",
                "must be a boolean or an object",
            ));
            return None;
        }
    };

    let enabled = match object.get("enabled") {
        Some(Value::Bool(enabled)) => Some(*enabled),
        _ => {
            violations.push(Violation::new(
                "enableIntegrityHashes.enabled",
                "must be a boolean",
            ));
            None
        }
    };

    let algorithms = match field(object, "algorithms") {
        None => {
            violations.push(Violation::new("enableIntegrityHashes.algorithms", "is missing"));
            None
        }
        Some(Value::Array(items)) => {
            let algorithms: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect();
            if algorithms.is_none() {
                violations.push(Violation::new(
                    "enableIntegrityHashes.algorithms",
                    "must be an array of strings",
                ));
            }
            algorithms
        }
        Some(_) => {
            violations.push(Violation::new(
                "enableIntegrityHashes.algorithms",
                "must be an array",
            ));
            None
        }
    };

    Some(Toggle::Detailed(RawIntegrity {
        enabled: enabled?,
        algorithms: algorithms?,
    }))
}

fn parse_bridge(value: &Value, violations: &mut Vec<Violation>) -> Option<Toggle<RawBridge>> {
    let object = match value {
        Value::Bool(flag) => return Some(Toggle::Flag(*flag)),
        Value::Object(object) => object,
        _ => {
            violations.push(Violation::new(
                "enableStimulusBridge",
                "must be a boolean or an object",
            ));
            return None;
        }
    };

    let enabled = match object.get("enabled") {
        Some(Value::Bool(enabled)) => Some(*enabled),
        _ => {
            violations.push(Violation::new(
                "enableStimulusBridge.enabled",
                "must be a boolean",
            ));
            None
        }
    };

    let controller_json_path = match object.get("controllerJsonPath") {
        Some(Value::String(path)) => Some(path.clone()),
        _ => {
            violations.push(Violation::new(
                "enableStimulusBridge.controllerJsonPath",
                "must be a string",
            ));
            None
        }
    };

    Some(Toggle::Detailed(RawBridge {
        enabled: enabled?,
        controller_json_path: controller_json_path?,
    }))
}

fn parse_manifest(value: &Value, violations: &mut Vec<Violation>) -> RawManifest {
    let mut manifest = RawManifest::default();
    let Value::Object(object) = value else {
        violations.push(Violation::new("manifestOptions", "must be an object"));
        return manifest;
    };

    match field(object, "fileName") {
        None => {}
        Some(Value::String(name)) => manifest.file_name = Some(name.clone()),
        Some(_) => violations.push(Violation::new("manifestOptions.fileName", "must be a string")),
    }

    match field(object, "seed") {
        None => {}
        Some(Value::Object(entries)) => {
            let mut seed = IndexMap::with_capacity(entries.len());
            let mut all_strings = true;
            for (key, value) in entries {
                match value {
                    Value::String(path) => {
                        seed.insert(key.clone(), path.clone());
                    }
                    _ => all_strings = false,
                }
            }
            if all_strings {
                manifest.seed = Some(seed);
            } else {
                violations.push(Violation::new(
                    "manifestOptions.seed",
                    "must be an object of strings",
                ));
            }
        }
        Some(_) => violations.push(Violation::new("manifestOptions.seed", "must be an object")),
    }

    match field(object, "keyPrefix") {
        None => {}
        Some(Value::String(prefix)) if is_absolute_url(prefix) => violations.push(
            Violation::new("manifestOptions.keyPrefix", "cannot be an absolute URL"),
        ),
        Some(Value::String(prefix)) => manifest.key_prefix = Some(prefix.clone()),
        Some(_) => violations.push(Violation::new("manifestOptions.keyPrefix", "must be a string")),
    }

    match field(object, "removeKeyHash") {
        None => {}
        Some(Value::Bool(flag)) => manifest.remove_key_hash = Some(RawKeyHash::Flag(*flag)),
        Some(Value::String(pattern)) => {
            manifest.remove_key_hash = Some(RawKeyHash::Pattern(pattern.clone()))
        }
        Some(_) => violations.push(Violation::new(
            "manifestOptions.removeKeyHash",
            "must be a boolean or a regular expression",
        )),
    }

    manifest
}

fn initialize(parsed: ParsedOptions, violations: &mut Vec<Violation>) -> ValidatedOptions {
    let integrity_hashes = match parsed.integrity_hashes {
        None => None,
        Some(Toggle::Flag(enabled)) => Some(IntegrityHashes::from_enabled(enabled)),
        Some(Toggle::Detailed(raw)) => {
            if raw.algorithms.is_empty() {
                violations.push(Violation::new(
                    "enableIntegrityHashes.algorithms",
                    "must provide at least one algorithm",
                ));
                None
            } else {
                Some(IntegrityHashes {
                    enabled: raw.enabled,
                    algorithms: raw.algorithms,
                })
            }
        }
    };

    let controller_bridge = match parsed.controller_bridge {
        None => None,
        Some(Toggle::Flag(enabled)) => Some(ControllerBridgeOptions::from_enabled(enabled)),
        Some(Toggle::Detailed(raw)) => {
            if raw.controller_json_path.ends_with(".json") {
                Some(ControllerBridgeOptions {
                    enabled: raw.enabled,
                    controller_json_path: raw.controller_json_path,
                    required: true,
                })
            } else {
                violations.push(Violation::new(
                    "enableStimulusBridge.controllerJsonPath",
                    "must be a path to a JSON file",
                ));
                None
            }
        }
    };

    let raw = parsed.manifest;
    let mut manifest = ManifestOptions {
        // Empty strings count as unset.
        file_name: raw.file_name.filter(|name| !name.is_empty()),
        key_prefix: raw.key_prefix.filter(|prefix| !prefix.is_empty()),
        seed: raw.seed.unwrap_or_default(),
        ..ManifestOptions::default()
    };
    match raw.remove_key_hash {
        None | Some(RawKeyHash::Flag(true)) => {}
        Some(RawKeyHash::Flag(false)) => manifest.remove_key_hash = None,
        Some(RawKeyHash::Pattern(pattern)) => match KeyHashPattern::new(&pattern) {
            Ok(pattern) => manifest.remove_key_hash = Some(pattern),
            Err(err) => violations.push(Violation::new(
                "manifestOptions.removeKeyHash",
                format!("is not a valid regular expression: {err}"),
            )),
        },
    }

    ValidatedOptions {
        integrity_hashes,
        controller_bridge,
        manifest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_means_defaults() {
        let options = ConfigValidator.validate(&Value::Null).unwrap();
        assert_eq!(options, ValidatedOptions::default());
    }

    #[test]
    fn test_collects_every_violation() {
        let err = ConfigValidator
            .validate(&json!({
                "enableIntegrityHashes": { "enabled": "yes", "algorithms": "sha256" },
                "manifestOptions": { "seed": { "a.js": 1 } }
            }))
            .unwrap_err();
        assert_eq!(err.violations.len(), 3);
        assert!(err.has_violation("enableIntegrityHashes.enabled"));
        assert!(err.has_violation("enableIntegrityHashes.algorithms"));
        assert!(err.has_violation("manifestOptions.seed"));
    }

    #[test]
    fn test_shape_errors_skip_the_initialize_stage() {
        // The empty list would be reported by the initialize stage, but the
        // bridge shape error stops validation first.
        let err = ConfigValidator
            .validate(&json!({
                "enableIntegrityHashes": { "enabled": true, "algorithms": [] },
                "enableStimulusBridge": 3
            }))
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.field(), Some("enableStimulusBridge"));
    }

    #[test]
    fn test_empty_strings_count_as_unset() {
        let options = ConfigValidator
            .validate(&json!({ "manifestOptions": { "fileName": "", "keyPrefix": "" } }))
            .unwrap();
        assert!(options.manifest.file_name.is_none());
        assert!(options.manifest.key_prefix.is_none());
        assert_eq!(options.manifest.file_name(), "manifest.json");
    }
}
