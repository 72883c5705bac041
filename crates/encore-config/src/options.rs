//! Validated option types and their defaults.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;

/// Digest algorithm used when integrity hashes are enabled by shorthand.
pub const DEFAULT_INTEGRITY_ALGORITHM: &str = "sha384";

/// Controller manifest used when the bridge is enabled by shorthand.
pub const DEFAULT_CONTROLLERS_JSON: &str = "assets/controllers.json";

pub const DEFAULT_MANIFEST_FILE_NAME: &str = "manifest.json";

/// Matches an 8 hex digit hash right before the extension, e.g. `app-a1b2c3d4.js`.
pub const DEFAULT_KEY_HASH_PATTERN: &str = r"(?m)(-[a-f0-9]{8})(?:\.min)?\.\w+$";

/// `true` for `http://` and `https://` URLs.
pub fn is_absolute_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityHashes {
    pub enabled: bool,
    /// Never empty; order is the order tokens appear in the digest string.
    pub algorithms: Vec<String>,
}

impl IntegrityHashes {
    pub fn from_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            algorithms: vec![DEFAULT_INTEGRITY_ALGORITHM.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerBridgeOptions {
    pub enabled: bool,
    pub controller_json_path: String,
    /// Set when the manifest path was given explicitly. A missing manifest is
    /// then fatal instead of a warning.
    pub required: bool,
}

impl ControllerBridgeOptions {
    pub fn from_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            controller_json_path: DEFAULT_CONTROLLERS_JSON.to_string(),
            required: false,
        }
    }
}

/// Regular expression stripping content hashes from manifest keys.
#[derive(Debug, Clone)]
pub struct KeyHashPattern(Regex);

impl KeyHashPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Removes the hash from `key`.
    ///
    /// When the pattern captures a group, the group text is cut out of the
    /// match together with a `.min` directly following it, and the rest of the
    /// match (usually the extension) is kept. A pattern without a group
    /// removes the whole match.
    ///
    /// ```
    /// use encore_config::KeyHashPattern;
    ///
    /// let pattern = KeyHashPattern::default();
    /// assert_eq!(pattern.strip("build/app-a1b2c3d4.js"), "build/app.js");
    /// assert_eq!(pattern.strip("vendor-0123abcd.min.js"), "vendor.js");
    /// assert_eq!(pattern.strip("app.js"), "app.js");
    /// ```
    pub fn strip<'a>(&self, key: &'a str) -> Cow<'a, str> {
        let Some(captures) = self.0.captures(key) else {
            return Cow::Borrowed(key);
        };
        let Some(whole) = captures.get(0).filter(|m| !m.as_str().is_empty()) else {
            return Cow::Borrowed(key);
        };

        let replacement = match captures.get(1).filter(|m| !m.as_str().is_empty()) {
            Some(hash) => {
                let before = &key[whole.start()..hash.start()];
                let after = &key[hash.end()..whole.end()];
                let after = after
                    .strip_prefix(".min")
                    .filter(|rest| rest.starts_with('.'))
                    .unwrap_or(after);
                format!("{before}{after}")
            }
            None => String::new(),
        };

        Cow::Owned(format!(
            "{}{}{}",
            &key[..whole.start()],
            replacement,
            &key[whole.end()..]
        ))
    }
}

impl Default for KeyHashPattern {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_KEY_HASH_PATTERN).expect("valid default key hash pattern"))
    }
}

impl PartialEq for KeyHashPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for KeyHashPattern {}

impl fmt::Display for KeyHashPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOptions {
    pub file_name: Option<String>,
    /// Relative prefix joined in front of every manifest key. Never an absolute URL.
    pub key_prefix: Option<String>,
    /// Extra records merged under the built manifest.
    pub seed: IndexMap<String, String>,
    /// `None` disables hash removal.
    pub remove_key_hash: Option<KeyHashPattern>,
}

impl ManifestOptions {
    pub fn file_name(&self) -> &str {
        self.file_name
            .as_deref()
            .unwrap_or(DEFAULT_MANIFEST_FILE_NAME)
    }
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            key_prefix: None,
            seed: IndexMap::new(),
            remove_key_hash: Some(KeyHashPattern::default()),
        }
    }
}

/// Plugin options after validation and shorthand expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedOptions {
    pub integrity_hashes: Option<IntegrityHashes>,
    pub controller_bridge: Option<ControllerBridgeOptions>,
    pub manifest: ManifestOptions,
}

impl ValidatedOptions {
    /// Algorithms to digest with, if integrity hashes are switched on.
    pub fn enabled_integrity_algorithms(&self) -> Option<&[String]> {
        self.integrity_hashes
            .as_ref()
            .filter(|hashes| hashes.enabled)
            .map(|hashes| hashes.algorithms.as_slice())
    }

    /// The controller bridge settings, if the bridge is switched on.
    pub fn enabled_controller_bridge(&self) -> Option<&ControllerBridgeOptions> {
        self.controller_bridge.as_ref().filter(|bridge| bridge.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_absolute_urls() {
        assert!(is_absolute_url("https://cdn.example.com"));
        assert!(is_absolute_url("http://localhost:5173/"));
        assert!(!is_absolute_url("/build/"));
        assert!(!is_absolute_url("build/"));
        assert!(!is_absolute_url("//cdn.example.com"));
    }

    #[test]
    fn test_default_pattern_keeps_keys_without_hash() {
        let pattern = KeyHashPattern::default();
        assert_eq!(pattern.strip("build/app.js"), "build/app.js");
        assert_eq!(pattern.strip("build/app-1234.js"), "build/app-1234.js");
    }

    #[test]
    fn test_default_pattern_strips_hash_before_extension() {
        let pattern = KeyHashPattern::default();
        assert_eq!(pattern.strip("build/app-a1b2c3d4.js"), "build/app.js");
        assert_eq!(pattern.strip("assets/theme-0011aabb.css"), "assets/theme.css");
    }

    #[test]
    fn test_min_suffix_goes_with_the_hash() {
        let pattern = KeyHashPattern::default();
        assert_eq!(pattern.strip("vendor-a1b2c3d4.min.js"), "vendor.js");
        // `.min` is the extension here, so it stays.
        assert_eq!(pattern.strip("vendor-a1b2c3d4.min"), "vendor.min");
    }

    #[test]
    fn test_pattern_without_group_removes_whole_match() {
        let pattern = KeyHashPattern::new(r"\.[0-9]+").unwrap();
        assert_eq!(pattern.strip("app.123.js"), "app.js");
    }

    #[test]
    fn test_patterns_compare_by_source() {
        assert_eq!(KeyHashPattern::default(), KeyHashPattern::default());
        assert_ne!(KeyHashPattern::default(), KeyHashPattern::new("x").unwrap());
    }

    #[test]
    fn test_disabled_integrity_yields_no_algorithms() {
        let options = ValidatedOptions {
            integrity_hashes: Some(IntegrityHashes::from_enabled(false)),
            ..ValidatedOptions::default()
        };
        assert!(options.enabled_integrity_algorithms().is_none());
    }
}
