//! Options handling for the encore plugin.
//!
//! User options arrive untyped (the JSON rendition of the plugin options
//! object). They pass through two stages before anything else sees them:
//!
//! 1. [`ConfigValidator`] checks the shape and expands shorthands into a
//!    [`ValidatedOptions`] value.
//! 2. [`OptionsResolver`] combines that value with the host bundler's resolved
//!    [`HostConfig`] into [`ResolvedOptions`], deriving the dev-server origin and
//!    the manifest key prefix.
//!
//! ```
//! use encore_config::{ConfigValidator, HostConfig, OptionsResolver};
//! use serde_json::json;
//!
//! let validated = ConfigValidator
//!     .validate(&json!({ "enableIntegrityHashes": true }))
//!     .unwrap();
//! let host = HostConfig { base: "/build/".into(), ..HostConfig::default() };
//! let resolved = OptionsResolver::resolve(validated, &host).unwrap();
//!
//! assert_eq!(resolved.manifest.key_prefix.as_deref(), Some("build/"));
//! assert_eq!(resolved.dev_server_origin.as_str(), "http://localhost:5173/");
//! ```

pub mod error;
pub mod host;
pub mod options;
pub mod resolve;
pub mod validation;

pub use error::{ConfigError, Result, ValidationError, Violation};
pub use host::{BuildConfig, HostConfig, InputOption, ServerConfig};
pub use options::{
    ControllerBridgeOptions, DEFAULT_CONTROLLERS_JSON, DEFAULT_INTEGRITY_ALGORITHM,
    DEFAULT_KEY_HASH_PATTERN, DEFAULT_MANIFEST_FILE_NAME, IntegrityHashes, KeyHashPattern,
    ManifestOptions, ValidatedOptions, is_absolute_url,
};
pub use resolve::{DEFAULT_DEV_SERVER_PORT, OptionsResolver, ResolvedOptions};
pub use validation::{ConfigValidator, validate_options};
