//! Resolution of validated options against the host configuration.

use tracing::debug;
use url::Url;

use crate::error::{ConfigError, Result};
use crate::host::HostConfig;
use crate::options::{
    ControllerBridgeOptions, IntegrityHashes, ManifestOptions, ValidatedOptions, is_absolute_url,
};

pub const DEFAULT_DEV_SERVER_PORT: u16 = 5173;

/// Final plugin options, fixed for the lifetime of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub integrity_hashes: Option<IntegrityHashes>,
    pub controller_bridge: Option<ControllerBridgeOptions>,
    /// Manifest options with the effective key prefix filled in.
    pub manifest: ManifestOptions,
    /// Public base path as configured on the host: empty, relative or an absolute URL.
    pub base_path: String,
    pub dev_server_origin: Url,
    pub host: HostConfig,
}

impl ResolvedOptions {
    /// Algorithms to digest with, if integrity hashes are switched on.
    pub fn enabled_integrity_algorithms(&self) -> Option<&[String]> {
        self.integrity_hashes
            .as_ref()
            .filter(|hashes| hashes.enabled)
            .map(|hashes| hashes.algorithms.as_slice())
    }

    pub fn enabled_controller_bridge(&self) -> Option<&ControllerBridgeOptions> {
        self.controller_bridge.as_ref().filter(|bridge| bridge.enabled)
    }

    /// The validated options these were resolved from, with derived values kept.
    ///
    /// Resolving the result again against the same host yields `self`.
    pub fn to_validated(&self) -> ValidatedOptions {
        ValidatedOptions {
            integrity_hashes: self.integrity_hashes.clone(),
            controller_bridge: self.controller_bridge.clone(),
            manifest: self.manifest.clone(),
        }
    }
}

pub struct OptionsResolver;

impl OptionsResolver {
    /// Combines validated options with the finalized host configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Configuration`] when the host base is an absolute URL and
    /// no key prefix was given, [`ConfigError::InvalidOrigin`] when the host's
    /// explicit dev-server origin is not a URL.
    pub fn resolve(validated: ValidatedOptions, host: &HostConfig) -> Result<ResolvedOptions> {
        let dev_server_origin = dev_server_origin(host)?;

        let mut manifest = validated.manifest;
        if manifest.key_prefix.is_none() {
            manifest.key_prefix = derive_key_prefix(&host.base)?;
        }

        debug!(
            base = %host.base,
            origin = %dev_server_origin,
            key_prefix = ?manifest.key_prefix,
            "resolved plugin options"
        );

        Ok(ResolvedOptions {
            integrity_hashes: validated.integrity_hashes,
            controller_bridge: validated.controller_bridge,
            manifest,
            base_path: host.base.clone(),
            dev_server_origin,
            host: host.clone(),
        })
    }
}

fn dev_server_origin(host: &HostConfig) -> Result<Url> {
    let origin = match host.server.origin.as_deref().filter(|origin| !origin.is_empty()) {
        Some(origin) => origin.to_string(),
        None => {
            let scheme = if host.server.https { "https" } else { "http" };
            let port = host
                .server
                .port
                .filter(|port| *port != 0)
                .unwrap_or(DEFAULT_DEV_SERVER_PORT);
            format!("{scheme}://localhost:{port}")
        }
    };

    Url::parse(&origin).map_err(|err| ConfigError::InvalidOrigin {
        origin,
        reason: err.to_string(),
    })
}

/// Key prefix implied by a relative, non-root base: no leading slash, one trailing slash.
fn derive_key_prefix(base: &str) -> Result<Option<String>> {
    if is_absolute_url(base) {
        return Err(ConfigError::Configuration {
            field: "manifestOptions.keyPrefix".into(),
            message: "must be set if the base is an absolute URL".into(),
        });
    }
    if base.is_empty() || base == "/" {
        return Ok(None);
    }

    let prefix = base.strip_prefix('/').unwrap_or(base).trim_end_matches('/');
    Ok(Some(format!("{prefix}/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix_normalization() {
        assert_eq!(derive_key_prefix("/build/").unwrap().as_deref(), Some("build/"));
        assert_eq!(derive_key_prefix("build").unwrap().as_deref(), Some("build/"));
        assert_eq!(derive_key_prefix("/a/b//").unwrap().as_deref(), Some("a/b/"));
        assert_eq!(derive_key_prefix("/").unwrap(), None);
        assert_eq!(derive_key_prefix("").unwrap(), None);
    }

    #[test]
    fn test_absolute_base_requires_prefix() {
        let err = derive_key_prefix("https://cdn.example.com").unwrap_err();
        assert_eq!(err.field(), "manifestOptions.keyPrefix");
    }

    #[test]
    fn test_origin_follows_tls_and_port() {
        let mut host = HostConfig::default();
        host.server.https = true;
        host.server.port = Some(3000);
        assert_eq!(dev_server_origin(&host).unwrap().as_str(), "https://localhost:3000/");
    }

    #[test]
    fn test_explicit_origin_wins() {
        let mut host = HostConfig::default();
        host.server.origin = Some("http://dev.test:8080".into());
        host.server.port = Some(3000);
        assert_eq!(dev_server_origin(&host).unwrap().as_str(), "http://dev.test:8080/");
    }

    #[test]
    fn test_invalid_origin_is_reported() {
        let mut host = HostConfig::default();
        host.server.origin = Some("not a url".into());
        assert!(matches!(
            dev_server_origin(&host),
            Err(ConfigError::InvalidOrigin { .. })
        ));
    }
}
