//! Public-path resolution shared by the manifest and entrypoints stores.

use std::path::Path;

use encore_config::{ResolvedOptions, is_absolute_url};
use path_clean::PathClean;
use url::Url;

use crate::error::{ManifestError, Result};

/// Where emitted paths point to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Root-relative, relative or CDN paths for a static deployment.
    #[default]
    Static,
    /// Absolute URLs on the dev server.
    DevServer,
}

/// Resolves relative asset paths to public paths.
///
/// ```
/// use encore_manifest::{OutputMode, PublicPathResolver};
/// use url::Url;
///
/// let origin = Url::parse("http://localhost:5173").unwrap();
/// let resolver = PublicPathResolver::new("build/", origin);
/// assert_eq!(resolver.resolve("app.js").unwrap(), "build/app.js");
///
/// let resolver = resolver.with_mode(OutputMode::DevServer);
/// assert_eq!(resolver.resolve("app.js").unwrap(), "http://localhost:5173/build/app.js");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPathResolver {
    base: String,
    origin: Url,
    mode: OutputMode,
}

impl PublicPathResolver {
    /// A resolver in [`OutputMode::Static`].
    pub fn new(base: impl Into<String>, dev_server_origin: Url) -> Self {
        Self {
            base: base.into(),
            origin: dev_server_origin,
            mode: OutputMode::Static,
        }
    }

    pub fn from_options(options: &ResolvedOptions) -> Self {
        Self::new(options.base_path.clone(), options.dev_server_origin.clone())
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn resolve(&self, path: &str) -> Result<String> {
        match self.mode {
            OutputMode::Static if self.base.is_empty() => Ok(path.to_string()),
            OutputMode::Static if is_absolute_url(&self.base) => {
                let base = parse_base(&self.base, path)?;
                join_url(&base, path)
            }
            OutputMode::Static => Ok(join_posix(&self.base, path)),
            OutputMode::DevServer => {
                let base = self.dev_server_base(path)?;
                join_url(&base, path)
            }
        }
    }

    /// The configured base re-rooted on the dev-server origin.
    fn dev_server_base(&self, path: &str) -> Result<Url> {
        if self.base.is_empty() {
            return Ok(self.origin.clone());
        }
        if is_absolute_url(&self.base) {
            let base = parse_base(&self.base, path)?;
            return join_url_raw(&self.origin, base.path());
        }
        join_url_raw(&self.origin, &self.base)
    }
}

fn parse_base(base: &str, path: &str) -> Result<Url> {
    Url::parse(base).map_err(|err| ManifestError::InvalidUrl {
        base: base.to_string(),
        path: path.to_string(),
        reason: err.to_string(),
    })
}

fn join_url_raw(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|err| ManifestError::InvalidUrl {
        base: base.to_string(),
        path: path.to_string(),
        reason: err.to_string(),
    })
}

fn join_url(base: &Url, path: &str) -> Result<String> {
    join_url_raw(base, path).map(String::from)
}

/// Joins two `/`-separated paths and normalizes `.` and `..` segments.
///
/// A leading slash on `path` does not reset the join, and a trailing slash is
/// kept.
///
/// ```
/// use encore_manifest::join_posix;
///
/// assert_eq!(join_posix("/", "app.js"), "/app.js");
/// assert_eq!(join_posix("build/", "/app.js"), "build/app.js");
/// assert_eq!(join_posix("./build", "../app.js"), "app.js");
/// ```
pub fn join_posix(base: &str, path: &str) -> String {
    let keep_trailing = if path.is_empty() {
        base.ends_with('/')
    } else {
        path.ends_with('/')
    };

    let cleaned = Path::new(base).join(path.trim_start_matches('/')).clean();
    let mut joined = cleaned.to_string_lossy().replace('\\', "/");
    if keep_trailing && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}
