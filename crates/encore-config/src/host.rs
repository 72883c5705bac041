//! Host bundler configuration, as seen by the plugin once the host has
//! finalized it.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// Project root, used to locate controller manifests and installed packages.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Public base path: `/build/`, `build/` or an absolute URL.
    #[serde(default = "default_base")]
    pub base: String,

    /// Directory of static files copied verbatim to the output.
    #[serde(default)]
    pub public_dir: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            base: default_base(),
            public_dir: None,
            server: ServerConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Explicit public origin of the dev server.
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub https: bool,

    /// Module id of the live-reload client injected in dev-server mode.
    #[serde(default = "default_client")]
    pub client: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            origin: None,
            port: None,
            https: false,
            client: default_client(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default)]
    pub input: Option<InputOption>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            input: None,
        }
    }
}

/// Build inputs in any of the shapes bundlers accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputOption {
    Single(String),
    List(Vec<String>),
    Named(IndexMap<String, String>),
}

impl InputOption {
    /// Entry name to input path. Unnamed inputs are named after themselves.
    pub fn entries(&self) -> IndexMap<String, String> {
        match self {
            InputOption::Single(input) => IndexMap::from([(input.clone(), input.clone())]),
            InputOption::List(inputs) => inputs
                .iter()
                .map(|input| (input.clone(), input.clone()))
                .collect(),
            InputOption::Named(inputs) => inputs.clone(),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, InputOption::Named(_))
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_base() -> String {
    "/".into()
}

fn default_client() -> String {
    "@vite/client".into()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("public/build")
}
