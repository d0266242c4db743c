use crate::core::interfaces::DevServer;
use crate::utils::TaktError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Build mode for a single compile/serve session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
    Test,
    None,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
            BuildMode::Test => "test",
            BuildMode::None => "none",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = TaktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(BuildMode::Development),
            "production" => Ok(BuildMode::Production),
            "test" => Ok(BuildMode::Test),
            "none" => Ok(BuildMode::None),
            other => Err(TaktError::config(format!("unknown build mode: {}", other))),
        }
    }
}

/// Persisted per-project settings.
///
/// The serde defaults here are the store's own defaults: a project that has
/// never been written reads back as `dev=true, https=false, server_port=None`.
/// Environment derivation invents no defaults of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default = "default_dev")]
    pub dev: bool,
    #[serde(default)]
    pub https: bool,
    #[serde(default)]
    pub server_port: Option<u16>,
}

fn default_dev() -> bool {
    true
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            dev: true,
            https: false,
            server_port: None,
        }
    }
}

/// Partial merge-write for `ProjectSettings`. `None` fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub dev: Option<bool>,
    pub https: Option<bool>,
    /// `Some(Some(p))` records a port, `Some(None)` clears it.
    pub server_port: Option<Option<u16>>,
}

impl SettingsPatch {
    pub fn dev(value: bool) -> Self {
        Self {
            dev: Some(value),
            ..Default::default()
        }
    }

    pub fn https(value: bool) -> Self {
        Self {
            https: Some(value),
            ..Default::default()
        }
    }

    pub fn server_port(port: u16) -> Self {
        Self {
            server_port: Some(Some(port)),
            ..Default::default()
        }
    }

    pub fn clear_server_port() -> Self {
        Self {
            server_port: Some(None),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dev.is_none() && self.https.is_none() && self.server_port.is_none()
    }

    pub fn apply_to(&self, settings: &mut ProjectSettings) {
        if let Some(dev) = self.dev {
            settings.dev = dev;
        }
        if let Some(https) = self.https {
            settings.https = https;
        }
        if let Some(port) = self.server_port {
            settings.server_port = port;
        }
    }
}

/// Options accepted by environment derivation, sourced from CLI flags or a
/// project manifest.
///
/// Boolean-typed fields carry raw JSON values so that a non-boolean input
/// fails validation instead of being silently coerced.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub dev: Option<Value>,
    pub https: Option<Value>,
    pub mode: Option<String>,
    pub pwa: Option<Value>,
    pub debug_info: Option<Value>,
    pub polyfill: Option<Value>,
    pub port: Option<u16>,
    pub open: bool,
    pub overrides: Map<String, Value>,
}

/// Immutable descriptor of how a single compile/serve session behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildEnvironment {
    pub project_root: PathBuf,
    pub mode: BuildMode,
    pub development: bool,
    pub production: bool,
    pub https: bool,
    pub polyfill: bool,
    pub pwa: bool,
    pub debug_info: bool,
    /// Free-form values that rode in through the override map.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl BuildEnvironment {
    /// Applies a free-form override map on top of the derived fields.
    ///
    /// The override layer is applied last and wins: a known key with a
    /// matching JSON type replaces the typed field, everything else is kept
    /// verbatim in `extra`.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) {
        for (key, value) in overrides {
            match (key.as_str(), value) {
                ("mode", Value::String(s)) => {
                    if let Ok(mode) = s.parse::<BuildMode>() {
                        self.mode = mode;
                    }
                }
                ("development", Value::Bool(b)) => {
                    self.development = *b;
                    self.production = !*b;
                }
                ("production", Value::Bool(b)) => {
                    self.production = *b;
                    self.development = !*b;
                }
                ("https", Value::Bool(b)) => self.https = *b,
                ("polyfill", Value::Bool(b)) => self.polyfill = *b,
                ("pwa", Value::Bool(b)) => self.pwa = *b,
                ("debug_info", Value::Bool(b)) => self.debug_info = *b,
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn protocol(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }
}

/// Configuration handed to the external bundling engine. Opaque to the
/// lifecycle core; produced by a `ConfigFactory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlerConfig {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub mode: BuildMode,
    pub development: bool,
    pub https: bool,
    pub minify: bool,
    pub sourcemap: bool,
    #[serde(default)]
    pub define: HashMap<String, String>,
}

/// Serving parameters handed to a dev server at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServerConfig {
    pub host: String,
    pub port: u16,
    pub https: bool,
    pub static_dir: PathBuf,
}

/// Diagnostics from one compile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Classified result of a successful one-shot build. Failures surface as
/// `TaktError::BuildFailed` instead of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Warnings(Vec<String>),
}

/// The one live dev-server instance for a lifecycle. Owned by the lifecycle
/// state cell; clones share the underlying server.
#[derive(Clone)]
pub struct ServerHandle {
    pub url: String,
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub server: Arc<dyn DevServer>,
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("url", &self.url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}
