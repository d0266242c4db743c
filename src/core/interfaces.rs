use crate::core::models::*;
use crate::utils::{EngineError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Persistent per-project key/value settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the settings for a project root, falling back to the store's
    /// own defaults when nothing has been persisted yet.
    async fn read(&self, project_root: &Path) -> Result<ProjectSettings>;

    /// Merge-writes the given fields; untouched fields keep their value.
    /// A read following a write in the same call observes the write.
    async fn set(&self, project_root: &Path, patch: SettingsPatch) -> Result<()>;
}

/// Picks a usable port given a preferred one.
///
/// The fallback strategy when the preferred port is occupied (scan, give up,
/// whatever the host environment's convention is) belongs to the probe, not
/// to its callers.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn choose_port(&self, host: &str, preferred_port: u16) -> Result<Option<u16>>;
}

/// Turns a derived environment into a bundler-ready configuration.
pub trait ConfigFactory: Send + Sync {
    fn build_config(&self, env: &BuildEnvironment) -> Result<BundlerConfig>;
}

/// The external bundling engine. One call, one compile pass.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// A returned `EngineError` means the compile call itself failed; a pass
    /// that produced diagnostics returns them in `CompileStats`.
    async fn compile(
        &self,
        config: &BundlerConfig,
    ) -> std::result::Result<CompileStats, EngineError>;
}

/// A long-lived server component serving compiled output over HTTP(S).
#[async_trait]
pub trait DevServer: Send + Sync {
    /// Binds and starts serving in the background. Returns once bound.
    async fn listen(&self, host: &str, port: u16) -> Result<()>;

    /// Shuts the server down, waiting for serving to wind down.
    async fn close(&self) -> Result<()>;
}

/// Constructs dev servers from a compiler and serving parameters.
pub trait DevServerFactory: Send + Sync {
    fn create(
        &self,
        compiler: Arc<dyn Compiler>,
        bundler_config: BundlerConfig,
        server_config: DevServerConfig,
    ) -> Result<Arc<dyn DevServer>>;
}

/// Opens a URL in the user's browser.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Capabilities of the host machine this process runs on.
pub trait HostProbe: Send + Sync {
    /// Whether verbose debug info should be on by default.
    fn supports_debug_info(&self) -> bool;

    /// A LAN-reachable address for composing shareable URLs.
    fn lan_host(&self) -> String;
}
