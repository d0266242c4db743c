#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use takt::core::interfaces::*;
use takt::core::models::*;
use takt::core::services::ServerLifecycle;
use takt::infrastructure::DefaultConfigFactory;
use takt::utils::{EngineError, Result, TaktError};

/// In-memory settings store with read-your-writes semantics.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<HashMap<PathBuf, ProjectSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(root: &Path, settings: ProjectSettings) -> Self {
        let store = Self::default();
        store.settings.lock().insert(root.to_path_buf(), settings);
        store
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn read(&self, project_root: &Path) -> Result<ProjectSettings> {
        Ok(self
            .settings
            .lock()
            .get(project_root)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, project_root: &Path, patch: SettingsPatch) -> Result<()> {
        let mut map = self.settings.lock();
        let entry = map.entry(project_root.to_path_buf()).or_default();
        patch.apply_to(entry);
        Ok(())
    }
}

/// Probe that echoes the preferred port back.
pub struct EchoPortProbe;

#[async_trait]
impl PortProbe for EchoPortProbe {
    async fn choose_port(&self, _host: &str, preferred_port: u16) -> Result<Option<u16>> {
        Ok(Some(preferred_port))
    }
}

/// Probe that never finds a port.
pub struct NoPortProbe;

#[async_trait]
impl PortProbe for NoPortProbe {
    async fn choose_port(&self, _host: &str, _preferred_port: u16) -> Result<Option<u16>> {
        Ok(None)
    }
}

/// Shared record of dev-server activity across handle clones.
#[derive(Default)]
pub struct ServerLog {
    pub listens: Mutex<Vec<(String, u16)>>,
    pub closes: Mutex<usize>,
}

pub struct RecordingDevServer {
    log: Arc<ServerLog>,
    fail_bind: bool,
}

#[async_trait]
impl DevServer for RecordingDevServer {
    async fn listen(&self, host: &str, port: u16) -> Result<()> {
        self.log.listens.lock().push((host.to_string(), port));
        if self.fail_bind {
            return Err(TaktError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address in use",
            )));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.log.closes.lock() += 1;
        Ok(())
    }
}

pub struct RecordingServerFactory {
    pub log: Arc<ServerLog>,
    pub fail_bind: bool,
}

impl DevServerFactory for RecordingServerFactory {
    fn create(
        &self,
        _compiler: Arc<dyn Compiler>,
        _bundler_config: BundlerConfig,
        _server_config: DevServerConfig,
    ) -> Result<Arc<dyn DevServer>> {
        Ok(Arc::new(RecordingDevServer {
            log: self.log.clone(),
            fail_bind: self.fail_bind,
        }))
    }
}

/// Compiler that replays a fixed result and counts invocations.
pub struct ScriptedCompiler {
    result: std::result::Result<CompileStats, EngineError>,
    pub calls: Mutex<usize>,
}

impl ScriptedCompiler {
    pub fn ok(stats: CompileStats) -> Self {
        Self {
            result: Ok(stats),
            calls: Mutex::new(0),
        }
    }

    pub fn err(error: EngineError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(0),
        }
    }

    pub fn clean() -> Self {
        Self::ok(CompileStats::default())
    }
}

#[async_trait]
impl Compiler for ScriptedCompiler {
    async fn compile(
        &self,
        _config: &BundlerConfig,
    ) -> std::result::Result<CompileStats, EngineError> {
        *self.calls.lock() += 1;
        self.result.clone()
    }
}

/// Host probe with fixed answers.
pub struct StaticHostProbe;

impl HostProbe for StaticHostProbe {
    fn supports_debug_info(&self) -> bool {
        false
    }

    fn lan_host(&self) -> String {
        "192.168.1.50".to_string()
    }
}

/// Browser opener that records instead of spawning anything.
#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserOpener for RecordingBrowser {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

pub struct LifecycleFixture {
    pub lifecycle: ServerLifecycle,
    pub settings: Arc<MemorySettingsStore>,
    pub server_log: Arc<ServerLog>,
    pub browser: Arc<RecordingBrowser>,
}

pub fn lifecycle_fixture(fail_bind: bool) -> LifecycleFixture {
    let settings = Arc::new(MemorySettingsStore::new());
    let server_log = Arc::new(ServerLog::default());
    let browser = Arc::new(RecordingBrowser::default());
    let lifecycle = ServerLifecycle::new(
        settings.clone(),
        Arc::new(EchoPortProbe),
        Arc::new(DefaultConfigFactory::new()),
        Arc::new(ScriptedCompiler::clean()),
        Arc::new(RecordingServerFactory {
            log: server_log.clone(),
            fail_bind,
        }),
        browser.clone(),
        Arc::new(StaticHostProbe),
    );
    LifecycleFixture {
        lifecycle,
        settings,
        server_log,
        browser,
    }
}
