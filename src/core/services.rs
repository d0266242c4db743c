use crate::core::interfaces::*;
use crate::core::models::*;
use crate::utils::{EngineError, Logger, Result, TaktError, Timer};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Address every dev server binds to.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default dev-server port when neither the CLI nor persisted settings name one.
pub const DEFAULT_DEV_SERVER_PORT: u16 = 3000;

/// Invoked once `start` has attempted to bind; carries the bind error if any.
pub type ReadyCallback = Box<dyn FnOnce(Option<&TaktError>) + Send>;

/// Validates a boolean-typed option value.
///
/// An absent value takes the fallback; anything present that is not a JSON
/// boolean is an `InvalidOption` for `name`.
pub fn validate_bool_option(name: &str, value: Option<&Value>, fallback: bool) -> Result<bool> {
    match value {
        None => Ok(fallback),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(TaktError::invalid_option(name)),
    }
}

fn explicit_bool(value: Option<&Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(*b),
        _ => None,
    }
}

/// Merges CLI options, persisted settings and defaults into one immutable
/// `BuildEnvironment`.
pub struct EnvironmentDeriver {
    settings: Arc<dyn SettingsStore>,
    host: Arc<dyn HostProbe>,
}

impl EnvironmentDeriver {
    pub fn new(settings: Arc<dyn SettingsStore>, host: Arc<dyn HostProbe>) -> Self {
        Self { settings, host }
    }

    /// Derives the environment for one session.
    ///
    /// Explicit `https`/`dev` booleans are persisted before the settings read
    /// so the merged view includes them. The free-form override map is
    /// applied last and wins over every computed field.
    pub async fn derive(
        &self,
        project_root: &Path,
        options: &CliOptions,
    ) -> Result<BuildEnvironment> {
        let patch = SettingsPatch {
            dev: explicit_bool(options.dev.as_ref()),
            https: explicit_bool(options.https.as_ref()),
            server_port: None,
        };
        if !patch.is_empty() {
            self.settings.set(project_root, patch).await?;
        }

        let settings = self.settings.read(project_root).await?;

        let explicit_mode = options
            .mode
            .as_deref()
            .and_then(|m| m.parse::<BuildMode>().ok());
        let mode = explicit_mode.unwrap_or(if settings.dev {
            BuildMode::Development
        } else {
            BuildMode::Production
        });
        // An explicit, valid mode decides `development`; otherwise the
        // persisted dev flag does. `production` is always the complement.
        let development = match explicit_mode {
            Some(mode) => mode == BuildMode::Development,
            None => settings.dev,
        };

        let pwa = validate_bool_option("pwa", options.pwa.as_ref(), true)?;
        let debug_info = validate_bool_option(
            "info",
            options.debug_info.as_ref(),
            self.host.supports_debug_info(),
        )?;
        let polyfill = validate_bool_option("polyfill", options.polyfill.as_ref(), false)?;

        let mut env = BuildEnvironment {
            project_root: project_root.to_path_buf(),
            mode,
            development,
            production: !development,
            https: settings.https,
            polyfill,
            pwa,
            debug_info,
            extra: Map::new(),
        };
        env.apply_overrides(&options.overrides);
        Ok(env)
    }
}

/// Thin wrapper over the port probe: one attempt, no retries.
pub struct PortAllocator {
    probe: Arc<dyn PortProbe>,
}

impl PortAllocator {
    pub fn new(probe: Arc<dyn PortProbe>) -> Self {
        Self { probe }
    }

    pub async fn allocate(&self, host: &str, preferred_port: u16) -> Result<u16> {
        let chosen = self
            .probe
            .choose_port(host, preferred_port)
            .await
            .map_err(|e| TaktError::no_port(e.to_string()))?;
        match chosen {
            Some(port) if port != 0 => Ok(port),
            _ => Err(TaktError::no_port(format!(
                "no free port near {} on {}",
                preferred_port, host
            ))),
        }
    }
}

/// Owns the single dev-server instance for this lifecycle.
///
/// The state cell is per-instance rather than a module global so that tests
/// can run independent lifecycles side by side; the CLI constructs exactly
/// one for the process.
pub struct ServerLifecycle {
    state: RwLock<Option<ServerHandle>>,
    deriver: EnvironmentDeriver,
    allocator: PortAllocator,
    settings: Arc<dyn SettingsStore>,
    config_factory: Arc<dyn ConfigFactory>,
    engine: Arc<dyn Compiler>,
    server_factory: Arc<dyn DevServerFactory>,
    browser: Arc<dyn BrowserOpener>,
    host: Arc<dyn HostProbe>,
}

impl ServerLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        probe: Arc<dyn PortProbe>,
        config_factory: Arc<dyn ConfigFactory>,
        engine: Arc<dyn Compiler>,
        server_factory: Arc<dyn DevServerFactory>,
        browser: Arc<dyn BrowserOpener>,
        host: Arc<dyn HostProbe>,
    ) -> Self {
        Self {
            state: RwLock::new(None),
            deriver: EnvironmentDeriver::new(settings.clone(), host.clone()),
            allocator: PortAllocator::new(probe),
            settings,
            config_factory,
            engine,
            server_factory,
            browser,
            host,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.read().is_some()
    }

    /// Starts the dev server. Returns `Ok(None)` when one is already running;
    /// the existing instance is left untouched.
    ///
    /// The already-running guard is a plain state check, not a critical
    /// section: two tasks racing into `start` can both pass it. Callers
    /// serialize start/stop themselves.
    pub async fn start(
        &self,
        project_root: &Path,
        options: &CliOptions,
        on_ready: Option<ReadyCallback>,
    ) -> Result<Option<ServerHandle>> {
        if self.state.read().is_some() {
            Logger::error("dev server already running; start ignored");
            return Ok(None);
        }

        let env = self.deriver.derive(project_root, options).await?;

        let preferred = match options.port {
            Some(port) => port,
            None => self
                .settings
                .read(project_root)
                .await?
                .server_port
                .unwrap_or(DEFAULT_DEV_SERVER_PORT),
        };
        let port = self
            .allocator
            .allocate(DEFAULT_BIND_ADDRESS, preferred)
            .await?;

        let config = self.config_factory.build_config(&env)?;
        let server_config = DevServerConfig {
            host: DEFAULT_BIND_ADDRESS.to_string(),
            port,
            https: env.https,
            static_dir: config.out_dir.clone(),
        };
        let server = self
            .server_factory
            .create(self.engine.clone(), config, server_config)?;

        match server.listen(DEFAULT_BIND_ADDRESS, port).await {
            Ok(()) => {
                if let Some(cb) = on_ready {
                    cb(None);
                }
            }
            Err(err) => {
                // The server object outlives a failed bind; it still counts
                // as the running instance.
                Logger::error(&format!("dev server failed to bind: {}", err));
                if let Some(cb) = on_ready {
                    cb(Some(&err));
                }
            }
        }

        self.settings
            .set(project_root, SettingsPatch::server_port(port))
            .await?;

        let lan_host = self.host.lan_host();
        let handle = ServerHandle {
            url: format!("{}://{}:{}", env.protocol(), lan_host, port),
            host: lan_host,
            port,
            protocol: env.protocol().to_string(),
            server,
        };
        *self.state.write() = Some(handle.clone());
        Logger::server_ready(&handle.url, handle.port);
        Ok(Some(handle))
    }

    /// Stops the running server, clears the singleton and the persisted
    /// port. A no-op when already stopped; safe to call repeatedly.
    pub async fn stop(&self, project_root: &Path) -> Result<()> {
        let handle = self.state.write().take();
        match handle {
            None => {
                Logger::debug("stop called with no dev server running");
                Ok(())
            }
            Some(handle) => {
                handle.server.close().await?;
                self.settings
                    .set(project_root, SettingsPatch::clear_server_port())
                    .await?;
                Logger::server_stopped();
                Ok(())
            }
        }
    }

    /// Pure query for the current handle; logs when stopped.
    pub fn get_server(&self, _project_root: &Path) -> Option<ServerHandle> {
        let handle = self.state.read().clone();
        if handle.is_none() {
            Logger::info("no dev server running");
        }
        handle
    }

    /// Composes the current URL, or `None` when stopped. The protocol is
    /// read fresh from persisted settings, not cached from start time.
    pub async fn get_url(&self, project_root: &Path) -> Result<Option<String>> {
        let handle = self.state.read().clone();
        match handle {
            None => Ok(None),
            Some(handle) => {
                let settings = self.settings.read(project_root).await?;
                let protocol = if settings.https { "https" } else { "http" };
                Ok(Some(format!("{}://{}:{}", protocol, handle.host, handle.port)))
            }
        }
    }

    /// Opens the served URL in a browser, starting the server first when
    /// stopped.
    pub async fn open(&self, project_root: &Path, options: &CliOptions) -> Result<()> {
        if self.state.read().is_none() {
            self.start(project_root, options, None).await?;
        }
        if let Some(url) = self.get_url(project_root).await? {
            self.browser.open(&url)?;
        }
        Ok(())
    }
}

/// Runs a one-shot compile and classifies the outcome.
pub struct BuildRunner {
    deriver: EnvironmentDeriver,
    config_factory: Arc<dyn ConfigFactory>,
    engine: Arc<dyn Compiler>,
}

impl BuildRunner {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        host: Arc<dyn HostProbe>,
        config_factory: Arc<dyn ConfigFactory>,
        engine: Arc<dyn Compiler>,
    ) -> Self {
        Self {
            deriver: EnvironmentDeriver::new(settings, host),
            config_factory,
            engine,
        }
    }

    /// One compile pass, never touching any server state. Failures come back
    /// as `BuildFailed` (or a raw `Engine` error); the CLI decides process
    /// exit behavior.
    pub async fn run(&self, project_root: &Path, options: &CliOptions) -> Result<BuildOutcome> {
        let env = self.deriver.derive(project_root, options).await?;
        let config = self.config_factory.build_config(&env)?;

        Logger::build_start(project_root, env.mode.as_str());
        let timer = Timer::start("bundle");
        let result = self.engine.compile(&config).await;
        let elapsed = timer.elapsed();

        let outcome = classify_compile(result, ci_escalates_warnings())?;
        match &outcome {
            BuildOutcome::Success => Logger::build_success(elapsed),
            BuildOutcome::Warnings(warnings) => {
                Logger::build_warnings(warnings);
                Logger::build_success(elapsed);
            }
        }
        Ok(outcome)
    }
}

/// Classification policy for one compile pass, applied in order: raw engine
/// failure, first error only, CI-escalated warnings, warnings, clean.
pub fn classify_compile(
    result: std::result::Result<CompileStats, EngineError>,
    warnings_are_fatal: bool,
) -> Result<BuildOutcome> {
    let stats = match result {
        // An engine failure without a message is propagated untouched.
        Err(err) if err.message.is_empty() => return Err(TaktError::Engine(err)),
        Err(err) => CompileStats {
            errors: vec![err.message],
            warnings: Vec::new(),
        },
        Ok(stats) => stats,
    };

    let CompileStats { errors, warnings } = stats;
    if let Some(first) = errors.into_iter().next() {
        // Later errors are usually cascades of the first; keep only that one.
        return Err(TaktError::BuildFailed(first));
    }
    if !warnings.is_empty() {
        if warnings_are_fatal {
            return Err(TaktError::BuildFailed(warnings.join("\n")));
        }
        return Ok(BuildOutcome::Warnings(warnings));
    }
    Ok(BuildOutcome::Success)
}

/// Whether the CI environment escalates warnings to failures.
pub fn ci_escalates_warnings() -> bool {
    match std::env::var("CI") {
        Ok(value) => ci_flag_is_truthy(&value),
        Err(_) => false,
    }
}

/// The CI flag is truthy unless unset, empty, or literally "false" in any
/// casing.
pub fn ci_flag_is_truthy(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case("false")
}
