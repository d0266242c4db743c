use crate::core::interfaces::{Compiler, DevServer, DevServerFactory};
use crate::core::models::{BundlerConfig, CompileStats, DevServerConfig};
use crate::utils::{EngineError, Logger, Result, TaktError};
use async_trait::async_trait;
use axum::Router;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::services::ServeDir;

/// Serves the engine's output directory and recompiles on source changes.
///
/// Rebuild failures are reported through the log channel and never take the
/// server down. TLS is not terminated here; the https flag only shapes the
/// composed URLs.
pub struct HttpDevServer {
    compiler: Arc<dyn Compiler>,
    bundler_config: BundlerConfig,
    config: DevServerConfig,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    done: Mutex<Option<oneshot::Receiver<()>>>,
}

impl HttpDevServer {
    pub fn new(
        compiler: Arc<dyn Compiler>,
        bundler_config: BundlerConfig,
        config: DevServerConfig,
    ) -> Self {
        Self {
            compiler,
            bundler_config,
            config,
            shutdown: Mutex::new(None),
            done: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DevServer for HttpDevServer {
    async fn listen(&self, host: &str, port: u16) -> Result<()> {
        // Initial compile; dev-mode diagnostics are reported, never fatal.
        report_compile(self.compiler.compile(&self.bundler_config).await);

        let listener = TcpListener::bind((host, port)).await?;
        let app = Router::new().fallback_service(ServeDir::new(&self.config.static_dir));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        *self.shutdown.lock() = Some(shutdown_tx);
        *self.done.lock() = Some(done_rx);

        let (change_tx, change_rx) = mpsc::channel(64);
        let watcher = spawn_watcher(
            self.bundler_config.root.clone(),
            self.bundler_config.out_dir.clone(),
            change_tx,
        )?;
        tokio::spawn(rebuild_loop(
            self.compiler.clone(),
            self.bundler_config.clone(),
            change_rx,
            watcher,
        ));

        tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                Logger::error(&format!("dev server error: {}", err));
            }
            let _ = done_tx.send(());
        });
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(());
        }
        let done = self.done.lock().take();
        if let Some(done) = done {
            // Either outcome means the serve task is gone.
            let _ = done.await;
        }
        Ok(())
    }
}

/// Builds `HttpDevServer` instances; the default factory for the CLI.
pub struct HttpDevServerFactory;

impl HttpDevServerFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpDevServerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DevServerFactory for HttpDevServerFactory {
    fn create(
        &self,
        compiler: Arc<dyn Compiler>,
        bundler_config: BundlerConfig,
        server_config: DevServerConfig,
    ) -> Result<Arc<dyn DevServer>> {
        Ok(Arc::new(HttpDevServer::new(
            compiler,
            bundler_config,
            server_config,
        )))
    }
}

async fn rebuild_loop(
    compiler: Arc<dyn Compiler>,
    config: BundlerConfig,
    mut changes: mpsc::Receiver<PathBuf>,
    _watcher: RecommendedWatcher,
) {
    while let Some(path) = changes.recv().await {
        // Coalesce change bursts into one rebuild.
        while changes.try_recv().is_ok() {}
        Logger::info(&format!("change detected: {}", path.display()));
        report_compile(compiler.compile(&config).await);
    }
}

fn report_compile(result: std::result::Result<CompileStats, EngineError>) {
    match result {
        Ok(stats) => {
            for warning in &stats.warnings {
                Logger::warn(warning);
            }
            match stats.errors.first() {
                Some(error) => Logger::error(error),
                None => Logger::info("compiled successfully"),
            }
        }
        Err(err) => Logger::error(&format!("compile failed: {}", err)),
    }
}

fn spawn_watcher(
    root: PathBuf,
    out_dir: PathBuf,
    tx: mpsc::Sender<PathBuf>,
) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(
        move |res: std::result::Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    // The engine's own output must not retrigger it.
                    if path.starts_with(&out_dir) {
                        continue;
                    }
                    if is_source_file(&path) {
                        let _ = tx.blocking_send(path);
                    }
                }
            }
        },
    )
    .map_err(|e| TaktError::config(format!("file watcher: {}", e)))?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| TaktError::config(format!("file watcher: {}", e)))?;
    Ok(watcher)
}

fn is_source_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(
            ext,
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "css" | "scss" | "json" | "html" | "vue"
                | "svelte"
        ),
        None => false,
    }
}
