use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct Logger;

impl Logger {
    pub fn init() {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("takt=info")),
            )
            .with_target(false)
            .init();
    }

    pub fn dev_banner(root: &Path) {
        info!("🚀 Takt - Development Server");
        info!("═══════════════════════════════════════");
        info!("📁 Root: {}", root.display());
    }

    pub fn server_urls(protocol: &str, lan_host: &str, port: u16) {
        info!("🌐 Local:   {}://localhost:{}", protocol, port);
        info!("🌍 Network: {}://{}:{}", protocol, lan_host, port);
    }

    pub fn server_ready(url: &str, port: u16) {
        info!("📦 dev server ready on {} (port {})", url, port);
    }

    pub fn server_stopped() {
        info!("✅ dev server stopped");
    }

    pub fn build_start(root: &Path, mode: &str) {
        info!("🔨 Takt - One-shot Build");
        info!("═══════════════════════════════════════");
        info!("📁 Input: {}", root.display());
        info!("🎯 Mode: {}", mode);
    }

    pub fn build_success(build_time: std::time::Duration) {
        info!("✅ Build completed in {:.2?}", build_time);
    }

    pub fn build_warnings(warnings: &[String]) {
        for warning in warnings {
            warn!("⚠️  {}", warning);
        }
        info!("📊 {} warning(s) reported", warnings.len());
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("⚠️  {}", msg);
    }

    pub fn error(msg: &str) {
        error!("❌ {}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
