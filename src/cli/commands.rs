use crate::core::interfaces::{Compiler, SettingsStore};
use crate::core::models::CliOptions;
use crate::core::services::{BuildRunner, ServerLifecycle};
use crate::infrastructure::{
    DefaultConfigFactory, HttpDevServerFactory, JsonSettingsStore, ProcessEngine,
    SystemBrowserOpener, SystemHostProbe, TcpPortProbe,
};
use crate::utils::{Logger, Result, TaktError};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "takt")]
#[command(about = "Takt - dev/build workflow orchestration for web bundlers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct EnvArgs {
    /// Root directory of the project
    #[arg(short, long, default_value = ".")]
    pub root: String,
    /// Build mode (development, production, test, none)
    #[arg(short, long)]
    pub mode: Option<String>,
    /// Persist and use HTTPS for served URLs
    #[arg(long)]
    pub https: Option<bool>,
    /// Persist and use development bundling
    #[arg(long)]
    pub dev: Option<bool>,
    /// Enable PWA asset generation
    #[arg(long)]
    pub pwa: Option<bool>,
    /// Enable verbose debug info in the bundle
    #[arg(long)]
    pub info: Option<bool>,
    /// Include runtime polyfills
    #[arg(long)]
    pub polyfill: Option<bool>,
    /// Free-form config override, KEY=VALUE (JSON value or bare string)
    #[arg(long = "override", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
    /// External bundler command to drive
    #[arg(long, default_value = "npx webpack")]
    pub engine: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the development server
    Dev {
        #[command(flatten)]
        env: EnvArgs,
        /// Preferred port to serve on
        #[arg(short, long)]
        port: Option<u16>,
        /// Open the served URL in a browser
        #[arg(long)]
        open: bool,
    },
    /// Run a one-shot build
    Build {
        #[command(flatten)]
        env: EnvArgs,
    },
    /// Show tool information
    Info,
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        // Initialize logging
        Logger::init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Dev { env, port, open } => self.handle_dev_command(env, port, open).await,
            Commands::Build { env } => self.handle_build_command(env).await,
            Commands::Info => self.handle_info_command(),
        }
    }

    async fn handle_dev_command(
        &self,
        args: EnvArgs,
        port: Option<u16>,
        open: bool,
    ) -> Result<()> {
        let root = resolve_root(&args.root)?;
        let options = cli_options(&args, port, open)?;

        let settings: Arc<dyn SettingsStore> = Arc::new(JsonSettingsStore::new());
        let lifecycle = ServerLifecycle::new(
            settings,
            Arc::new(TcpPortProbe::new()),
            Arc::new(DefaultConfigFactory::new()),
            engine_from(&args)?,
            Arc::new(HttpDevServerFactory::new()),
            Arc::new(SystemBrowserOpener::new()),
            Arc::new(SystemHostProbe::new()),
        );

        Logger::dev_banner(&root);
        let handle = if open {
            lifecycle.open(&root, &options).await?;
            lifecycle.get_server(&root)
        } else {
            lifecycle.start(&root, &options, None).await?
        };

        match handle {
            Some(handle) => {
                Logger::server_urls(&handle.protocol, &handle.host, handle.port);
                Logger::info("Press Ctrl+C to stop the server");
                tokio::signal::ctrl_c().await?;
                lifecycle.stop(&root).await
            }
            None => Ok(()),
        }
    }

    async fn handle_build_command(&self, args: EnvArgs) -> Result<()> {
        let root = resolve_root(&args.root)?;
        let mut options = cli_options(&args, None, false)?;
        // One-shot builds default to production unless told otherwise.
        if options.mode.is_none() {
            options.mode = Some("production".to_string());
        }

        let runner = BuildRunner::new(
            Arc::new(JsonSettingsStore::new()),
            Arc::new(SystemHostProbe::new()),
            Arc::new(DefaultConfigFactory::new()),
            engine_from(&args)?,
        );

        runner.run(&root, &options).await.map(|_| ())
    }

    fn handle_info_command(&self) -> Result<()> {
        tracing::info!("🦀 Takt v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!("══════════════════════════════════════");
        tracing::info!("⚡ Dev/build workflow orchestration for web bundlers");
        tracing::info!("");
        tracing::info!("🎯 Commands:");
        tracing::info!("  • dev    start the development server (one per process)");
        tracing::info!("  • build  one-shot build with warning/error classification");
        tracing::info!("");
        tracing::info!("🔧 The bundling engine is external; point --engine at any");
        tracing::info!("   CLI that reports error:/warning: lines on its output.");
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_root(root: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(root).canonicalize()?)
}

fn engine_from(args: &EnvArgs) -> Result<Arc<dyn Compiler>> {
    match ProcessEngine::from_command_line(&args.engine) {
        Some(engine) => Ok(Arc::new(engine)),
        None => Err(TaktError::config("empty --engine command")),
    }
}

fn cli_options(args: &EnvArgs, port: Option<u16>, open: bool) -> Result<CliOptions> {
    let mut overrides = Map::new();
    for entry in &args.overrides {
        let (key, raw) = entry
            .split_once('=')
            .ok_or_else(|| TaktError::config(format!("override '{}' is not KEY=VALUE", entry)))?;
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        overrides.insert(key.to_string(), value);
    }

    Ok(CliOptions {
        dev: args.dev.map(Value::Bool),
        https: args.https.map(Value::Bool),
        mode: args.mode.clone(),
        pwa: args.pwa.map(Value::Bool),
        debug_info: args.info.map(Value::Bool),
        polyfill: args.polyfill.map(Value::Bool),
        port,
        open,
        overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse_json_with_string_fallback() {
        let args = EnvArgs {
            root: ".".to_string(),
            mode: None,
            https: None,
            dev: None,
            pwa: None,
            info: None,
            polyfill: None,
            overrides: vec![
                "https=true".to_string(),
                "publicPath=/assets/".to_string(),
            ],
            engine: "npx webpack".to_string(),
        };

        let options = cli_options(&args, None, false).unwrap();
        assert_eq!(options.overrides.get("https"), Some(&Value::Bool(true)));
        assert_eq!(
            options.overrides.get("publicPath"),
            Some(&Value::String("/assets/".to_string()))
        );
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let args = EnvArgs {
            root: ".".to_string(),
            mode: None,
            https: None,
            dev: None,
            pwa: None,
            info: None,
            polyfill: None,
            overrides: vec!["broken".to_string()],
            engine: "npx webpack".to_string(),
        };

        assert!(cli_options(&args, None, false).is_err());
    }
}
