use crate::core::interfaces::Compiler;
use crate::core::models::{BundlerConfig, CompileStats};
use crate::utils::{EngineError, Logger};
use async_trait::async_trait;
use tokio::process::Command;

/// Drives an external bundler CLI as a child process.
///
/// The derived environment rides in through process env vars; diagnostics
/// come back as `error`/`warning` prefixed output lines. A non-zero exit
/// with no recognizable error line becomes a single error from the stderr
/// tail.
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace. Returns `None` for an empty
    /// command. Quoting is not supported; use `new` for args with spaces.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn collect_diagnostics(output: &str, stats: &mut CompileStats) {
        for line in output.lines() {
            let trimmed = line.trim();
            let lowered = trimmed.to_ascii_lowercase();
            if lowered.starts_with("error") {
                stats.errors.push(trimmed.to_string());
            } else if lowered.starts_with("warning") {
                stats.warnings.push(trimmed.to_string());
            }
        }
    }

    fn stderr_tail(stderr: &str) -> String {
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(5);
        lines[start..].join("\n")
    }
}

#[async_trait]
impl Compiler for ProcessEngine {
    async fn compile(
        &self,
        config: &BundlerConfig,
    ) -> std::result::Result<CompileStats, EngineError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&config.root)
            .env("NODE_ENV", config.mode.as_str())
            .env("HTTPS", if config.https { "true" } else { "false" })
            .env("BUILD_MINIFY", if config.minify { "true" } else { "false" })
            .env("BUILD_SOURCEMAP", if config.sourcemap { "true" } else { "false" })
            .env("BUILD_OUT_DIR", &config.out_dir);
        for (key, value) in &config.define {
            command.env(format!("DEFINE_{}", key.to_ascii_uppercase()), value);
        }

        Logger::debug(&format!(
            "running bundler: {} {}",
            self.program,
            self.args.join(" ")
        ));
        let output = command.output().await.map_err(|e| {
            EngineError::new(format!("failed to run {}: {}", self.program, e))
        })?;

        let mut stats = CompileStats::default();
        Self::collect_diagnostics(&String::from_utf8_lossy(&output.stdout), &mut stats);
        Self::collect_diagnostics(&String::from_utf8_lossy(&output.stderr), &mut stats);

        if !output.status.success() && stats.errors.is_empty() {
            let tail = Self::stderr_tail(&String::from_utf8_lossy(&output.stderr));
            stats.errors.push(if tail.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                tail
            });
        }
        Ok(stats)
    }
}
