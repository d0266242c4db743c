use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failure of the external bundling engine's compile call itself, as opposed
/// to a compile pass that produced error diagnostics.
///
/// The message may be empty. An empty message is significant: the build
/// runner propagates such errors unchanged instead of reformatting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EngineError {}

#[derive(Error, Debug)]
pub enum TaktError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid option: '{name}' expects a boolean value")]
    InvalidOption { name: String },

    #[error("No available port: {0}")]
    NoPortFound(String),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl TaktError {
    pub fn invalid_option(name: impl Into<String>) -> Self {
        Self::InvalidOption { name: name.into() }
    }

    pub fn no_port(reason: impl Into<String>) -> Self {
        Self::NoPortFound(reason.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings(message.into())
    }

    /// Format for terminal display at process exit.
    pub fn format_detailed(&self) -> String {
        match self {
            TaktError::BuildFailed(message) => {
                format!("{}\n{}", "❌ Build failed".red().bold(), message)
            }
            other => format!("{} {}", "❌ Error:".red().bold(), other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaktError>;
