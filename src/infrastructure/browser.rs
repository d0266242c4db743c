use crate::core::interfaces::BrowserOpener;
use crate::utils::{Logger, Result, TaktError};
use std::process::Command;

/// Opens URLs with the platform launcher: `open` on macOS, `cmd /C start`
/// on Windows, `xdg-open` elsewhere.
pub struct SystemBrowserOpener;

impl SystemBrowserOpener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemBrowserOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserOpener for SystemBrowserOpener {
    fn open(&self, url: &str) -> Result<()> {
        let result = if cfg!(target_os = "macos") {
            Command::new("open").arg(url).spawn()
        } else if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", "start", url]).spawn()
        } else {
            Command::new("xdg-open").arg(url).spawn()
        };

        match result {
            Ok(_) => {
                Logger::info(&format!("opened browser at {}", url));
                Ok(())
            }
            Err(e) => Err(TaktError::Io(e)),
        }
    }
}
