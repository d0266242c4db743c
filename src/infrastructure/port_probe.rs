use crate::core::interfaces::PortProbe;
use crate::utils::Result;
use async_trait::async_trait;
use tokio::net::TcpListener;

/// How many ports above the preferred one the fallback scan covers.
const SCAN_RANGE: u16 = 10;

/// Chooses a port by attempting real TCP binds: the preferred port first,
/// then the next `SCAN_RANGE` ports above it.
pub struct TcpPortProbe;

impl TcpPortProbe {
    pub fn new() -> Self {
        Self
    }

    async fn is_free(host: &str, port: u16) -> bool {
        TcpListener::bind((host, port)).await.is_ok()
    }
}

impl Default for TcpPortProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn choose_port(&self, host: &str, preferred_port: u16) -> Result<Option<u16>> {
        let end = preferred_port.saturating_add(SCAN_RANGE);
        for port in preferred_port..=end {
            if Self::is_free(host, port).await {
                return Ok(Some(port));
            }
        }
        Ok(None)
    }
}
