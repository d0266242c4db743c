use crate::core::interfaces::HostProbe;
use std::net::UdpSocket;

/// Probes the machine this process runs on.
pub struct SystemHostProbe;

impl SystemHostProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemHostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SystemHostProbe {
    fn supports_debug_info(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }

    fn lan_host(&self) -> String {
        // Routing-table lookup via a connected UDP socket; nothing is sent.
        let resolved = UdpSocket::bind("0.0.0.0:0")
            .and_then(|socket| {
                socket.connect("8.8.8.8:80")?;
                socket.local_addr()
            })
            .map(|addr| addr.ip().to_string());
        resolved.unwrap_or_else(|_| "localhost".to_string())
    }
}
