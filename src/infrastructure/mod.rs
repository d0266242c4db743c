// Default collaborator implementations
pub mod browser;
pub mod config_factory;
pub mod dev_server;
pub mod engine;
pub mod host;
pub mod port_probe;
pub mod settings;

pub use browser::SystemBrowserOpener;
pub use config_factory::DefaultConfigFactory;
pub use dev_server::{HttpDevServer, HttpDevServerFactory};
pub use engine::ProcessEngine;
pub use host::SystemHostProbe;
pub use port_probe::TcpPortProbe;
pub use settings::JsonSettingsStore;
