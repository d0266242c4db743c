// Takt - dev/build workflow orchestration
// Library surface shared by the CLI binary and integration tests

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod utils;
