//! Process lifecycle: launching the server and waiting for shutdown signals.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::run_server;
#[cfg(test)]
pub(crate) use launch::run_server_with;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
