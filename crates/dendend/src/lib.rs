//! The DenDen request/response server.
//!
//! Orchestration tooling submits request envelopes carrying a single payload
//! (`ask_user` or `delegate`). The server validates each envelope, routes the
//! payload to the handler registered for its kind and normalises every outcome
//! into a response whose status is `OK`, `DENIED` or `ERROR`. Handler failures
//! and panics never escape a call: they become `ERR_SUBAGENT_FAILURE`
//! responses.
//!
//! Handlers are plain closures or [`RequestHandler`] implementations, attached
//! directly or bundled in a [`Module`]:
//!
//! ```no_run
//! use denden_config::Config;
//! use denden_types::{AskUserResult, DenDenRequest, DenDenResponse};
//! use dendend::{DenDenServer, HandlerError};
//!
//! let server = DenDenServer::new(Config::default());
//! server.on_ask_user(|request: &DenDenRequest| -> Result<DenDenResponse, HandlerError> {
//!     Ok(DenDenResponse::ok(request.request_id.clone(), AskUserResult::new("blue")))
//! });
//! let running = server.start()?;
//! running.drain(std::time::Duration::from_secs(5))?;
//! # Ok::<(), dendend::ListenerError>(())
//! ```
//!
//! Transport is line-delimited JSON over TCP or a Unix socket, one call per
//! connection, served by a bounded pool of worker threads. Lifecycle events
//! are reported through [`HealthReporter`] and logged with `tracing`.

mod bootstrap;
mod dispatch;
mod health;
mod modules;
mod process;
mod server;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{
    DenDenService, DispatchError, HandlerError, HandlerRegistry, RequestHandler, StatusReporter,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use modules::{EchoModule, MethodTable, Module, ModuleCatalog, UnknownModuleError};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_server};
pub use server::{DenDenServer, RunningServer};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use transport::{DrainOutcome, ListenerError};

#[cfg(test)]
mod tests;
