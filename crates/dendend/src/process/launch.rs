//! Wires production collaborators into the server lifecycle.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::modules::ModuleCatalog;
use crate::telemetry::route_panics_to_tracing;
use crate::transport::DrainOutcome;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the server using the production collaborators.
///
/// Blocks until a termination signal arrives and in-flight calls have
/// drained or the grace period has elapsed.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding or signal handling fails.
pub fn run_server() -> Result<(), LaunchError> {
    route_panics_to_tracing();
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_server_with(
        &SystemConfigLoader,
        reporter,
        &ModuleCatalog::builtin(),
        &SystemShutdownSignal::new(),
    )
    .map(|_| ())
}

/// Runs the server with injected collaborators.
pub(crate) fn run_server_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    catalog: &ModuleCatalog,
    shutdown: &dyn ShutdownSignal,
) -> Result<DrainOutcome, LaunchError> {
    let server = bootstrap_with(loader, reporter, catalog)?;
    let outcome = server.serve(shutdown)?;
    info!(
        target: PROCESS_TARGET,
        ?outcome,
        "shutdown sequence completed"
    );
    Ok(outcome)
}
