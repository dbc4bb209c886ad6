//! Server bootstrap orchestration.

use std::sync::Arc;

use denden_config::{Config, SocketPreparationError};
use ortho_config::OrthoError;
use thiserror::Error;

use crate::health::HealthReporter;
use crate::modules::{ModuleCatalog, UnknownModuleError};
use crate::server::DenDenServer;
use crate::telemetry::{self, TelemetryError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader reading the process arguments and environment, alias spellings
/// included.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_with_aliases(std::env::args_os())
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
    /// Configuration named a module that is not compiled in.
    #[error("failed to load modules: {source}")]
    Module {
        /// The unknown module.
        #[source]
        source: UnknownModuleError,
    },
}

/// Bootstraps a server using the supplied collaborators.
///
/// Loads configuration, installs telemetry, prepares the socket directory and
/// attaches every configured module from `catalog`. The returned server has
/// not bound its socket yet.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first failing stage; the failure is
/// also reported through `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    catalog: &ModuleCatalog,
) -> Result<DenDenServer, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;

    telemetry::initialise(&config).map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    config
        .daemon_socket()
        .prepare_filesystem()
        .map_err(|source| fail(BootstrapError::Socket { source }))?;

    let modules = catalog
        .resolve(config.modules())
        .map_err(|source| fail(BootstrapError::Module { source }))?;

    reporter.bootstrap_succeeded(&config);
    let server = DenDenServer::with_reporter(config, Arc::clone(&reporter));
    for module in &modules {
        server.load_module(module.as_ref());
    }
    Ok(server)
}
