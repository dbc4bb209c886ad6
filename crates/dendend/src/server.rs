//! Server composition: handler registration, module loading and serving.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use denden_config::{Config, SocketEndpoint};
use denden_types::PayloadKind;

use crate::dispatch::{DenDenService, DispatchConnectionHandler, RequestHandler};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::modules::Module;
use crate::process::{LaunchError, ShutdownSignal};
use crate::transport::{DrainOutcome, ListenerError, ListenerHandle, SocketListener};

/// A configured server: the dispatch service plus its transport settings.
///
/// Handlers and modules are attached before [`DenDenServer::start`]; the
/// registry stays writable afterwards, so a module's `on_load` hook may add
/// handlers late.
pub struct DenDenServer {
    config: Config,
    service: Arc<DenDenService>,
    reporter: Arc<dyn HealthReporter>,
}

impl DenDenServer {
    /// Builds a server that reports lifecycle events through `tracing`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_reporter(config, Arc::new(StructuredHealthReporter::new()))
    }

    /// Builds a server with a custom health reporter.
    #[must_use]
    pub fn with_reporter(config: Config, reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            config,
            service: Arc::new(DenDenService::new()),
            reporter,
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The dispatch service shared with connection workers.
    #[must_use]
    pub fn service(&self) -> &Arc<DenDenService> {
        &self.service
    }

    /// Registers `handler` for `kind`, replacing any previous handler.
    pub fn register(&self, kind: PayloadKind, handler: Arc<dyn RequestHandler>) {
        self.service.register(kind, handler);
    }

    /// Registers the `ask_user` handler.
    pub fn on_ask_user(&self, handler: impl RequestHandler + 'static) {
        self.register(PayloadKind::AskUser, Arc::new(handler));
    }

    /// Registers the `delegate` handler.
    pub fn on_delegate(&self, handler: impl RequestHandler + 'static) {
        self.register(PayloadKind::Delegate, Arc::new(handler));
    }

    /// Registers every handler of `module`, then runs its `on_load` hook.
    pub fn load_module(&self, module: &dyn Module) {
        let methods = module.methods();
        let kinds: Vec<PayloadKind> = methods.iter().map(|(kind, _)| *kind).collect();
        for (kind, handler) in methods {
            self.register(kind, handler);
        }
        module.on_load(self);
        self.reporter.module_loaded(module.name(), &kinds);
    }

    /// Binds the configured endpoint and starts serving in the background.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be bound.
    pub fn start(&self) -> Result<RunningServer, ListenerError> {
        let endpoint = self.config.daemon_socket();
        let listener = SocketListener::bind(endpoint)?;
        let local_addr = listener.local_addr();
        let handler = Arc::new(DispatchConnectionHandler::new(Arc::clone(&self.service)));
        let handle = listener.start(handler, self.config.max_workers())?;
        self.reporter.listening(endpoint, local_addr);
        Ok(RunningServer {
            endpoint: endpoint.clone(),
            local_addr,
            handle,
            reporter: Arc::clone(&self.reporter),
        })
    }

    /// Serves until `shutdown` fires, then drains for the configured grace.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when binding, waiting for the signal or joining
    /// the listener fails.
    pub fn serve(&self, shutdown: &dyn ShutdownSignal) -> Result<DrainOutcome, LaunchError> {
        let running = self.start()?;
        let waited = shutdown.wait();
        self.reporter.shutdown_requested();
        let outcome = running.drain(self.config.shutdown_grace())?;
        waited?;
        Ok(outcome)
    }
}

impl std::fmt::Debug for DenDenServer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DenDenServer")
            .field("config", &self.config)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Handle to a server that is accepting connections.
pub struct RunningServer {
    endpoint: SocketEndpoint,
    local_addr: Option<SocketAddr>,
    handle: ListenerHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl RunningServer {
    /// Endpoint the server was bound from.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Bound TCP address, resolving port `0` to the actual port.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stops accepting new connections. Calls already accepted keep running.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }

    /// Stops accepting and waits up to `grace` for accepted calls to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn drain(self, grace: Duration) -> Result<DrainOutcome, ListenerError> {
        let outcome = self.handle.drain(grace)?;
        match outcome {
            DrainOutcome::Completed => self.reporter.drain_completed(),
            DrainOutcome::TimedOut { pending } => self.reporter.drain_timed_out(pending),
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for RunningServer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RunningServer")
            .field("endpoint", &self.endpoint)
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}
