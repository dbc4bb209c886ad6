//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use denden_config::{Config, SocketEndpoint};
use denden_types::PayloadKind;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after a module registered its handlers.
    fn module_loaded(&self, name: &str, kinds: &[PayloadKind]);

    /// Invoked once the listener accepts connections.
    fn listening(&self, endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>);

    /// Invoked when a shutdown signal arrives.
    fn shutdown_requested(&self);

    /// Invoked when every in-flight call finished within the grace period.
    fn drain_completed(&self);

    /// Invoked when the grace period elapsed with calls still running.
    fn drain_timed_out(&self, pending: usize);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn module_loaded(&self, name: &str, kinds: &[PayloadKind]) {
        (**self).module_loaded(name, kinds);
    }

    fn listening(&self, endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>) {
        (**self).listening(endpoint, local_addr);
    }

    fn shutdown_requested(&self) {
        (**self).shutdown_requested();
    }

    fn drain_completed(&self) {
        (**self).drain_completed();
    }

    fn drain_timed_out(&self, pending: usize) {
        (**self).drain_timed_out(pending);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            max_workers = config.max_workers(),
            modules = ?config.modules(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn module_loaded(&self, name: &str, kinds: &[PayloadKind]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "module_loaded",
            module = name,
            payload_kinds = ?kinds,
            "module loaded"
        );
    }

    fn listening(&self, endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listening",
            endpoint = %endpoint,
            local_addr = ?local_addr,
            "server listening"
        );
    }

    fn shutdown_requested(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_requested",
            "shutdown requested; draining in-flight calls"
        );
    }

    fn drain_completed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "drain_completed",
            "in-flight calls drained"
        );
    }

    fn drain_timed_out(&self, pending: usize) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "drain_timed_out",
            pending,
            "grace period elapsed with calls still running"
        );
    }
}
