//! Test double for [`HealthReporter`] that records structured events.

use std::net::SocketAddr;
use std::sync::Mutex;

use denden_config::{Config, SocketEndpoint};
use denden_types::PayloadKind;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ModuleLoaded {
        name: String,
        kinds: Vec<PayloadKind>,
    },
    Listening(Option<SocketAddr>),
    ShutdownRequested,
    DrainCompleted,
    DrainTimedOut(usize),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn module_loaded(&self, name: &str, kinds: &[PayloadKind]) {
        self.record(HealthEvent::ModuleLoaded {
            name: name.to_owned(),
            kinds: kinds.to_vec(),
        });
    }

    fn listening(&self, _endpoint: &SocketEndpoint, local_addr: Option<SocketAddr>) {
        self.record(HealthEvent::Listening(local_addr));
    }

    fn shutdown_requested(&self) {
        self.record(HealthEvent::ShutdownRequested);
    }

    fn drain_completed(&self) {
        self.record(HealthEvent::DrainCompleted);
    }

    fn drain_timed_out(&self, pending: usize) {
        self.record(HealthEvent::DrainTimedOut(pending));
    }
}
