//! Structured telemetry initialisation for the server.

use std::any::Any;
use std::io::{self, IsTerminal};
use std::panic::{self, PanicHookInfo};
use std::thread;

use denden_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, error, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

const PANIC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::panic");

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// global subscriber, even when their configuration differs.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

/// Replaces the panic hook so panic reports are emitted as `tracing` events
/// in the configured log format.
///
/// Until a subscriber exists the previous hook still reports the panic.
pub(crate) fn route_panics_to_tracing() {
    let fallback = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if tracing::dispatcher::has_been_set() {
            log_panic(info);
        } else {
            fallback(info);
        }
    }));
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map(ToString::to_string)
        .unwrap_or_default();
    let current = thread::current();
    error!(
        target: PANIC_TARGET,
        thread = current.name().unwrap_or("<unnamed>"),
        %location,
        "panicked: {}",
        panic_text(info.payload()).unwrap_or("non-string payload")
    );
}

/// Text carried by a panic payload raised with a string message.
pub(crate) fn panic_text(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::capture_logs;

    #[test]
    fn repeated_initialisation_is_idempotent() {
        let config = Config::default();
        initialise(&config).expect("first initialisation");
        initialise(&config).expect("second initialisation");
    }

    #[test]
    fn panic_text_reads_string_payloads() {
        let borrowed: Box<dyn Any + Send> = Box::new("static message");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_text(borrowed.as_ref()), Some("static message"));
        assert_eq!(panic_text(owned.as_ref()), Some("owned message"));
        assert_eq!(panic_text(other.as_ref()), None);
    }

    #[test]
    fn panics_are_reported_through_tracing() {
        route_panics_to_tracing();
        let (outcome, logs) =
            capture_logs(|| panic::catch_unwind::<_, ()>(|| panic!("worker exploded")));
        drop(panic::take_hook());

        assert!(outcome.is_err());
        assert!(logs.contains("panicked: worker exploded"), "logs were {logs}");
        assert!(logs.contains(PANIC_TARGET), "logs were {logs}");
    }
}
