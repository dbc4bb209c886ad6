//! Layered configuration shared by the `dendend` server and `denden` client.
//!
//! Values resolve from built-in defaults, then configuration files, then
//! `DENDEN_*` environment variables, then command-line flags, with later
//! layers taking precedence.

mod aliases;
mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use aliases::{ADDR_ENV, TIMEOUT_ENV, parse_duration, resolve_aliases};
pub use defaults::{
    DEFAULT_HOST, DEFAULT_MAX_WORKERS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SHUTDOWN_GRACE,
    DEFAULT_TCP_PORT, default_max_workers, default_request_timeout_secs,
    default_shutdown_grace_ms, default_socket_endpoint,
};
pub use logging::{
    DEFAULT_LOG_FILTER, LogFormat, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "DENDEN")]
pub struct Config {
    /// Socket the daemon listens on and the client connects to.
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Upper bound on concurrently served calls.
    #[ortho_config(default = default_max_workers())]
    pub max_workers: usize,
    /// Grace period for in-flight calls on shutdown, in milliseconds.
    #[ortho_config(default = default_shutdown_grace_ms())]
    pub shutdown_grace_ms: u64,
    /// Client-side timeout for a single call, in seconds.
    #[ortho_config(default = default_request_timeout_secs())]
    pub request_timeout_secs: u64,
    /// Server modules to load at startup, by name.
    #[ortho_config(merge_strategy = "append")]
    #[serde(default)]
    pub modules: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_workers: default_max_workers(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            modules: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from `args` after resolving alias spellings
    /// against the process environment.
    pub fn load_with_aliases<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args = resolve_aliases(args.into_iter().collect(), |key| std::env::var(key).ok());
        Self::load_from_iter(args)
    }

    /// Socket endpoint shared by server and client.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Worker pool size, never less than one.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Shutdown grace period.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Client call timeout. A zero value disables the timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Names of the modules to load, in configuration order.
    #[must_use]
    pub fn modules(&self) -> &[String] {
        &self.modules
    }
}
