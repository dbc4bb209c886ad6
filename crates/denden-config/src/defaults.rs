//! Default values for the server transport and worker pool.

use std::time::Duration;

use crate::socket::SocketEndpoint;

/// Default host the daemon listens on.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port of the daemon.
pub const DEFAULT_TCP_PORT: u16 = 9700;

/// Default number of worker threads serving calls.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Default grace period granted to in-flight calls on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Default client-side timeout for a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Computes the default socket endpoint for the daemon.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_TCP_PORT)
}

/// Default worker pool size.
#[must_use]
pub const fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

/// Default shutdown grace period in milliseconds.
#[must_use]
pub fn default_shutdown_grace_ms() -> u64 {
    u64::try_from(DEFAULT_SHUTDOWN_GRACE.as_millis()).unwrap_or(u64::MAX)
}

/// Default client timeout in seconds.
#[must_use]
pub const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
