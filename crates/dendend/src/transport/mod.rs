//! Socket listener for daemon transport endpoints.
//!
//! The transport module binds to the configured endpoint, accepts connections
//! on a background thread and hands them to a fixed pool of workers. When the
//! pool is saturated the accept loop stops pulling connections off the socket
//! until a worker frees up.

mod errors;
mod handler;
mod listener;
mod pool;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub use self::pool::DrainOutcome;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
