//! Error types for the client runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
    #[error("request must be a JSON object")]
    NotAnObject,
    #[error("either 'ask_user' or 'delegate' payload is required")]
    MissingPayload,
    #[error("invalid request: {0}")]
    InvalidRequest(serde_json::Error),
    #[error("failed to format request timestamp: {0}")]
    Timestamp(time::error::Format),
    #[error("failed to resolve server address {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },
    #[error("failed to connect to server at {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    #[error("failed to configure connection: {0}")]
    Configure(io::Error),
    #[error("failed to serialise request: {0}")]
    SerialiseRequest(serde_json::Error),
    #[error("failed to send request to server: {0}")]
    SendRequest(io::Error),
    #[error("failed to read response from server: {0}")]
    ReadResponse(io::Error),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("server closed the connection without replying")]
    ConnectionClosed,
    #[error("failed to parse server reply: {0}")]
    ParseReply(serde_json::Error),
    #[error("server rejected the call: {0}")]
    Fault(String),
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}

impl AppError {
    /// Classifies an IO failure during the exchange, separating timeouts.
    pub(crate) fn from_read(error: io::Error) -> Self {
        if is_timeout(&error) {
            Self::Timeout
        } else {
            Self::ReadResponse(error)
        }
    }

    pub(crate) fn from_send(error: io::Error) -> Self {
        if is_timeout(&error) {
            Self::Timeout
        } else {
            Self::SendRequest(error)
        }
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
