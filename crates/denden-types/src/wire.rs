//! JSONL frames exchanged over the daemon socket.
//!
//! A client writes one [`RpcCall`] line per connection and reads back one
//! [`RpcReply`] line:
//!
//! ```json
//! {"method":"send","request":{"request_id":"r1","ask_user":{"question":"what color?"}}}
//! {"kind":"response","response":{"protocol_version":"1.0","request_id":"r1","status":"OK","ask_user_result":{"text":"blue"}}}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::DenDenRequest;
use crate::response::{DenDenResponse, ResponseStatus};
use crate::status::StatusResponse;

/// A call sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RpcCall {
    /// Submit a request envelope for dispatch.
    Send {
        /// The envelope to dispatch.
        request: DenDenRequest,
    },
    /// Query the server uptime.
    Status,
}

/// The single reply written for a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RpcReply {
    /// Dispatch outcome of a `send` call.
    Response {
        /// The normalised response envelope.
        response: DenDenResponse,
    },
    /// Uptime report for a `status` call.
    Status {
        /// The uptime report.
        status: StatusResponse,
    },
    /// Transport-level failure; the call never reached the dispatcher.
    Fault {
        /// Description of the failure.
        message: String,
    },
}

impl RpcReply {
    /// Builds a fault reply.
    #[must_use]
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }
}

/// Errors raised while converting between frames and envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// A oneof field carried more than one variant.
    #[error("{field} carries more than one variant: '{first}' and '{second}'")]
    ConflictingVariants {
        /// Name of the oneof field.
        field: &'static str,
        /// First variant key found.
        first: &'static str,
        /// Second variant key found.
        second: &'static str,
    },
    /// A response's status disagrees with its result or error fields.
    #[error("response with status {status} {problem}")]
    InconsistentResponse {
        /// Status carried by the response.
        status: ResponseStatus,
        /// Which field disagrees with the status.
        problem: &'static str,
    },
}
