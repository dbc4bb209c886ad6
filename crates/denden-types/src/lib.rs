//! Envelope types for the DenDen request/response protocol.
//!
//! Orchestration tooling submits a [`DenDenRequest`] carrying exactly one
//! [`Payload`] variant and receives a [`DenDenResponse`] whose
//! [`ResponseStatus`] is always one of `OK`, `DENIED`, or `ERROR`. The types
//! here are shared by the `dendend` server and the `denden` client so both
//! sides agree on the JSON shape exchanged over the socket.
//!
//! Responses are built through the associated constructors on
//! [`DenDenResponse`], which keep the `result`/`error` fields consistent with
//! the status:
//!
//! ```
//! use denden_types::{AskUserResult, DenDenResponse, ErrorCode, ResponseStatus};
//!
//! let ok = DenDenResponse::ok("r1", AskUserResult::new("blue"));
//! assert_eq!(ok.status, ResponseStatus::Ok);
//! assert!(ok.error.is_none());
//!
//! let denied = DenDenResponse::denied("r2", ErrorCode::DenyDepthLimit, "too deep");
//! assert_eq!(denied.error_code(), Some(ErrorCode::DenyDepthLimit));
//! ```

mod codes;
mod request;
mod response;
mod status;
mod wire;

pub use codes::ErrorCode;
pub use request::{
    AskUserPayload, DelegatePayload, DenDenRequest, Payload, PayloadKind, ReturnFormat, Task,
    Trace,
};
pub use response::{
    AskUserResult, DelegateResult, DenDenResponse, ErrorDetail, ResponseMeta, ResponseResult,
    ResponseStatus,
};
pub use status::StatusResponse;
pub use wire::{RpcCall, RpcReply, WireError};

/// Protocol version stamped on every envelope built by this crate.
pub const PROTOCOL_VERSION: &str = "1.0";
