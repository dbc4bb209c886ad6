//! Request dispatch: handler registry, dispatch engine and JSONL call loop.
//!
//! Clients send a single JSONL call per connection:
//!
//! ```json
//! {"method":"send","request":{"request_id":"r1","ask_user":{"question":"what color?"}}}
//! ```
//!
//! and receive exactly one reply frame:
//!
//! ```json
//! {"kind":"response","response":{"protocol_version":"1.0","request_id":"r1","status":"OK","ask_user_result":{"text":"what color?"}}}
//! ```
//!
//! Envelope problems (missing `request_id`, missing payload, unregistered
//! payload kind) and handler failures are dispatch outcomes and travel in a
//! `response` frame. Only calls that cannot be read or decoded produce a
//! `fault` frame.

mod engine;
mod errors;
mod handler;
mod registry;
mod request;
mod response;
mod status;

pub use self::engine::DenDenService;
pub use self::errors::DispatchError;
pub use self::handler::DispatchConnectionHandler;
pub use self::registry::{HandlerError, HandlerRegistry, RequestHandler};
pub use self::status::StatusReporter;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
