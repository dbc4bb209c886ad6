//! Connection handler that answers JSONL calls.
//!
//! Each connection carries exactly one call. The handler reads a bounded
//! line, decodes it, runs it against the [`DenDenService`] and writes a single
//! reply frame before the connection is closed.

use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use denden_types::{RpcCall, RpcReply};
use tracing::{debug, warn};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::engine::DenDenService;
use super::errors::DispatchError;
use super::request::parse_call;
use super::response::ReplyWriter;

/// Maximum size of a single call line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Idle clients are disconnected after this long without sending a full line.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection handler that parses calls and dispatches them.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    service: Arc<DenDenService>,
}

impl DispatchConnectionHandler {
    /// Creates a handler serving calls against `service`.
    pub fn new(service: Arc<DenDenService>) -> Self {
        Self { service }
    }

    fn dispatch(&self, mut stream: ConnectionStream) {
        if let Err(error) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            warn!(target: DISPATCH_TARGET, %error, "failed to set read timeout");
        }

        let request_bytes = match read_request_line(&mut stream) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                let mut writer = ReplyWriter::new(&mut stream);
                if let Err(write_error) = writer.write_fault(&error) {
                    debug!(target: DISPATCH_TARGET, error = %write_error, "failed to write fault");
                }
                return;
            }
        };

        let mut writer = ReplyWriter::new(&mut stream);
        let reply = match parse_call(&request_bytes) {
            Ok(call) => self.answer(call),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request");
                RpcReply::fault(error.to_string())
            }
        };

        if let Err(error) = writer.write(&reply) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write reply");
        }
    }

    fn answer(&self, call: RpcCall) -> RpcReply {
        match call {
            RpcCall::Send { request } => RpcReply::Response {
                response: self.service.send(&request),
            },
            RpcCall::Status => RpcReply::Status {
                status: self.service.status(),
            },
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}

/// Reads a bounded JSONL line from the stream.
///
/// Returns `Ok(None)` if the client disconnects without sending data, and the
/// partial buffer if the client closes its write half without a newline.
fn read_request_line(stream: &mut ConnectionStream) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;
        let Some(read) = chunk.get(..bytes_read) else {
            return Err(DispatchError::malformed("read past buffer"));
        };

        if read.is_empty() {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        if let Some(newline_pos) = read.iter().position(|byte| *byte == b'\n') {
            buffer.extend(read.iter().take(newline_pos + 1));
            enforce_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(read);
        enforce_limit(buffer.len())?;
    }
}

fn read_with_retry(stream: &mut ConnectionStream, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(size, MAX_REQUEST_BYTES));
    }
    Ok(())
}
