//! Call frame decoding for the dispatch loop.

use denden_types::RpcCall;

use super::errors::DispatchError;

/// Parses a JSONL line into a call.
///
/// Trailing whitespace, including the newline delimiter, is trimmed before
/// parsing.
///
/// # Errors
///
/// Returns `DispatchError::MalformedJsonl` if the line is empty or does not
/// decode as an [`RpcCall`].
pub(crate) fn parse_call(line: &[u8]) -> Result<RpcCall, DispatchError> {
    let trimmed = line.trim_ascii_end();
    if trimmed.is_empty() {
        return Err(DispatchError::malformed("empty request line"));
    }

    serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
}
