//! Reply serialisation for the dispatch loop.

use std::io::Write;

use denden_types::RpcReply;

use super::errors::DispatchError;

/// Writes a single JSONL reply frame.
pub(crate) struct ReplyWriter<W> {
    writer: W,
}

impl<W: Write> ReplyWriter<W> {
    pub(crate) const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialises `reply` followed by a newline and flushes the stream.
    pub(crate) fn write(&mut self, reply: &RpcReply) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(reply).map_err(DispatchError::SerializeReply)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a fault frame describing `error`.
    pub(crate) fn write_fault(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write(&RpcReply::fault(error.to_string()))
    }
}
