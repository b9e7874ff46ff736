//! Collaborators of a port: where frames go and where replies come from.

use bytes::{BufMut, BytesMut};

use crate::protocol::Intent;
use crate::status::Status;

/// Destination for encoded frames (UART, USB endpoint, test capture).
pub trait ByteSink {
    /// Send one complete frame.
    fn send(&mut self, bytes: &[u8]) -> Status;
}

impl<F> ByteSink for F
where
    F: FnMut(&[u8]) -> Status,
{
    fn send(&mut self, bytes: &[u8]) -> Status {
        self(bytes)
    }
}

/// Appends frames, used as an outbox by the stream link.
impl ByteSink for BytesMut {
    fn send(&mut self, bytes: &[u8]) -> Status {
        self.put_slice(bytes);
        Status::SUCCESS
    }
}

impl ByteSink for Vec<u8> {
    fn send(&mut self, bytes: &[u8]) -> Status {
        self.extend_from_slice(bytes);
        Status::SUCCESS
    }
}

/// Builds the data of a reply to a read command.
pub trait ReplyBuilder {
    /// Write the reply data for `code` into `out`.
    ///
    /// Returns the number of bytes written, or `None` if there is nothing
    /// to send for this code.
    fn build_reply(&mut self, code: u8, intent: Intent, out: &mut [u8]) -> Option<usize>;
}

impl<F> ReplyBuilder for F
where
    F: FnMut(u8, Intent, &mut [u8]) -> Option<usize>,
{
    fn build_reply(&mut self, code: u8, intent: Intent, out: &mut [u8]) -> Option<usize> {
        self(code, intent, out)
    }
}

/// Reply builder that never has anything to send.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReply;

impl ReplyBuilder for NoReply {
    fn build_reply(&mut self, _code: u8, _intent: Intent, _out: &mut [u8]) -> Option<usize> {
        None
    }
}
