//! Port module - one communication endpoint.
//!
//! A [`Port`] ties together everything one link needs:
//! - a [`CircularBuffer`] for received bytes
//! - optional [`PingPong`] staging between the producer and the buffer
//! - a [`ByteSink`] for outgoing frames
//! - reply and acknowledgement bookkeeping between [`Port::receive`] and
//!   [`Port::transmit`]
//!
//! # Example
//!
//! ```
//! use flexsea_comm::config::PortConfig;
//! use flexsea_comm::handler::CommandLayer;
//! use flexsea_comm::port::{NoReply, Port};
//! use flexsea_comm::protocol::{Command, Intent};
//! use flexsea_comm::{codec, Status};
//!
//! fn on_write(_cmd: &Command<'_>) -> Status {
//!     Status::SUCCESS
//! }
//!
//! let mut layer = CommandLayer::default();
//! layer.register_fn(3, on_write).unwrap();
//!
//! let mut port: Port<Vec<u8>> = Port::new(PortConfig::default(), Vec::new()).unwrap();
//!
//! // Bytes from the peer
//! let mut peer = CommandLayer::default();
//! let cmd = peer.create_with_ack(3, Intent::Write, true, &[42]).unwrap();
//! port.stage(&codec::encode(&cmd, 200).unwrap()).unwrap();
//!
//! let received = port.receive(&mut layer).unwrap();
//! assert_eq!(received.code, 3);
//! assert!(port.pending_ack().is_some());
//!
//! // Ack goes out through the sink
//! let sent = port.transmit(&mut layer, &mut NoReply).unwrap();
//! assert!(sent.ack);
//! assert!(!port.sink().is_empty());
//! ```

mod ping_pong;
mod sink;

pub use ping_pong::{Drained, PingPong, DEFAULT_STAGING_LEN};
pub use sink::{ByteSink, NoReply, ReplyBuilder};

use tracing::{debug, warn};

use crate::codec::{cleanup, decode, encode};
use crate::config::PortConfig;
use crate::error::{FlexseaError, Result};
use crate::handler::CommandLayer;
use crate::protocol::{
    AckInfo, CircularBuffer, Intent, CIRC_BUF_SIZE, MAX_ENCODED_LEN, MIN_OVERHEAD,
};
use crate::status::Status;

/// Reply owed to the peer after a successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReply {
    /// Code of the command that asked for data.
    pub code: u8,
    /// Intent of that command.
    pub intent: Intent,
}

/// Summary of one received and dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Command code.
    pub code: u8,
    /// Command intent.
    pub intent: Intent,
    /// Ack bit, false without packet numbering.
    pub ack_requested: bool,
    /// Packet number, `None` without packet numbering.
    pub packet_number: Option<u16>,
    /// Status returned by the handler (or the catch-all).
    pub status: Status,
}

/// What [`Port::transmit`] sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transmitted {
    /// A reply frame was sent.
    pub reply: bool,
    /// An acknowledgement frame was sent.
    pub ack: bool,
    /// Total bytes handed to the sink.
    pub bytes: usize,
}

/// One endpoint: reception buffer, optional staging, sink and pending work.
pub struct Port<S, const N: usize = CIRC_BUF_SIZE, const P: usize = DEFAULT_STAGING_LEN> {
    config: PortConfig,
    rx: CircularBuffer<N>,
    staging: Option<PingPong<P>>,
    sink: S,
    pending_reply: Option<PendingReply>,
    pending_ack: Option<AckInfo>,
}

impl<S: ByteSink, const N: usize, const P: usize> Port<S, N, P> {
    /// Create a port. Staging buffers exist only when `config.ping_pong` is set.
    pub fn new(config: PortConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let staging = config.ping_pong.then(PingPong::new);
        Ok(Self {
            config,
            rx: CircularBuffer::new(),
            staging,
            sink,
            pending_reply: None,
            pending_ack: None,
        })
    }

    /// Port identifier.
    #[inline]
    pub fn id(&self) -> u8 {
        self.config.id
    }

    /// Port configuration.
    #[inline]
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Producer entry point for received bytes.
    ///
    /// Goes through the staging pair when ping-pong is enabled, straight into
    /// the circular buffer otherwise.
    pub fn stage(&mut self, chunk: &[u8]) -> Result<()> {
        match &mut self.staging {
            Some(staging) => staging.write(chunk),
            None => {
                let overwritten = self.rx.write(chunk);
                if overwritten > 0 {
                    warn!(
                        port = self.config.id,
                        overwritten,
                        "Reception buffer full, oldest bytes dropped"
                    );
                }
                Ok(())
            }
        }
    }

    /// Drain staged bytes into the circular buffer. No-op without ping-pong.
    ///
    /// Returns the number of bytes moved.
    pub fn process_ping_pong(&mut self) -> usize {
        let Some(staging) = &mut self.staging else {
            return 0;
        };

        let drained = staging.drain_into(&mut self.rx);
        if drained.overwritten > 0 {
            warn!(
                port = self.config.id,
                overwritten = drained.overwritten,
                "Reception buffer full, oldest bytes dropped"
            );
        }
        drained.moved
    }

    /// Decode, parse and dispatch at most one command.
    ///
    /// On a successful handler status, schedules a reply for read intents
    /// and an ack for write intents that asked for one. Cleanup runs on
    /// every call, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`FlexseaError::IncompleteFrame`] if no full frame has arrived yet
    /// - [`FlexseaError::NoFrame`] if the buffered bytes hold no valid frame
    /// - parse errors from [`CommandLayer::parse_configured`]
    /// - [`FlexseaError::HandlerFailed`] if the handler reported a failure
    pub fn receive(&mut self, layer: &mut CommandLayer<'_>) -> Result<Received> {
        self.process_ping_pong();

        let result = if self.rx.len() > MIN_OVERHEAD {
            self.decode_and_dispatch(layer)
        } else {
            Err(FlexseaError::IncompleteFrame)
        };

        if matches!(result, Err(FlexseaError::NoFrame)) {
            // Every candidate was checked against bytes already buffered
            let dropped = self.rx.discard(self.rx.len());
            debug!(port = self.config.id, dropped, "No valid frame, buffer flushed");
        }

        let dropped = cleanup(&mut self.rx);
        if dropped > 0 {
            debug!(port = self.config.id, dropped, "Cleanup dropped bytes");
        }

        result
    }

    fn decode_and_dispatch(&mut self, layer: &mut CommandLayer<'_>) -> Result<Received> {
        let frame = decode(&mut self.rx, self.config.max_frame_len)?
            .ok_or(FlexseaError::IncompleteFrame)?;

        let cmd = layer.parse_configured(frame.payload())?;
        let status = layer.dispatch(&cmd);

        let received = Received {
            code: cmd.code(),
            intent: cmd.intent(),
            ack_requested: cmd.ack_requested(),
            packet_number: cmd.packet_number(),
            status,
        };
        debug!(
            port = self.config.id,
            code = received.code,
            intent = ?received.intent,
            %status,
            "Command received"
        );

        if status.is_catch_all() {
            return Ok(received);
        }
        if !status.is_success() {
            return Err(FlexseaError::HandlerFailed {
                code: received.code,
                status,
            });
        }

        if received.intent.includes_read() {
            self.pending_reply = Some(PendingReply {
                code: received.code,
                intent: received.intent,
            });
        }
        if received.intent.includes_write() && received.ack_requested {
            if let Some(packet_number) = received.packet_number {
                self.pending_ack = Some(AckInfo {
                    code: received.code,
                    packet_number,
                });
            }
        }

        Ok(received)
    }

    /// Send whatever [`Port::receive`] left pending.
    ///
    /// A reply is built by `builder` and sent as a `Write` command with the
    /// same code. Sending a reply also settles any ack for that command.
    /// A remaining ack is sent as a `Write` command with the configured ack
    /// code and an [`AckInfo`] payload.
    ///
    /// # Errors
    ///
    /// Returns the first send error. The ack is still attempted after a
    /// failed reply, and anything the sink refused stays pending for the
    /// next call.
    pub fn transmit<R>(
        &mut self,
        layer: &mut CommandLayer<'_>,
        builder: &mut R,
    ) -> Result<Transmitted>
    where
        R: ReplyBuilder + ?Sized,
    {
        let mut sent = Transmitted::default();
        let mut failure = None;

        if let Some(reply) = self.pending_reply.take() {
            let mut data = [0u8; MAX_ENCODED_LEN];
            match builder.build_reply(reply.code, reply.intent, &mut data) {
                Some(len) => {
                    let len = len.min(data.len());
                    match self.send_command(layer, reply.code, Intent::Write, false, &data[..len]) {
                        Ok(bytes) => {
                            sent.bytes += bytes;
                            sent.reply = true;
                            self.pending_ack = None;
                        }
                        Err(e) => {
                            warn!(
                                port = self.config.id,
                                code = reply.code,
                                "Reply not sent: {}",
                                e
                            );
                            if matches!(e, FlexseaError::SinkFailed(_)) {
                                self.pending_reply = Some(reply);
                            }
                            failure = Some(e);
                        }
                    }
                }
                None => {
                    warn!(port = self.config.id, code = reply.code, "No reply available");
                }
            }
        }

        if let Some(ack) = self.pending_ack.take() {
            let ack_code = layer.config().ack_code;
            match self.send_command(layer, ack_code, Intent::Write, false, &ack.encode()) {
                Ok(bytes) => {
                    sent.bytes += bytes;
                    sent.ack = true;
                }
                Err(e) => {
                    warn!(port = self.config.id, code = ack.code, "Ack not sent: {}", e);
                    if matches!(e, FlexseaError::SinkFailed(_)) {
                        self.pending_ack = Some(ack);
                    }
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(sent),
        }
    }

    /// Create, encode and send one command. Returns the frame length.
    pub fn send_command(
        &mut self,
        layer: &mut CommandLayer<'_>,
        code: u8,
        intent: Intent,
        ack_request: bool,
        payload: &[u8],
    ) -> Result<usize> {
        let cmd = layer.create_configured(code, intent, ack_request, payload)?;
        self.send_payload(&cmd)
    }

    /// Encode and send an already built payload. Returns the frame length.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<usize> {
        let frame = encode(payload, self.config.max_frame_len)?;
        let status = self.sink.send(&frame);
        if !status.is_success() {
            warn!(port = self.config.id, %status, "Byte sink failed");
            return Err(FlexseaError::SinkFailed(status));
        }
        debug!(port = self.config.id, len = frame.len(), "Frame sent");
        Ok(frame.len())
    }

    /// Reply scheduled by the last successful read.
    #[inline]
    pub fn pending_reply(&self) -> Option<PendingReply> {
        self.pending_reply
    }

    /// Acknowledgement scheduled by the last successful acked write.
    #[inline]
    pub fn pending_ack(&self) -> Option<AckInfo> {
        self.pending_ack
    }

    /// Received bytes not consumed yet.
    #[inline]
    pub fn rx_buffer(&self) -> &CircularBuffer<N> {
        &self.rx
    }

    /// Mutable access to the reception buffer.
    #[inline]
    pub fn rx_buffer_mut(&mut self) -> &mut CircularBuffer<N> {
        &mut self.rx
    }

    /// Staging pair, `None` when ping-pong is disabled.
    #[inline]
    pub fn staging(&self) -> Option<&PingPong<P>> {
        self.staging.as_ref()
    }

    /// Mutable access to the staging pair.
    #[inline]
    pub fn staging_mut(&mut self) -> Option<&mut PingPong<P>> {
        self.staging.as_mut()
    }

    /// The byte sink.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the byte sink.
    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S, const N: usize, const P: usize> std::fmt::Debug for Port<S, N, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("config", &self.config)
            .field("rx", &self.rx)
            .field("staging", &self.staging)
            .field("pending_reply", &self.pending_reply)
            .field("pending_ack", &self.pending_ack)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, HEADER};

    fn port(ping_pong: bool) -> Port<Vec<u8>> {
        let config = PortConfig {
            ping_pong,
            ..PortConfig::default()
        };
        Port::new(config, Vec::new()).unwrap()
    }

    fn frame_for(code: u8, intent: Intent, ack: bool, data: &[u8]) -> Vec<u8> {
        let mut peer = CommandLayer::default();
        let cmd = peer.create_with_ack(code, intent, ack, data).unwrap();
        encode(&cmd, 200).unwrap().to_vec()
    }

    /// Decode every frame the port sent.
    fn sent_commands(sink: &[u8]) -> Vec<Vec<u8>> {
        let mut cb: CircularBuffer = CircularBuffer::new();
        cb.write(sink);
        let mut out = Vec::new();
        while let Ok(Some(frame)) = decode(&mut cb, 200) {
            out.push(frame.payload().to_vec());
        }
        out
    }

    fn succeed(_cmd: &Command<'_>) -> Status {
        Status::SUCCESS
    }

    fn fail(_cmd: &Command<'_>) -> Status {
        Status(7)
    }

    #[test]
    fn test_read_schedules_reply() {
        let mut layer = CommandLayer::default();
        layer.register_fn(4, succeed).unwrap();
        let mut port = port(false);

        port.stage(&frame_for(4, Intent::Read, false, &[])).unwrap();
        let received = port.receive(&mut layer).unwrap();

        assert_eq!(received.status, Status::SUCCESS);
        assert_eq!(
            port.pending_reply(),
            Some(PendingReply {
                code: 4,
                intent: Intent::Read
            })
        );
        assert_eq!(port.pending_ack(), None);

        let mut builder = |code: u8, _intent: Intent, out: &mut [u8]| {
            out[..2].copy_from_slice(&[code, 0x55]);
            Some(2)
        };
        let sent = port.transmit(&mut layer, &mut builder).unwrap();
        assert!(sent.reply);
        assert!(!sent.ack);
        assert_eq!(port.pending_reply(), None);

        let commands = sent_commands(port.sink());
        assert_eq!(commands.len(), 1);
        let reply = layer.parse_with_ack(&commands[0]).unwrap();
        assert_eq!(reply.code(), 4);
        assert_eq!(reply.intent(), Intent::Write);
        assert_eq!(reply.data(), &[4, 0x55]);
    }

    #[test]
    fn test_acked_write_schedules_ack() {
        let mut layer = CommandLayer::default();
        layer.register_fn(9, succeed).unwrap();
        let mut port = port(false);

        port.stage(&frame_for(9, Intent::Write, true, b"data")).unwrap();
        let received = port.receive(&mut layer).unwrap();
        assert!(received.ack_requested);
        assert_eq!(received.packet_number, Some(1));
        assert_eq!(port.pending_reply(), None);
        assert_eq!(
            port.pending_ack(),
            Some(AckInfo {
                code: 9,
                packet_number: 1
            })
        );

        let sent = port.transmit(&mut layer, &mut NoReply).unwrap();
        assert!(sent.ack);
        assert_eq!(port.pending_ack(), None);

        let commands = sent_commands(port.sink());
        let ack = layer.parse_with_ack(&commands[0]).unwrap();
        assert_eq!(ack.code(), layer.config().ack_code);
        assert_eq!(
            ack.ack_info(),
            Some(AckInfo {
                code: 9,
                packet_number: 1
            })
        );
    }

    #[test]
    fn test_reply_discharges_ack() {
        let mut layer = CommandLayer::default();
        layer.register_fn(2, succeed).unwrap();
        let mut port = port(false);

        port.stage(&frame_for(2, Intent::ReadWrite, true, &[])).unwrap();
        port.receive(&mut layer).unwrap();
        assert!(port.pending_reply().is_some());
        assert!(port.pending_ack().is_some());

        let mut builder = |_code: u8, _intent: Intent, _out: &mut [u8]| Some(0);
        let sent = port.transmit(&mut layer, &mut builder).unwrap();
        assert!(sent.reply);
        assert!(!sent.ack);
        assert_eq!(sent_commands(port.sink()).len(), 1);
    }

    #[test]
    fn test_missing_reply_still_acks() {
        let mut layer = CommandLayer::default();
        layer.register_fn(2, succeed).unwrap();
        let mut port = port(false);

        port.stage(&frame_for(2, Intent::ReadWrite, true, &[])).unwrap();
        port.receive(&mut layer).unwrap();

        let sent = port.transmit(&mut layer, &mut NoReply).unwrap();
        assert!(!sent.reply);
        assert!(sent.ack);
        assert_eq!(port.pending_reply(), None);
    }

    #[test]
    fn test_catch_all_schedules_nothing() {
        let mut layer = CommandLayer::default();
        let mut port = port(false);

        port.stage(&frame_for(30, Intent::ReadWrite, true, &[])).unwrap();
        let received = port.receive(&mut layer).unwrap();
        assert_eq!(received.status, Status::CATCH_ALL);
        assert_eq!(port.pending_reply(), None);
        assert_eq!(port.pending_ack(), None);
    }

    #[test]
    fn test_handler_failure() {
        let mut layer = CommandLayer::default();
        layer.register_fn(6, fail).unwrap();
        let mut port = port(false);

        port.stage(&frame_for(6, Intent::Read, false, &[])).unwrap();
        let result = port.receive(&mut layer);
        assert!(matches!(
            result,
            Err(FlexseaError::HandlerFailed { code: 6, status: Status(7) })
        ));
        assert_eq!(port.pending_reply(), None);
        assert!(port.rx_buffer().is_empty());
    }

    #[test]
    fn test_receive_incomplete_keeps_bytes() {
        let mut layer = CommandLayer::default();
        let mut port = port(false);
        let frame = frame_for(4, Intent::Read, false, b"abcdef");

        port.stage(&frame[..3]).unwrap();
        assert!(matches!(port.receive(&mut layer), Err(FlexseaError::IncompleteFrame)));

        port.stage(&frame[3..8]).unwrap();
        assert!(matches!(port.receive(&mut layer), Err(FlexseaError::IncompleteFrame)));
        assert_eq!(port.rx_buffer().len(), 8);

        port.stage(&frame[8..]).unwrap();
        assert!(port.receive(&mut layer).is_ok());
        assert!(port.rx_buffer().is_empty());
    }

    #[test]
    fn test_receive_noise_is_flushed() {
        let mut layer = CommandLayer::default();
        let mut port = port(false);

        port.stage(&[1, 2, 3, HEADER, 1, 9, 9, 9, 9]).unwrap();
        assert!(matches!(port.receive(&mut layer), Err(FlexseaError::NoFrame)));
        assert!(port.rx_buffer().is_empty());

        port.stage(&frame_for(4, Intent::Write, false, &[])).unwrap();
        assert!(port.receive(&mut layer).is_ok());
    }

    #[test]
    fn test_receive_bad_command() {
        let mut layer = CommandLayer::default();
        let mut port = port(false);

        // Valid frame, but intent bits are 0b00
        port.stage(&encode(&[4 << 2, 0, 1], 200).unwrap()).unwrap();
        assert!(matches!(port.receive(&mut layer), Err(FlexseaError::InvalidIntent)));
        assert!(port.rx_buffer().is_empty());
    }

    #[test]
    fn test_ping_pong_port() {
        let mut layer = CommandLayer::default();
        layer.register_fn(4, succeed).unwrap();
        let mut port = port(true);
        let frame = frame_for(4, Intent::Write, true, b"split across chunks");

        let (a, b) = frame.split_at(10);
        port.stage(a).unwrap();
        port.stage(b).unwrap();
        assert_eq!(port.rx_buffer().len(), 0);
        assert_eq!(port.staging().unwrap().pending(), frame.len());

        let received = port.receive(&mut layer).unwrap();
        assert_eq!(received.code, 4);
        assert_eq!(port.staging().unwrap().pending(), 0);
    }

    #[test]
    fn test_process_ping_pong_disabled() {
        let mut port = port(false);
        port.stage(b"abc").unwrap();
        assert_eq!(port.process_ping_pong(), 0);
        assert!(port.staging().is_none());
        assert_eq!(port.rx_buffer().len(), 3);
    }

    #[test]
    fn test_sink_failure() {
        let mut layer = CommandLayer::default();
        let sink = |_bytes: &[u8]| Status::FAILURE;
        let mut port: Port<_> = Port::new(PortConfig::default(), sink).unwrap();

        let result = port.send_command(&mut layer, 1, Intent::Read, false, &[]);
        assert!(matches!(result, Err(FlexseaError::SinkFailed(Status::FAILURE))));
    }

    #[test]
    fn test_sink_failure_keeps_reply_and_sends_ack() {
        let mut layer = CommandLayer::default();
        layer.register_fn(6, succeed).unwrap();

        // Refuse the first frame only
        let mut calls = 0;
        let sink = move |_bytes: &[u8]| {
            calls += 1;
            if calls == 1 {
                Status::FAILURE
            } else {
                Status::SUCCESS
            }
        };
        let mut port: Port<_> = Port::new(PortConfig::default(), sink).unwrap();

        port.stage(&frame_for(6, Intent::ReadWrite, true, &[1])).unwrap();
        port.receive(&mut layer).unwrap();
        assert!(port.pending_reply().is_some());
        assert!(port.pending_ack().is_some());

        let mut builder = |_code: u8, _intent: Intent, out: &mut [u8]| {
            out[0] = 0x55;
            Some(1)
        };
        let result = port.transmit(&mut layer, &mut builder);
        assert!(matches!(result, Err(FlexseaError::SinkFailed(Status::FAILURE))));
        // Reply survives the failure, the ack went out anyway
        assert!(port.pending_reply().is_some());
        assert_eq!(port.pending_ack(), None);

        let sent = port.transmit(&mut layer, &mut builder).unwrap();
        assert!(sent.reply);
        assert!(!sent.ack);
        assert_eq!(port.pending_reply(), None);
    }

    #[test]
    fn test_frame_inside_partial_frame_is_not_dispatched() {
        fn expect_full(cmd: &Command<'_>) -> Status {
            if cmd.data() == INNER {
                Status::SUCCESS
            } else {
                Status::FAILURE
            }
        }
        // Data carrying a complete frame of its own
        const INNER: &[u8] = &[HEADER, 0x02, 0x74, 0x75, 0xEE, 1, 2, 3, 4, 5, 6, 7, 8];

        let mut layer = CommandLayer::default();
        layer.register_fn(5, expect_full).unwrap();
        let mut port = port(false);

        let frame = frame_for(5, Intent::Write, false, INNER);
        let inner_end = frame.iter().position(|&b| b == 0xEE).unwrap() + 1;

        port.stage(&frame[..inner_end]).unwrap();
        assert!(matches!(port.receive(&mut layer), Err(FlexseaError::IncompleteFrame)));
        assert_eq!(port.rx_buffer().len(), inner_end);

        port.stage(&frame[inner_end..]).unwrap();
        let received = port.receive(&mut layer).unwrap();
        assert_eq!(received.code, 5);
        assert_eq!(received.status, Status::SUCCESS);
    }

    #[test]
    fn test_packet_numbering_disabled() {
        let config = crate::config::CommandConfig {
            packet_numbering: false,
            ..Default::default()
        };
        let mut layer = CommandLayer::new(config).unwrap();
        layer.register_fn(4, succeed).unwrap();
        let mut port = port(false);

        let cmd = layer.create(4, Intent::Write, b"x").unwrap();
        port.stage(&encode(&cmd, 200).unwrap()).unwrap();
        let received = port.receive(&mut layer).unwrap();
        assert!(!received.ack_requested);
        assert_eq!(received.packet_number, None);
        assert_eq!(port.pending_ack(), None);
    }
}
