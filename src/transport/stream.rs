//! Port driver over an async byte stream.
//!
//! Runs the host side of a link: a serial device opened as a file, a TCP
//! bridge, or an in-memory duplex in tests. Each [`StreamLink::pump`] reads
//! one chunk, feeds it to the port, runs receive and transmit, and writes
//! whatever the port produced back to the stream.
//!
//! # Example
//!
//! ```ignore
//! use bytes::BytesMut;
//! use flexsea_comm::config::PortConfig;
//! use flexsea_comm::handler::CommandLayer;
//! use flexsea_comm::port::{NoReply, Port};
//! use flexsea_comm::transport::StreamLink;
//!
//! let serial = tokio::fs::OpenOptions::new().read(true).write(true).open("/dev/ttyACM0").await?;
//! let mut link = StreamLink::new(serial);
//! let mut port: Port<BytesMut> = Port::new(PortConfig::default(), BytesMut::new())?;
//! let mut layer = CommandLayer::default();
//!
//! loop {
//!     match link.pump(&mut port, &mut layer, &mut NoReply).await {
//!         Ok(received) => tracing::info!(code = received.code, "Command handled"),
//!         Err(FlexseaError::ConnectionClosed) => break,
//!         Err(e) => tracing::debug!("{}", e),
//!     }
//! }
//! ```

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::codec::encode;
use crate::error::{FlexseaError, Result};
use crate::handler::CommandLayer;
use crate::port::{Port, ReplyBuilder, Received};
use crate::protocol::{Intent, DEFAULT_MAX_FRAME_LEN};

/// Async stream carrying FlexSEA frames.
#[derive(Debug)]
pub struct StreamLink<T> {
    stream: T,
    max_frame_len: usize,
}

impl<T> StreamLink<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream.
    pub fn new(stream: T) -> Self {
        Self {
            stream,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Set the frame limit used by [`StreamLink::send_command`].
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Create, encode and write one command. Returns the frame length.
    pub async fn send_command(
        &mut self,
        layer: &mut CommandLayer<'_>,
        code: u8,
        intent: Intent,
        payload: &[u8],
    ) -> Result<usize> {
        let cmd = layer.create_configured(code, intent, false, payload)?;
        let frame = encode(&cmd, self.max_frame_len)?;
        self.send_frame(&frame).await?;
        debug!(code, len = frame.len(), "Command sent");
        Ok(frame.len())
    }

    /// Write already encoded bytes and flush.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read one chunk into `port`, then receive, transmit and flush.
    ///
    /// Reads at most one staging buffer worth of bytes. Returns the result
    /// of [`Port::receive`]; replies and acks only go out after a success.
    ///
    /// # Errors
    ///
    /// - [`FlexseaError::ConnectionClosed`] on end of stream
    /// - [`FlexseaError::Io`] on read or write failure
    /// - any error from [`Port::receive`] or [`Port::transmit`]
    pub async fn pump<R, const N: usize, const P: usize>(
        &mut self,
        port: &mut Port<BytesMut, N, P>,
        layer: &mut CommandLayer<'_>,
        builder: &mut R,
    ) -> Result<Received>
    where
        R: ReplyBuilder + ?Sized,
    {
        let mut chunk = [0u8; P];
        let n = self.stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(FlexseaError::ConnectionClosed);
        }
        port.stage(&chunk[..n])?;

        self.service(port, layer, builder).await
    }

    /// Receive, transmit and flush without reading from the stream.
    ///
    /// Handles frames that are already buffered, one per call.
    pub async fn service<R, const N: usize, const P: usize>(
        &mut self,
        port: &mut Port<BytesMut, N, P>,
        layer: &mut CommandLayer<'_>,
        builder: &mut R,
    ) -> Result<Received>
    where
        R: ReplyBuilder + ?Sized,
    {
        let received = port.receive(layer);
        if received.is_ok() {
            if let Err(e) = port.transmit(layer, builder) {
                warn!(port = port.id(), "Transmit failed: {}", e);
                self.flush_outbox(port).await?;
                return Err(e);
            }
        }

        self.flush_outbox(port).await?;
        received
    }

    async fn flush_outbox<const N: usize, const P: usize>(
        &mut self,
        port: &mut Port<BytesMut, N, P>,
    ) -> Result<()> {
        let outbox = port.sink_mut().split();
        if !outbox.is_empty() {
            self.send_frame(&outbox).await?;
        }
        Ok(())
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> T {
        self.stream
    }
}
