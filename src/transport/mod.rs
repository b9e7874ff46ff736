//! Transport module - async stream driver for host-side ports.
//!
//! Provides:
//! - [`StreamLink`] - pumps a [`Port`](crate::port::Port) from any tokio
//!   `AsyncRead + AsyncWrite` stream (serial device, TCP bridge, duplex)

mod stream;

pub use stream::StreamLink;
