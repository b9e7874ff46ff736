//! # flexsea-comm
//!
//! FlexSEA v2 communication stack for exchanging commands between two peers
//! over an unreliable byte link (UART, USB CDC).
//!
//! Everything on the protocol path works on fixed-size buffers and never
//! allocates, so the same code runs in a firmware main loop and on a host.
//!
//! ## Architecture
//!
//! - **Circular buffer** ([`protocol::CircularBuffer`]): holds received bytes
//! - **Codec** ([`codec`]): frames payloads with header, length, escapes,
//!   checksum and footer, and finds them again in noisy input
//! - **Command layer** ([`handler::CommandLayer`]): code/intent header,
//!   optional ack request and packet number, dispatch table
//! - **Port** ([`port::Port`]): one endpoint with ping-pong staging,
//!   reply and ack bookkeeping
//!
//! ## Example
//!
//! ```
//! use flexsea_comm::config::PortConfig;
//! use flexsea_comm::handler::CommandLayer;
//! use flexsea_comm::port::Port;
//! use flexsea_comm::protocol::{Command, Intent};
//! use flexsea_comm::{codec, Status};
//!
//! fn read_version(_cmd: &Command<'_>) -> Status {
//!     Status::SUCCESS
//! }
//!
//! let mut layer = CommandLayer::default();
//! layer.register_fn(1, read_version).unwrap();
//! let mut port: Port<Vec<u8>> = Port::new(PortConfig::default(), Vec::new()).unwrap();
//!
//! // Peer asks for the version
//! let mut peer = CommandLayer::default();
//! let cmd = peer.create_with_ack(1, Intent::Read, false, &[]).unwrap();
//! port.stage(&codec::encode(&cmd, 200).unwrap()).unwrap();
//! port.receive(&mut layer).unwrap();
//!
//! // Reply with two bytes
//! let mut version = |_code: u8, _intent: Intent, out: &mut [u8]| {
//!     out[..2].copy_from_slice(&[2, 0]);
//!     Some(2)
//! };
//! let sent = port.transmit(&mut layer, &mut version).unwrap();
//! assert!(sent.reply);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod port;
pub mod protocol;
pub mod tools;
pub mod transport;

mod status;

pub use error::{FlexseaError, Result};
pub use handler::{CommandHandler, CommandLayer};
pub use port::Port;
pub use status::Status;
