//! Handler module - command dispatch and command layer state.
//!
//! Provides:
//! - [`CommandHandler`] - implemented by anything that handles a command
//! - [`DispatchTable`] - maps command codes to handlers, catch-all by default
//! - [`CommandLayer`] - creates, parses and dispatches commands, owns packet counters
//!
//! # Example
//!
//! ```
//! use flexsea_comm::handler::CommandLayer;
//! use flexsea_comm::protocol::{Command, Intent};
//! use flexsea_comm::Status;
//!
//! fn read_sensors(cmd: &Command<'_>) -> Status {
//!     if cmd.intent().includes_read() {
//!         Status::SUCCESS
//!     } else {
//!         Status::FAILURE
//!     }
//! }
//!
//! let mut layer = CommandLayer::default();
//! layer.register_fn(5, read_sensors).unwrap();
//!
//! let buf = layer.create(5, Intent::Read, &[]).unwrap();
//! let cmd = layer.parse(&buf).unwrap();
//! assert_eq!(layer.dispatch(&cmd), Status::SUCCESS);
//! ```

mod layer;
mod registry;

pub use layer::CommandLayer;
pub use registry::{CommandHandler, DispatchTable, HandlerFn};
