//! Dispatch table mapping command codes to handlers.
//!
//! One slot per 6-bit code. Every slot starts as the catch-all, which
//! answers [`Status::CATCH_ALL`]. Registering a code overwrites its slot;
//! slots are never cleared.
//!
//! # Example
//!
//! ```
//! use flexsea_comm::handler::DispatchTable;
//! use flexsea_comm::protocol::{command, Command};
//! use flexsea_comm::config::CommandConfig;
//! use flexsea_comm::Status;
//!
//! fn ping(_cmd: &Command<'_>) -> Status {
//!     Status::SUCCESS
//! }
//!
//! let mut table = DispatchTable::new();
//! table.set_fn(7, ping);
//!
//! let cfg = CommandConfig::default();
//! let buf = command::build(&cfg, 7, flexsea_comm::protocol::Intent::Read, None, &[]).unwrap();
//! let cmd = command::parse(&cfg, &buf, false).unwrap();
//! assert_eq!(table.dispatch(&cmd), Status::SUCCESS);
//! ```

use tracing::debug;

use crate::protocol::{Command, CMD_TABLE_SIZE};
use crate::status::Status;

/// Trait for command handlers.
///
/// Handlers get the whole command, header included, and report a status.
/// Only [`Status::SUCCESS`] lets the port schedule a reply or an ack.
pub trait CommandHandler {
    /// Handle one received command.
    fn handle(&mut self, cmd: &Command<'_>) -> Status;
}

impl<F> CommandHandler for F
where
    F: FnMut(&Command<'_>) -> Status,
{
    fn handle(&mut self, cmd: &Command<'_>) -> Status {
        self(cmd)
    }
}

/// Plain function handler.
pub type HandlerFn = fn(&Command<'_>) -> Status;

/// One dispatch table slot.
enum Entry<'h> {
    /// Unregistered code.
    CatchAll,
    /// Function pointer, no state.
    Func(HandlerFn),
    /// Borrowed stateful handler.
    Object(&'h mut dyn CommandHandler),
}

/// Table of handlers indexed by command code.
pub struct DispatchTable<'h> {
    entries: [Entry<'h>; CMD_TABLE_SIZE],
}

impl<'h> DispatchTable<'h> {
    /// Create a table with every slot set to the catch-all.
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| Entry::CatchAll),
        }
    }

    /// Register a stateful handler, replacing any previous one.
    ///
    /// Only the low 6 bits of `code` are used; range checks belong to the caller.
    pub fn set(&mut self, code: u8, handler: &'h mut dyn CommandHandler) {
        self.entries[Self::slot(code)] = Entry::Object(handler);
    }

    /// Register a function handler, replacing any previous one.
    pub fn set_fn(&mut self, code: u8, handler: HandlerFn) {
        self.entries[Self::slot(code)] = Entry::Func(handler);
    }

    /// Check if a code has a handler other than the catch-all.
    pub fn is_registered(&self, code: u8) -> bool {
        !matches!(self.entries[Self::slot(code)], Entry::CatchAll)
    }

    /// Invoke the handler for `cmd.code()`.
    pub fn dispatch(&mut self, cmd: &Command<'_>) -> Status {
        match &mut self.entries[Self::slot(cmd.code())] {
            Entry::CatchAll => {
                debug!(code = cmd.code(), "No handler registered, using catch-all");
                Status::CATCH_ALL
            }
            Entry::Func(f) => f(cmd),
            Entry::Object(handler) => handler.handle(cmd),
        }
    }

    #[inline]
    fn slot(code: u8) -> usize {
        usize::from(code) % CMD_TABLE_SIZE
    }
}

impl Default for DispatchTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = (0..CMD_TABLE_SIZE as u8)
            .filter(|&code| self.is_registered(code))
            .count();
        f.debug_struct("DispatchTable")
            .field("registered", &registered)
            .finish()
    }
}
