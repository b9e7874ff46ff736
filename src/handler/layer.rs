//! Command layer state: configuration, dispatch table and packet counters.

use tracing::warn;

use super::registry::{CommandHandler, DispatchTable, HandlerFn};
use crate::config::CommandConfig;
use crate::error::{FlexseaError, Result};
use crate::protocol::command::{self, Command, CommandBuf};
use crate::protocol::Intent;
use crate::status::Status;

/// Command creation, parsing and dispatch for one endpoint.
///
/// Owns the transmit packet counter and remembers the last received packet
/// number. Handlers are borrowed for `'h`.
///
/// # Example
///
/// ```
/// use flexsea_comm::handler::CommandLayer;
/// use flexsea_comm::protocol::{Command, Intent};
/// use flexsea_comm::Status;
///
/// let mut count = 0;
/// let mut on_write = |_cmd: &Command<'_>| {
///     count += 1;
///     Status::SUCCESS
/// };
///
/// let mut layer = CommandLayer::default();
/// layer.register(10, &mut on_write).unwrap();
///
/// let buf = layer.create_with_ack(10, Intent::Write, true, &[1, 2, 3]).unwrap();
/// assert_eq!(layer.last_tx_packet_num(), 1);
///
/// let cmd = layer.parse_with_ack(&buf).unwrap();
/// assert_eq!(layer.dispatch(&cmd), Status::SUCCESS);
/// drop(layer);
/// assert_eq!(count, 1);
/// ```
#[derive(Debug)]
pub struct CommandLayer<'h> {
    config: CommandConfig,
    table: DispatchTable<'h>,
    tx_packet_num: u16,
    rx_packet_num: u16,
}

impl<'h> CommandLayer<'h> {
    /// Create a command layer with a validated configuration.
    pub fn new(config: CommandConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: DispatchTable::new(),
            tx_packet_num: 0,
            rx_packet_num: 0,
        })
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Serialize a command with the 1-byte header.
    pub fn create(&self, code: u8, intent: Intent, payload: &[u8]) -> Result<CommandBuf> {
        command::build(&self.config, code, intent, None, payload)
    }

    /// Serialize a command with the 3-byte header.
    ///
    /// The transmit counter only advances when the command is valid.
    pub fn create_with_ack(
        &mut self,
        code: u8,
        intent: Intent,
        ack_request: bool,
        payload: &[u8],
    ) -> Result<CommandBuf> {
        command::validate(&self.config, code, intent)?;
        let packet_number = self.peek_next_packet_num();
        let buf = command::build(
            &self.config,
            code,
            intent,
            Some((ack_request, packet_number)),
            payload,
        )?;
        self.tx_packet_num = packet_number;
        Ok(buf)
    }

    /// Serialize a command using the variant selected by `packet_numbering`.
    pub fn create_configured(
        &mut self,
        code: u8,
        intent: Intent,
        ack_request: bool,
        payload: &[u8],
    ) -> Result<CommandBuf> {
        if self.config.packet_numbering {
            self.create_with_ack(code, intent, ack_request, payload)
        } else {
            self.create(code, intent, payload)
        }
    }

    /// Parse a command with the 1-byte header.
    pub fn parse<'a>(&self, bytes: &'a [u8]) -> Result<Command<'a>> {
        command::parse(&self.config, bytes, false)
    }

    /// Parse a command with the 3-byte header and record its packet number.
    pub fn parse_with_ack<'a>(&mut self, bytes: &'a [u8]) -> Result<Command<'a>> {
        let cmd = command::parse(&self.config, bytes, true)?;
        if let Some(packet_number) = cmd.packet_number() {
            self.rx_packet_num = packet_number;
        }
        Ok(cmd)
    }

    /// Parse a command using the variant selected by `packet_numbering`.
    pub fn parse_configured<'a>(&mut self, bytes: &'a [u8]) -> Result<Command<'a>> {
        if self.config.packet_numbering {
            self.parse_with_ack(bytes)
        } else {
            self.parse(bytes)
        }
    }

    /// Invoke the handler registered for `cmd`, or the catch-all.
    pub fn dispatch(&mut self, cmd: &Command<'_>) -> Status {
        let status = self.table.dispatch(cmd);
        if !status.is_success() && !status.is_catch_all() {
            warn!(code = cmd.code(), %status, "Command handler failed");
        }
        status
    }

    /// Register a stateful handler for `code`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`FlexseaError::InvalidCommandCode`] if `code` is outside the
    /// configured range.
    pub fn register(&mut self, code: u8, handler: &'h mut dyn CommandHandler) -> Result<()> {
        self.check_code(code)?;
        self.table.set(code, handler);
        Ok(())
    }

    /// Register a function handler for `code`, replacing any previous one.
    pub fn register_fn(&mut self, code: u8, handler: HandlerFn) -> Result<()> {
        self.check_code(code)?;
        self.table.set_fn(code, handler);
        Ok(())
    }

    /// Check if `code` has a handler other than the catch-all.
    pub fn is_registered(&self, code: u8) -> bool {
        self.config.accepts(code) && self.table.is_registered(code)
    }

    /// Packet number of the last command created with the 3-byte header.
    #[inline]
    pub fn last_tx_packet_num(&self) -> u16 {
        self.tx_packet_num
    }

    /// Packet number of the last command parsed with the 3-byte header.
    #[inline]
    pub fn last_rx_packet_num(&self) -> u16 {
        self.rx_packet_num
    }

    fn peek_next_packet_num(&self) -> u16 {
        if self.tx_packet_num >= self.config.max_packet_num {
            0
        } else {
            self.tx_packet_num + 1
        }
    }

    fn check_code(&self, code: u8) -> Result<()> {
        if self.config.accepts(code) {
            Ok(())
        } else {
            Err(FlexseaError::InvalidCommandCode(code))
        }
    }
}

impl Default for CommandLayer<'_> {
    fn default() -> Self {
        Self {
            config: CommandConfig::default(),
            table: DispatchTable::new(),
            tx_packet_num: 0,
            rx_packet_num: 0,
        }
    }
}
