//! Configuration for the command layer and ports.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take the defaults below.
//!
//! # Example
//!
//! ```
//! use flexsea_comm::config::{CommandConfig, PortConfig};
//!
//! let cfg = CommandConfig::from_json(r#"{ "max_code": 40, "ack_code": 40 }"#).unwrap();
//! assert_eq!(cfg.min_code, 1);
//! assert_eq!(cfg.max_code, 40);
//!
//! let port = PortConfig::from_json(r#"{ "ping_pong": true }"#).unwrap();
//! assert_eq!(port.max_frame_len, 200);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FlexseaError, Result};
use crate::protocol::{
    DEFAULT_ACK_CODE, DEFAULT_MAX_FRAME_LEN, MAX_CMD_CODE, MAX_FRAME_LEN, MAX_PACKET_NUM,
    MIN_CMD_CODE, MIN_OVERHEAD,
};

/// Command layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Lowest accepted command code. Must be at least 1.
    pub min_code: u8,
    /// Highest accepted command code. At most 63.
    pub max_code: u8,
    /// Transmit packet counter wraps to 0 after this value.
    pub max_packet_num: u16,
    /// Use the 3-byte command header (ack bit + packet number).
    pub packet_numbering: bool,
    /// Code carried by acknowledgement frames.
    pub ack_code: u8,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            min_code: MIN_CMD_CODE,
            max_code: MAX_CMD_CODE,
            max_packet_num: MAX_PACKET_NUM,
            packet_numbering: true,
            ack_code: DEFAULT_ACK_CODE,
        }
    }
}

impl CommandConfig {
    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_code < MIN_CMD_CODE {
            return Err(FlexseaError::InvalidConfig(format!(
                "min_code {} is below {}",
                self.min_code, MIN_CMD_CODE
            )));
        }
        if self.max_code > MAX_CMD_CODE {
            return Err(FlexseaError::InvalidConfig(format!(
                "max_code {} exceeds {}",
                self.max_code, MAX_CMD_CODE
            )));
        }
        if self.min_code > self.max_code {
            return Err(FlexseaError::InvalidConfig(format!(
                "min_code {} is greater than max_code {}",
                self.min_code, self.max_code
            )));
        }
        if self.max_packet_num == 0 || self.max_packet_num > MAX_PACKET_NUM {
            return Err(FlexseaError::InvalidConfig(format!(
                "max_packet_num must be in 1..={}, got {}",
                MAX_PACKET_NUM, self.max_packet_num
            )));
        }
        if !self.accepts(self.ack_code) {
            return Err(FlexseaError::InvalidConfig(format!(
                "ack_code {} outside {}..={}",
                self.ack_code, self.min_code, self.max_code
            )));
        }
        Ok(())
    }

    /// Check if a code is in the configured range.
    #[inline]
    pub fn accepts(&self, code: u8) -> bool {
        (self.min_code..=self.max_code).contains(&code)
    }
}

/// Per-port settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Identifier used in log output.
    pub id: u8,
    /// Stage incoming bytes through the ping-pong pair.
    pub ping_pong: bool,
    /// Largest frame (including overhead) the port encodes or accepts.
    pub max_frame_len: usize,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            id: 0,
            ping_pong: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl PortConfig {
    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_len <= MIN_OVERHEAD || self.max_frame_len > MAX_FRAME_LEN {
            return Err(FlexseaError::InvalidConfig(format!(
                "max_frame_len must be in {}..={}, got {}",
                MIN_OVERHEAD + 1,
                MAX_FRAME_LEN,
                self.max_frame_len
            )));
        }
        Ok(())
    }
}
