//! Status codes returned by command handlers and byte sinks.

use std::fmt;

/// One-byte status shared by handlers and byte sinks.
///
/// Only [`Status::SUCCESS`] counts as success. Any other value is passed
/// through untouched so applications can define their own codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u8);

impl Status {
    /// Operation completed.
    pub const SUCCESS: Status = Status(0);
    /// Generic failure.
    pub const FAILURE: Status = Status(1);
    /// Returned by the catch-all handler for unregistered codes.
    pub const CATCH_ALL: Status = Status(0xCA);

    /// Check if this is [`Status::SUCCESS`].
    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Check if this is the catch-all sentinel.
    #[inline]
    pub fn is_catch_all(self) -> bool {
        self == Self::CATCH_ALL
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Status(value)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SUCCESS => write!(f, "success"),
            Self::FAILURE => write!(f, "failure"),
            Self::CATCH_ALL => write!(f, "catch-all"),
            Status(other) => write!(f, "0x{:02X}", other),
        }
    }
}
