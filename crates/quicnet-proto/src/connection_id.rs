//! Connection identifiers.

use std::fmt;

/// Numeric token an endpoint chooses to label its side of a connection.
///
/// QuicNet uses fixed 32-bit identifiers, written big-endian after a one-byte
/// length prefix of 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectionId(u32);

impl ConnectionId {
    /// Seed used on first contact, before either side has chosen an id.
    pub const ZERO: Self = Self(0);

    /// Encoded width in bytes.
    pub const LEN: usize = 4;

    /// Wrap a raw identifier.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True for the first-contact seed.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ConnectionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
