//! Error types for the wire model.

use thiserror::Error;

use crate::packet::PacketType;

/// Result alias for wire encoding and decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding packets and frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Input ended before a field was complete.
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required by the field being read
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// First byte does not describe a long-header packet.
    #[error("unsupported packet form {0:#04x}")]
    UnsupportedForm(u8),

    /// Long-header packet type this model does not carry frames for.
    #[error("unsupported packet type {0}")]
    UnsupportedPacketType(PacketType),

    /// Connection identifier with a length other than 4 bytes.
    #[error("connection id length {0}, expected 4")]
    ConnectionIdLength(usize),

    /// Length field claims more bytes than the datagram holds.
    #[error("declared length {declared} exceeds remaining {remaining} bytes")]
    LengthMismatch {
        /// Value of the Length field
        declared: u64,
        /// Bytes actually left after the Length field
        remaining: usize,
    },

    /// Frame type code not written in its shortest varint form.
    #[error("frame type {0:#x} is not minimally encoded")]
    NonMinimalFrameType(u64),

    /// Frame type code outside the modelled set.
    #[error("unknown frame type {0:#x}")]
    UnknownFrameType(u64),

    /// Value does not fit in a QUIC variable-length integer.
    #[error("value {0} does not fit in a varint")]
    VarIntOutOfRange(u64),

    /// MaxStreams value above 2^60.
    #[error("stream limit {0} exceeds 2^60")]
    StreamLimitExceeded(u64),

    /// Close reason is not UTF-8.
    #[error("close reason is not valid UTF-8")]
    InvalidReason,
}
