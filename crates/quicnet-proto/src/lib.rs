//! Wire model for the QuicNet handshake.
//!
//! Packets use the QUIC long-header layout with fixed 4-byte connection
//! identifiers. The payload of every packet is a sequence of frames; only the
//! frame types that matter before stream traffic begins are modelled here.
//!
//! Encoding and decoding go through [`bytes::Buf`] / [`bytes::BufMut`] so the
//! same code serves socket buffers, `Vec<u8>` and fuzz inputs.
//!
//! # Security
//!
//! Decoding never trusts a declared length: every read is bounds checked and
//! a Length field that overruns the datagram is rejected before any frame is
//! parsed. Stream limits above 2^60 are refused as the transport rules
//! require.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod connection_id;
pub mod errors;
pub mod frame;
pub mod packet;
pub mod varint;

pub use builder::{InitialBuilder, PacketBuilder};
pub use connection_id::ConnectionId;
pub use errors::{ProtocolError, Result};
pub use frame::{Frame, FrameType, StreamDirection};
pub use packet::{Packet, PacketType};

/// Version written into every long header.
pub const PROTOCOL_VERSION: u32 = 0x0000_0001;

/// Stream cap assumed until the peer sends a MaxStreams frame.
pub const DEFAULT_MAX_STREAMS: u64 = 128;

/// Initial datagrams are padded to at least this many bytes.
pub const MIN_INITIAL_DATAGRAM_SIZE: usize = 1200;

/// Largest datagram a channel expects to receive.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Upper bound for a MaxStreams value (2^60).
pub const MAX_STREAMS_LIMIT: u64 = 1 << 60;
