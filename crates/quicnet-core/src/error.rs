//! Error types for the client handshake.

use std::{io, net::AddrParseError};

use quicnet_proto::{PacketType, ProtocolError};
use thiserror::Error;

use crate::handshake::HandshakeState;

/// Errors raised by the handshake state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// Operation not valid in the current state
    #[error("invalid state {state:?} for operation {operation}")]
    InvalidState {
        /// Current state
        state: HandshakeState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Reply was not an Initial packet
    #[error("expected an Initial reply, received {packet_type}")]
    UnexpectedPacket {
        /// Type of the packet that arrived
        packet_type: PacketType,
    },

    /// Reply carried a ConnectionClose frame
    #[error("peer closed the handshake (code {error_code:#x}): {reason}")]
    PeerClosed {
        /// Error code from the close frame
        error_code: u64,
        /// Reason phrase from the close frame
        reason: String,
    },
}

/// Errors raised by a transport channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket operation failed or timed out
    #[error("transport i/o failed: {0}")]
    Io(#[from] io::Error),

    /// Datagram arrived but could not be decoded
    #[error("malformed datagram: {0}")]
    Malformed(#[from] ProtocolError),
}

impl TransportError {
    /// I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(err) => Some(err.kind()),
            Self::Malformed(_) => None,
        }
    }
}

/// Errors returned by [`crate::Client::connect`] and
/// [`crate::Client::connect_async`].
///
/// Every variant ends the attempt; no connection is produced and nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Address or port could not be parsed. Raised before any I/O.
    #[error("invalid peer address {input:?}: {source}")]
    AddressFormat {
        /// Address as supplied by the caller
        input: String,
        /// Parser error
        source: AddrParseError,
    },

    /// Binding, sending or receiving failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Peer explicitly refused the connection
    #[error("connection refused by peer: {reason}")]
    Connectivity {
        /// Error code from the close frame
        error_code: u64,
        /// Reason phrase supplied by the peer
        reason: String,
    },

    /// Any other handshake failure
    #[error("handshake failed: {0}")]
    Handshake(HandshakeError),
}

impl ConnectError {
    /// Peer-supplied reason, if the peer closed the handshake.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Connectivity { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// I/O error kind, if the transport failed with one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Transport(err) => err.io_kind(),
            _ => None,
        }
    }
}

impl From<HandshakeError> for ConnectError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::PeerClosed { error_code, reason } => {
                Self::Connectivity { error_code, reason }
            },
            other => Self::Handshake(other),
        }
    }
}

impl From<io::Error> for ConnectError {
    fn from(err: io::Error) -> Self {
        Self::Transport(TransportError::Io(err))
    }
}
