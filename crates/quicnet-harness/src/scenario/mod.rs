//! Scenario-based handshake testing.
//!
//! A scenario fixes a wire script and a client configuration, runs the
//! blocking and the async driver against identical copies of the script,
//! checks that both reached the same [`Outcome`] and put the same packets on
//! the wire, and then hands the observation to a mandatory oracle.
//!
//! ```ignore
//! Scenario::new("refused")
//!     .reply(ReplyBuilder::initial(1).close(2, "busy").build())
//!     .oracle(oracle::refused("busy"))
//!     .run()?;
//! ```

mod builder;
pub mod oracle;

use std::{io, net::SocketAddr};

pub use builder::{RunnableScenario, Scenario};
use quicnet_core::{ConnectError, Connection, HandshakeError, Negotiated, TransportError};
use quicnet_proto::{Packet, ProtocolError};

/// Oracle verifying a scenario's observation.
pub type OracleFn = Box<dyn Fn(&Observed) -> Result<(), String>>;

/// Comparable summary of a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake completed
    Established(Negotiated),
    /// Address could not be parsed
    AddressFormat,
    /// Transport failed with an I/O error of this kind
    Io(io::ErrorKind),
    /// Reply datagram could not be decoded
    Malformed(ProtocolError),
    /// Peer closed the handshake
    Refused {
        /// Close error code
        error_code: u64,
        /// Close reason
        reason: String,
    },
    /// Other handshake failure
    Handshake(HandshakeError),
}

impl Outcome {
    /// Summarize a connect result.
    pub fn of<C>(result: &Result<Connection<C>, ConnectError>) -> Self {
        match result {
            Ok(connection) => Self::Established(*connection.negotiated()),
            Err(ConnectError::AddressFormat { .. }) => Self::AddressFormat,
            Err(ConnectError::Transport(TransportError::Io(err))) => {
                Self::Io(err.kind())
            },
            Err(ConnectError::Transport(TransportError::Malformed(err))) => {
                Self::Malformed(err.clone())
            },
            Err(ConnectError::Connectivity { error_code, reason }) => {
                Self::Refused { error_code: *error_code, reason: reason.clone() }
            },
            Err(ConnectError::Handshake(err)) => Self::Handshake(err.clone()),
        }
    }

    /// Negotiated parameters, if established.
    pub fn negotiated(&self) -> Option<&Negotiated> {
        match self {
            Self::Established(negotiated) => Some(negotiated),
            _ => None,
        }
    }
}

/// What one driver observed during a scenario.
#[derive(Debug, Clone)]
pub struct Observed {
    name: String,
    outcome: Outcome,
    binds: usize,
    peers: Vec<SocketAddr>,
    sent: Vec<Packet>,
}

impl Observed {
    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempt outcome.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Number of channels bound.
    pub fn binds(&self) -> usize {
        self.binds
    }

    /// Peers channels were bound to.
    pub fn peers(&self) -> &[SocketAddr] {
        &self.peers
    }

    /// Packets put on the wire.
    pub fn sent(&self) -> &[Packet] {
        &self.sent
    }
}
