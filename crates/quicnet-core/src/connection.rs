//! Established connection handed back to callers.

use quicnet_proto::ConnectionId;

use crate::handshake::Negotiated;

/// A connection that completed the handshake.
///
/// Owns the channel the handshake ran on together with the negotiated
/// parameters. Built exactly once per successful attempt.
#[derive(Debug)]
pub struct Connection<C> {
    channel: C,
    negotiated: Negotiated,
}

impl<C> Connection<C> {
    pub(crate) fn new(channel: C, negotiated: Negotiated) -> Self {
        Self { channel, negotiated }
    }

    /// Identifier for the local side.
    pub fn connection_id(&self) -> ConnectionId {
        self.negotiated.connection_id
    }

    /// Identifier for the peer side.
    pub fn peer_connection_id(&self) -> ConnectionId {
        self.negotiated.peer_connection_id
    }

    /// Maximum number of streams the peer allows.
    pub fn max_streams(&self) -> u64 {
        self.negotiated.max_streams
    }

    /// All negotiated parameters.
    pub fn negotiated(&self) -> &Negotiated {
        &self.negotiated
    }

    /// Channel the connection runs on.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Mutable access to the channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Split into the channel and the negotiated parameters.
    pub fn into_parts(self) -> (C, Negotiated) {
        (self.channel, self.negotiated)
    }
}
