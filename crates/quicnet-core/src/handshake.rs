//! Client handshake state machine.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods validate the current state, transition, and return the next
//!   [`HandshakeAction`] for the driver
//! - The machine performs no I/O and keeps no clock
//! - Drivers (blocking or async) execute actions and feed results back
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start ┌──────┐ packet_sent ┌───────────────┐ receive_reply ┌─────────────┐
//! │ Init │──────>│ Sent │────────────>│ AwaitingReply │──────────────>│ Established │
//! └──────┘       └──────┘             └───────────────┘               └─────────────┘
//!                    │                        │
//!                    │ abort                  │ close frame / bad reply / abort
//!                    ↓                        ↓
//!               ┌─────────┐              ┌─────────┐
//!               │ Aborted │              │ Aborted │
//!               └─────────┘              └─────────┘
//! ```
//!
//! # Frame classification
//!
//! The reply's frames are scanned front to back and every frame is visited.
//! Padding is skipped rather than treated as the end of the scan, so control
//! frames are honoured wherever the peer placed them relative to padding.

use quicnet_proto::{ConnectionId, DEFAULT_MAX_STREAMS, Frame, Packet, PacketBuilder, PacketType};

use crate::error::HandshakeError;

/// Actions returned by the handshake state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Transmit this packet to the peer
    SendPacket(Packet),

    /// Wait for exactly one reply packet
    AwaitReply,

    /// Handshake complete; build the connection from these parameters
    Establish(Negotiated),
}

/// Handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet
    Init,
    /// Initial packet handed to the driver for transmission
    Sent,
    /// Initial packet on the wire, waiting for the reply
    AwaitingReply,
    /// Reply accepted
    Established,
    /// Attempt failed; terminal
    Aborted,
}

/// Parameters accumulated while one handshake is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParameters {
    max_streams: u64,
}

impl SessionParameters {
    /// Parameters starting from `default_max_streams`.
    pub fn new(default_max_streams: u64) -> Self {
        Self { max_streams: default_max_streams }
    }

    /// Current stream cap.
    pub fn max_streams(&self) -> u64 {
        self.max_streams
    }
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STREAMS)
    }
}

/// Connection parameters produced by a completed handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Identifier used for the local side
    pub connection_id: ConnectionId,
    /// Identifier used for the peer side
    pub peer_connection_id: ConnectionId,
    /// Stream cap in effect once established
    pub max_streams: u64,
}

/// Apply a reply's frames to `params`.
///
/// Returns [`HandshakeError::PeerClosed`] at the first ConnectionClose frame.
/// A MaxStreams frame replaces the current cap, so the last one before any
/// close wins. Both stream directions share the one cap.
pub fn classify_frames(
    frames: &[Frame],
    params: &mut SessionParameters,
) -> Result<(), HandshakeError> {
    for frame in frames {
        match frame {
            Frame::ConnectionClose { error_code, reason, .. } => {
                return Err(HandshakeError::PeerClosed {
                    error_code: *error_code,
                    reason: reason.clone(),
                });
            },
            Frame::MaxStreams { maximum, .. } => params.max_streams = *maximum,
            Frame::Padding { .. } | Frame::Ping | Frame::MaxData { .. } => {},
        }
    }
    Ok(())
}

/// Handshake state machine for one connection attempt.
///
/// Owns the attempt's [`SessionParameters`]; they are read once when the
/// reply is accepted and copied into [`Negotiated`].
#[derive(Debug, Clone)]
pub struct Handshake {
    state: HandshakeState,
    params: SessionParameters,
}

impl Handshake {
    /// Create a handshake in `Init` state.
    pub fn new(params: SessionParameters) -> Self {
        Self { state: HandshakeState::Init, params }
    }

    /// Get current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Parameters accumulated so far.
    pub fn parameters(&self) -> &SessionParameters {
        &self.params
    }

    /// Build the Initial packet from zero seeds and move to `Sent`.
    ///
    /// # Errors
    /// Returns `InvalidState` if not in `Init` state
    pub fn start(
        &mut self,
        builder: &impl PacketBuilder,
    ) -> Result<HandshakeAction, HandshakeError> {
        self.require(HandshakeState::Init, "start")?;

        let packet = builder.build_initial(ConnectionId::ZERO, ConnectionId::ZERO);
        self.state = HandshakeState::Sent;
        Ok(HandshakeAction::SendPacket(packet))
    }

    /// Record that the Initial packet was transmitted.
    ///
    /// # Errors
    /// Returns `InvalidState` if not in `Sent` state
    pub fn packet_sent(&mut self) -> Result<HandshakeAction, HandshakeError> {
        self.require(HandshakeState::Sent, "packet_sent")?;

        self.state = HandshakeState::AwaitingReply;
        Ok(HandshakeAction::AwaitReply)
    }

    /// Process the peer's reply.
    ///
    /// On success the peer's declared source identifier becomes both the
    /// local and the peer identifier for this initial phase.
    ///
    /// # Errors
    /// - `InvalidState` if not in `AwaitingReply` state (state unchanged)
    /// - `UnexpectedPacket` if the reply is not an Initial packet
    /// - `PeerClosed` if the reply carries a ConnectionClose frame
    pub fn receive_reply(&mut self, reply: &Packet) -> Result<HandshakeAction, HandshakeError> {
        self.require(HandshakeState::AwaitingReply, "receive_reply")?;

        if reply.packet_type() != PacketType::Initial {
            self.state = HandshakeState::Aborted;
            return Err(HandshakeError::UnexpectedPacket { packet_type: reply.packet_type() });
        }

        if let Err(err) = classify_frames(reply.frames(), &mut self.params) {
            self.state = HandshakeState::Aborted;
            return Err(err);
        }

        self.state = HandshakeState::Established;
        let id = reply.source_id();
        Ok(HandshakeAction::Establish(Negotiated {
            connection_id: id,
            peer_connection_id: id,
            max_streams: self.params.max_streams(),
        }))
    }

    /// Transition to `Aborted`. Drivers call this when the transport fails.
    pub fn abort(&mut self) {
        self.state = HandshakeState::Aborted;
    }

    fn require(
        &self,
        expected: HandshakeState,
        operation: &'static str,
    ) -> Result<(), HandshakeError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HandshakeError::InvalidState { state: self.state, operation })
        }
    }
}
