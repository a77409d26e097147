//! Peer reply construction.

use quicnet_proto::{ConnectionId, Frame, PROTOCOL_VERSION, Packet, PacketType};

/// Builds the packet a peer sends back to an Initial.
///
/// Frames are emitted in the order they were added.
#[derive(Debug, Clone)]
pub struct ReplyBuilder {
    packet_type: PacketType,
    source_id: ConnectionId,
    destination_id: ConnectionId,
    frames: Vec<Frame>,
}

impl ReplyBuilder {
    /// Initial reply declaring `source_id` as the peer's identifier.
    pub fn initial(source_id: u32) -> Self {
        Self::of_type(PacketType::Initial, source_id)
    }

    /// Reply of an arbitrary long-header type.
    pub fn of_type(packet_type: PacketType, source_id: u32) -> Self {
        Self {
            packet_type,
            source_id: ConnectionId::new(source_id),
            destination_id: ConnectionId::ZERO,
            frames: Vec::new(),
        }
    }

    /// Address the reply to `destination_id`.
    #[must_use]
    pub fn to(mut self, destination_id: ConnectionId) -> Self {
        self.destination_id = destination_id;
        self
    }

    /// Append a bidirectional MaxStreams frame.
    #[must_use]
    pub fn max_streams(self, maximum: u64) -> Self {
        self.frame(Frame::max_streams(maximum))
    }

    /// Append a transport ConnectionClose frame.
    #[must_use]
    pub fn close(self, error_code: u64, reason: &str) -> Self {
        self.frame(Frame::close(error_code, reason))
    }

    /// Append `length` bytes of padding.
    #[must_use]
    pub fn padding(self, length: usize) -> Self {
        self.frame(Frame::Padding { length })
    }

    /// Append any frame.
    #[must_use]
    pub fn frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Finish the packet.
    pub fn build(self) -> Packet {
        self.frames.into_iter().fold(
            Packet::new(self.packet_type, PROTOCOL_VERSION, self.destination_id, self.source_id, 0),
            Packet::with_frame,
        )
    }
}
