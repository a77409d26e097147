//! Initial packet construction.

use crate::{
    MIN_INITIAL_DATAGRAM_SIZE, PROTOCOL_VERSION,
    connection_id::ConnectionId,
    packet::{Packet, PacketType},
};

/// Produces the first packet of a handshake.
///
/// Implementations must be pure: the same seeds always yield the same packet.
pub trait PacketBuilder {
    /// Build an Initial packet declaring `source_id` as the sender's
    /// identifier and addressed to `destination_id`.
    fn build_initial(&self, source_id: ConnectionId, destination_id: ConnectionId) -> Packet;
}

/// Default builder: packet number 0, no token, trailing padding up to the
/// minimum Initial datagram size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialBuilder {
    version: u32,
    min_datagram_size: usize,
}

impl InitialBuilder {
    /// Builder for `version` padding to [`MIN_INITIAL_DATAGRAM_SIZE`].
    pub fn new(version: u32) -> Self {
        Self { version, min_datagram_size: MIN_INITIAL_DATAGRAM_SIZE }
    }

    /// Override the padding target. Zero disables padding.
    #[must_use]
    pub fn with_min_datagram_size(mut self, size: usize) -> Self {
        self.min_datagram_size = size;
        self
    }

    /// Version written into built packets.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Padding target in bytes.
    pub fn min_datagram_size(&self) -> usize {
        self.min_datagram_size
    }
}

impl Default for InitialBuilder {
    fn default() -> Self {
        Self::new(PROTOCOL_VERSION)
    }
}

impl PacketBuilder for InitialBuilder {
    fn build_initial(&self, source_id: ConnectionId, destination_id: ConnectionId) -> Packet {
        let mut packet = Packet::new(PacketType::Initial, self.version, destination_id, source_id, 0);
        packet.pad_to(self.min_datagram_size);
        packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frame;

    #[test]
    fn pads_first_contact_packet_to_minimum_size() {
        let packet = InitialBuilder::default().build_initial(ConnectionId::ZERO, ConnectionId::ZERO);

        assert_eq!(packet.packet_type(), PacketType::Initial);
        assert_eq!(packet.packet_number(), 0);
        assert!(packet.source_id().is_zero());
        assert!(packet.destination_id().is_zero());
        assert_eq!(packet.encoded_len(), MIN_INITIAL_DATAGRAM_SIZE);
        assert!(matches!(packet.frames(), [Frame::Padding { .. }]));
    }

    #[test]
    fn same_seeds_give_same_packet() {
        let builder = InitialBuilder::new(7).with_min_datagram_size(300);
        let a = builder.build_initial(ConnectionId::new(1), ConnectionId::new(2));
        let b = builder.build_initial(ConnectionId::new(1), ConnectionId::new(2));

        assert_eq!(a, b);
        assert_eq!(a.version(), 7);
        assert_eq!(a.source_id(), ConnectionId::new(1));
        assert_eq!(a.destination_id(), ConnectionId::new(2));
    }

    #[test]
    fn zero_target_disables_padding() {
        let packet = InitialBuilder::default()
            .with_min_datagram_size(0)
            .build_initial(ConnectionId::ZERO, ConnectionId::ZERO);

        assert!(packet.frames().is_empty());
    }
}
