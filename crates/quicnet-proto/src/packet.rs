//! Long-header packets.
//!
//! ```text
//! +--------+---------+-----+------+-----+------+-------+--------+----+--------+
//! | flags  | version | len | DCID | len | SCID | token | Length | PN | frames |
//! | 1 byte | 4 bytes |  1  |  4   |  1  |  4   | (*)   | varint | 4  |  ...   |
//! +--------+---------+-----+------+-----+------+-------+--------+----+--------+
//! ```
//!
//! `flags` is `1 1 T T 0 0 1 1`: long form, fixed bit, two type bits, and a
//! 4-byte packet number. The token (varint length + bytes) is present only on
//! Initial packets. Length covers the packet number and the frames.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::{
    connection_id::ConnectionId,
    errors::{ProtocolError, Result},
    frame::Frame,
    varint::{self, ensure},
};

const LONG_FORM: u8 = 0b1000_0000;
const FIXED_BIT: u8 = 0b0100_0000;
const PACKET_NUMBER_LEN: usize = 4;
const PACKET_NUMBER_BITS: u8 = 0b0000_0011;

/// Long-header packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// First packet of a handshake
    Initial,
    /// Early data
    ZeroRtt,
    /// Handshake continuation
    Handshake,
    /// Server-initiated retry
    Retry,
}

impl PacketType {
    const fn bits(self) -> u8 {
        match self {
            Self::Initial => 0b00,
            Self::ZeroRtt => 0b01,
            Self::Handshake => 0b10,
            Self::Retry => 0b11,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Initial,
            0b01 => Self::ZeroRtt,
            0b10 => Self::Handshake,
            _ => Self::Retry,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "Initial",
            Self::ZeroRtt => "0-RTT",
            Self::Handshake => "Handshake",
            Self::Retry => "Retry",
        };
        f.write_str(name)
    }
}

/// A long-header packet carrying an ordered frame sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    packet_type: PacketType,
    version: u32,
    destination_id: ConnectionId,
    source_id: ConnectionId,
    token: Vec<u8>,
    packet_number: u32,
    frames: Vec<Frame>,
}

impl Packet {
    /// Empty packet with the given header fields.
    ///
    /// Retry packets cannot be encoded by this model; callers use the other
    /// three types.
    pub fn new(
        packet_type: PacketType,
        version: u32,
        destination_id: ConnectionId,
        source_id: ConnectionId,
        packet_number: u32,
    ) -> Self {
        Self {
            packet_type,
            version,
            destination_id,
            source_id,
            token: Vec::new(),
            packet_number,
            frames: Vec::new(),
        }
    }

    /// Packet type from the header.
    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// Version from the header.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Identifier the sender addressed this packet to.
    pub fn destination_id(&self) -> ConnectionId {
        self.destination_id
    }

    /// Identifier the sender declared as its own.
    pub fn source_id(&self) -> ConnectionId {
        self.source_id
    }

    /// Address validation token (Initial packets only).
    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// Packet number.
    pub fn packet_number(&self) -> u32 {
        self.packet_number
    }

    /// Frames in wire order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Append a frame.
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Builder-style [`Packet::push_frame`].
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Builder-style token setter.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<Vec<u8>>) -> Self {
        self.token = token.into();
        self
    }

    /// Append trailing padding until the encoded size reaches `target`.
    ///
    /// The result never exceeds `target`. When the padding pushes the Length
    /// field to a wider encoding the packet can end short by that growth.
    pub fn pad_to(&mut self, target: usize) {
        let mut padding = target.saturating_sub(self.encoded_len());
        while padding > 0 {
            self.frames.push(Frame::Padding { length: padding });
            let len = self.encoded_len();
            if len <= target {
                break;
            }
            self.frames.pop();
            padding = padding.saturating_sub(len - target);
        }
    }

    fn payload_len(&self) -> usize {
        PACKET_NUMBER_LEN + self.frames.iter().map(Frame::encoded_len).sum::<usize>()
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        let payload = self.payload_len();
        let token = if self.packet_type == PacketType::Initial {
            varint::encoded_len(self.token.len() as u64) + self.token.len()
        } else {
            0
        };

        1 + 4 + 2 * (1 + ConnectionId::LEN) + token + varint::encoded_len(payload as u64) + payload
    }

    /// Append the encoded packet to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        if self.packet_type == PacketType::Retry {
            return Err(ProtocolError::UnsupportedPacketType(self.packet_type));
        }

        buf.put_u8(LONG_FORM | FIXED_BIT | (self.packet_type.bits() << 4) | PACKET_NUMBER_BITS);
        buf.put_u32(self.version);
        for id in [self.destination_id, self.source_id] {
            buf.put_u8(ConnectionId::LEN as u8);
            buf.put_u32(id.get());
        }
        if self.packet_type == PacketType::Initial {
            varint::encode(self.token.len() as u64, buf)?;
            buf.put_slice(&self.token);
        }

        varint::encode(self.payload_len() as u64, buf)?;
        buf.put_u32(self.packet_number);
        for frame in &self.frames {
            frame.encode(buf)?;
        }
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out)?;
        Ok(out)
    }

    /// Decode the first packet in `datagram`.
    ///
    /// Bytes after the declared Length (coalesced packets) are ignored.
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        let mut buf = datagram;
        ensure(&buf, 1)?;

        let flags = buf.get_u8();
        if flags & LONG_FORM == 0 || flags & FIXED_BIT == 0 {
            return Err(ProtocolError::UnsupportedForm(flags));
        }
        let packet_type = PacketType::from_bits(flags >> 4);
        if packet_type == PacketType::Retry {
            return Err(ProtocolError::UnsupportedPacketType(packet_type));
        }

        ensure(&buf, 4)?;
        let version = buf.get_u32();
        let destination_id = read_connection_id(&mut buf)?;
        let source_id = read_connection_id(&mut buf)?;

        let token = if packet_type == PacketType::Initial {
            let declared = varint::decode(&mut buf)?;
            let length = bounded(declared, buf.remaining())?;
            buf.copy_to_bytes(length).to_vec()
        } else {
            Vec::new()
        };

        let declared = varint::decode(&mut buf)?;
        let length = bounded(declared, buf.remaining())?;
        let mut payload = &buf[..length];
        ensure(&payload, PACKET_NUMBER_LEN)?;
        let packet_number = payload.get_u32();
        let frames = Frame::decode_all(payload)?;

        Ok(Self { packet_type, version, destination_id, source_id, token, packet_number, frames })
    }
}

fn read_connection_id(buf: &mut &[u8]) -> Result<ConnectionId> {
    ensure(&*buf, 1)?;
    let length = usize::from(buf.get_u8());
    if length != ConnectionId::LEN {
        return Err(ProtocolError::ConnectionIdLength(length));
    }
    ensure(&*buf, ConnectionId::LEN)?;
    Ok(ConnectionId::new(buf.get_u32()))
}

fn bounded(declared: u64, remaining: usize) -> Result<usize> {
    match usize::try_from(declared) {
        Ok(length) if length <= remaining => Ok(length),
        _ => Err(ProtocolError::LengthMismatch { declared, remaining }),
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::PROTOCOL_VERSION;

    fn reply(source: u32) -> Packet {
        Packet::new(
            PacketType::Initial,
            PROTOCOL_VERSION,
            ConnectionId::ZERO,
            ConnectionId::new(source),
            0,
        )
    }

    #[test]
    fn decodes_fixed_initial() {
        let bytes = hex!(
            "c3 00000001"
            "04 00000000"
            "04 0000abcd"
            "00"
            "07 00000000 12 40 80"
        );

        let packet = Packet::decode(&bytes).unwrap();
        assert_eq!(packet.packet_type(), PacketType::Initial);
        assert_eq!(packet.version(), 1);
        assert_eq!(packet.destination_id(), ConnectionId::ZERO);
        assert_eq!(packet.source_id(), ConnectionId::new(0xabcd));
        assert_eq!(packet.packet_number(), 0);
        assert_eq!(packet.frames(), &[Frame::max_streams(128)]);
    }

    #[test]
    fn encode_then_decode_preserves_frames_and_ids() {
        let packet = reply(0xdead_beef)
            .with_token(b"tok".to_vec())
            .with_frame(Frame::close(0x02, "refused"))
            .with_frame(Frame::Padding { length: 40 });

        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes.len(), packet.encoded_len());
        assert_eq!(Packet::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn handshake_packets_carry_no_token() {
        let packet = Packet::new(
            PacketType::Handshake,
            PROTOCOL_VERSION,
            ConnectionId::new(1),
            ConnectionId::new(2),
            7,
        )
        .with_frame(Frame::Ping);

        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes[0], 0b1110_0011);
        assert_eq!(Packet::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn ignores_coalesced_trailing_bytes() {
        let packet = reply(9).with_frame(Frame::Ping);
        let mut bytes = packet.to_bytes().unwrap();
        bytes.extend_from_slice(&[0xff, 0xff, 0xff]);

        assert_eq!(Packet::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn pad_to_reaches_target_without_exceeding() {
        for target in [60, 100, 1200, 1500] {
            let mut packet = reply(1).with_frame(Frame::max_streams(10));
            packet.pad_to(target);
            let len = packet.encoded_len();
            assert!(len <= target, "len {len} > target {target}");
            assert!(len + 1 >= target, "len {len} too short for {target}");
            assert!(matches!(packet.frames().last(), Some(Frame::Padding { .. })));
        }
    }

    #[test]
    fn pad_to_survives_length_field_growth() {
        // Payloads of 63/64 and 16383/16384 bytes widen the Length field
        for payload in [63, 16_383] {
            for extra in 0..4 {
                let mut packet = reply(1).with_frame(Frame::Padding { length: payload - 4 });
                let target = packet.encoded_len() + extra;
                packet.pad_to(target);

                let len = packet.encoded_len();
                assert!(len <= target, "len {len} > target {target}");
                assert!(len + 6 >= target, "len {len} too short for {target}");
                assert_eq!(packet.to_bytes().unwrap().len(), len);
            }
        }
    }

    #[test]
    fn pad_to_with_one_byte_left_at_length_boundary() {
        // Payload 16383 bytes: one more byte needs a 4-byte Length field
        let mut packet = reply(1).with_frame(Frame::Padding { length: 16_379 });
        assert_eq!(packet.encoded_len(), 16_401);

        packet.pad_to(16_402);
        assert_eq!(packet.encoded_len(), 16_401);
        assert_eq!(packet.frames().len(), 1);
    }

    #[test]
    fn reencoding_a_decoded_padding_run_is_stable() {
        let bytes = hex!("c3 00000001 04 00000000 04 00000001 00 07 00000000 00 00 00");
        let packet = Packet::decode(&bytes).unwrap();
        assert_eq!(packet.frames(), &[Frame::Padding { length: 3 }]);
        assert_eq!(Packet::decode(&packet.to_bytes().unwrap()).unwrap(), packet);

        let bytes = hex!("c3 00000001 04 00000000 04 00000001 00 07 00000000 00 40 00");
        assert_eq!(Packet::decode(&bytes), Err(ProtocolError::NonMinimalFrameType(0x00)));
    }

    #[test]
    fn pad_to_leaves_large_packets_alone() {
        let mut packet = reply(1).with_frame(Frame::Padding { length: 2000 });
        let before = packet.clone();
        packet.pad_to(1200);
        assert_eq!(packet, before);
    }

    #[test]
    fn rejects_short_header() {
        assert_eq!(Packet::decode(&[0x43, 0, 0]), Err(ProtocolError::UnsupportedForm(0x43)));
    }

    #[test]
    fn rejects_retry() {
        let bytes = hex!("f3 00000001");
        assert_eq!(
            Packet::decode(&bytes),
            Err(ProtocolError::UnsupportedPacketType(PacketType::Retry))
        );
    }

    #[test]
    fn rejects_wrong_connection_id_length() {
        let bytes = hex!("c3 00000001 08 0000000000000000");
        assert_eq!(Packet::decode(&bytes), Err(ProtocolError::ConnectionIdLength(8)));
    }

    #[test]
    fn rejects_length_past_end_of_datagram() {
        let bytes = hex!("c3 00000001 04 00000000 04 00000001 00 20 00000000");
        assert_eq!(
            Packet::decode(&bytes),
            Err(ProtocolError::LengthMismatch { declared: 0x20, remaining: 4 })
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(Packet::decode(&[]), Err(ProtocolError::Truncated { needed: 1, available: 0 }));
    }
}
