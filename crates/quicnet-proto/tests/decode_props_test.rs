//! Property tests for the packet decoder.
//!
//! Arbitrary datagrams must either decode or fail with an error; decoding
//! never panics. Packets built from arbitrary handshake frames survive the
//! wire unchanged once adjacent padding runs are merged.

use proptest::prelude::*;
use quicnet_proto::{ConnectionId, Frame, Packet, PacketType, StreamDirection};

fn frame_strategy() -> impl Strategy<Value = Frame> {
    prop_oneof![
        Just(Frame::Ping),
        (0u64..1 << 40).prop_map(|maximum| Frame::MaxData { maximum }),
        (any::<bool>(), 0u64..=1 << 60).prop_map(|(bidi, maximum)| Frame::MaxStreams {
            direction: if bidi {
                StreamDirection::Bidirectional
            } else {
                StreamDirection::Unidirectional
            },
            maximum,
        }),
        (0u64..1 << 30, proptest::option::of(0u64..64), "[a-z ]{0,24}").prop_map(
            |(error_code, frame_type, reason)| Frame::ConnectionClose {
                error_code,
                frame_type,
                reason,
            }
        ),
    ]
}

proptest! {
    #[test]
    fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = Packet::decode(&bytes);
    }

    #[test]
    fn control_frames_survive_the_wire(
        source in any::<u32>(),
        frames in proptest::collection::vec(frame_strategy(), 0..8),
        padding in 0usize..64,
    ) {
        let mut packet = Packet::new(
            PacketType::Initial,
            quicnet_proto::PROTOCOL_VERSION,
            ConnectionId::ZERO,
            ConnectionId::new(source),
            0,
        );
        for frame in frames {
            packet.push_frame(frame);
        }
        if padding > 0 {
            packet.push_frame(Frame::Padding { length: padding });
        }

        let bytes = packet.to_bytes().unwrap();
        prop_assert_eq!(bytes.len(), packet.encoded_len());
        prop_assert_eq!(Packet::decode(&bytes).unwrap(), packet);
    }
}
