//! Fuzz target for long-header packet decoding.
//!
//! Any datagram must decode or fail cleanly; a packet that decodes must
//! re-encode to a datagram that decodes to the same packet.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quicnet_proto::{Packet, PacketType};

fuzz_target!(|data: &[u8]| {
    let Ok(packet) = Packet::decode(data) else {
        return;
    };
    assert_ne!(packet.packet_type(), PacketType::Retry);

    let encoded = packet.to_bytes().expect("decoded packet re-encodes");
    assert_eq!(encoded.len(), packet.encoded_len());

    let again = Packet::decode(&encoded).expect("re-encoded packet decodes");
    assert_eq!(again, packet);
});
