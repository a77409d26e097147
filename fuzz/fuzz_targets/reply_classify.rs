//! Fuzz target for handshake reply processing.
//!
//! Feeds arbitrary datagrams to a handshake awaiting its reply. The machine
//! must end Established or Aborted, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quicnet_core::{Handshake, HandshakeAction, HandshakeState, SessionParameters};
use quicnet_proto::{InitialBuilder, Packet};

fuzz_target!(|data: &[u8]| {
    let Ok(reply) = Packet::decode(data) else {
        return;
    };

    let mut handshake = Handshake::new(SessionParameters::default());
    handshake.start(&InitialBuilder::default()).expect("fresh handshake starts");
    handshake.packet_sent().expect("sent after start");

    match handshake.receive_reply(&reply) {
        Ok(HandshakeAction::Establish(negotiated)) => {
            assert_eq!(handshake.state(), HandshakeState::Established);
            assert_eq!(negotiated.connection_id, reply.source_id());
        },
        Ok(other) => panic!("unexpected action {other:?}"),
        Err(_) => assert_eq!(handshake.state(), HandshakeState::Aborted),
    }
});
