//! Client driver tests over the scripted transport.
//!
//! Each case runs the blocking driver directly and the async driver on a
//! tokio test runtime.

use std::{io, net::SocketAddr, time::Duration};

use quicnet_core::{Client, ClientConfig, ConnectError, HandshakeError, TransportError};
use quicnet_harness::{ReplyBuilder, ScriptedTransport, WireEvent};
use quicnet_proto::{ConnectionId, DEFAULT_MAX_STREAMS, PacketType, ProtocolError};

fn client(transport: &ScriptedTransport) -> Client<ScriptedTransport> {
    Client::with_transport(transport.clone(), ClientConfig::default())
}

#[test]
fn reply_without_close_establishes() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(0xfeed_beef).build());

    let connection = client(&transport).connect("127.0.0.1", 4433).expect("handshake succeeds");

    assert_eq!(connection.connection_id(), ConnectionId::new(0xfeed_beef));
    assert_eq!(connection.peer_connection_id(), ConnectionId::new(0xfeed_beef));
    assert_eq!(connection.max_streams(), DEFAULT_MAX_STREAMS);
}

#[tokio::test]
async fn reply_without_close_establishes_async() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(0xfeed_beef).build());

    let connection =
        client(&transport).connect_async("127.0.0.1", 4433).await.expect("handshake succeeds");

    assert_eq!(connection.connection_id(), ConnectionId::new(0xfeed_beef));
    assert_eq!(connection.max_streams(), DEFAULT_MAX_STREAMS);
}

#[test]
fn close_frame_fails_with_peer_reason() {
    let reply = ReplyBuilder::initial(5).padding(40).close(0x0b, "R").build();
    let transport = ScriptedTransport::replying(reply);

    let err = client(&transport).connect("127.0.0.1", 4433).unwrap_err();

    assert!(matches!(&err, ConnectError::Connectivity { error_code: 0x0b, reason } if reason == "R"));
    assert_eq!(err.reason(), Some("R"));
}

#[tokio::test]
async fn close_frame_fails_with_peer_reason_async() {
    let reply = ReplyBuilder::initial(5).close(0x0b, "R").max_streams(3).build();
    let transport = ScriptedTransport::replying(reply);

    let err = client(&transport).connect_async("127.0.0.1", 4433).await.unwrap_err();

    assert_eq!(err.reason(), Some("R"));
}

#[test]
fn max_streams_is_negotiated() {
    let reply = ReplyBuilder::initial(1).max_streams(17).padding(900).build();
    let transport = ScriptedTransport::replying(reply);

    let connection = client(&transport).connect("10.0.0.1", 9000).unwrap();
    assert_eq!(connection.max_streams(), 17);
}

#[test]
fn max_streams_after_padding_is_negotiated() {
    // Peers commonly put padding first
    let reply = ReplyBuilder::initial(1).padding(900).max_streams(33).build();
    let transport = ScriptedTransport::replying(reply);

    let connection = client(&transport).connect("10.0.0.1", 9000).unwrap();
    assert_eq!(connection.max_streams(), 33);
}

#[test]
fn configured_default_applies_without_max_streams() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(1).build());
    let config = ClientConfig { default_max_streams: 8, ..ClientConfig::default() };

    let connection = Client::with_transport(transport, config).connect("::1", 1).unwrap();
    assert_eq!(connection.max_streams(), 8);
}

#[test]
fn repeated_attempts_share_nothing() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(77).max_streams(2).build());
    let client = client(&transport);

    let first = client.connect("127.0.0.1", 4433).unwrap();
    let second = client.connect("127.0.0.1", 4433).unwrap();

    assert_eq!(first.negotiated(), second.negotiated());
    assert_eq!(transport.log().binds(), 2);
    assert_eq!(transport.log().sent().len(), 2);
}

#[test]
fn malformed_address_performs_no_io() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(1).build());

    let err = client(&transport).connect("not-an-ip", 443).unwrap_err();

    assert!(matches!(err, ConnectError::AddressFormat { .. }));
    assert_eq!(transport.log().binds(), 0);
    assert!(transport.log().sent().is_empty());
}

#[tokio::test]
async fn malformed_address_performs_no_io_async() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(1).build());

    let err = client(&transport).connect_async("not-an-ip", 443).await.unwrap_err();

    assert!(matches!(err, ConnectError::AddressFormat { .. }));
    assert_eq!(transport.log().binds(), 0);
}

#[test]
fn initial_packet_uses_zero_seeds_and_is_padded() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(1).build());
    client(&transport).connect("127.0.0.1", 4433).unwrap();

    let sent = transport.log().sent();
    let [initial] = sent.as_slice() else {
        panic!("expected one packet, got {}", sent.len());
    };
    assert_eq!(initial.packet_type(), PacketType::Initial);
    assert!(initial.source_id().is_zero());
    assert!(initial.destination_id().is_zero());
    assert!(initial.encoded_len() >= 1199 && initial.encoded_len() <= 1200);
    assert_eq!(transport.log().peers(), vec!["127.0.0.1:4433".parse::<SocketAddr>().unwrap()]);
}

#[test]
fn bind_failure_surfaces_as_transport_error() {
    let transport = ScriptedTransport::failing_bind(io::ErrorKind::AddrNotAvailable);

    let err = client(&transport).connect("127.0.0.1", 4433).unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::AddrNotAvailable));
}

#[test]
fn send_failure_surfaces_unchanged() {
    let transport =
        ScriptedTransport::new(vec![WireEvent::SendFails(io::ErrorKind::PermissionDenied)]);

    let err = client(&transport).connect("127.0.0.1", 4433).unwrap_err();

    assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
    assert!(transport.log().sent().is_empty());
}

#[tokio::test]
async fn receive_failure_surfaces_unchanged_async() {
    let transport =
        ScriptedTransport::new(vec![WireEvent::ReceiveFails(io::ErrorKind::ConnectionRefused)]);

    let err = client(&transport).connect_async("127.0.0.1", 4433).await.unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionRefused));
}

#[test]
fn undecodable_reply_is_malformed() {
    let transport = ScriptedTransport::new(vec![WireEvent::Datagram(vec![0x40, 0x00])]);

    let err = client(&transport).connect("127.0.0.1", 4433).unwrap_err();

    assert!(matches!(
        err,
        ConnectError::Transport(TransportError::Malformed(ProtocolError::UnsupportedForm(0x40)))
    ));
}

#[test]
fn non_initial_reply_is_rejected() {
    let reply = ReplyBuilder::of_type(PacketType::Handshake, 9).build();
    let transport = ScriptedTransport::replying(reply);

    let err = client(&transport).connect("127.0.0.1", 4433).unwrap_err();

    assert!(matches!(
        err,
        ConnectError::Handshake(HandshakeError::UnexpectedPacket {
            packet_type: PacketType::Handshake
        })
    ));
}

#[tokio::test]
async fn racing_receive_against_timer_cancels_attempt() {
    let silent = ScriptedTransport::new(vec![WireEvent::Silence]);

    let client = client(&silent);
    let attempt = client.connect_async("127.0.0.1", 4433);
    let timed_out = tokio::time::timeout(Duration::from_millis(20), attempt).await;

    assert!(timed_out.is_err());
    assert_eq!(silent.log().binds(), 1);
    assert_eq!(silent.log().sent().len(), 1);
}

#[tokio::test]
async fn dropped_attempt_leaves_nothing_behind() {
    let transport = ScriptedTransport::replying(ReplyBuilder::initial(77).max_streams(5).build());
    let client = client(&transport);

    {
        let attempt = client.connect_async("127.0.0.1", 4433);
        tokio::pin!(attempt);
        tokio::select! {
            biased;
            _ = &mut attempt => panic!("attempt finished on its first poll"),
            () = std::future::ready(()) => {},
        }
    }

    let connection = client.connect_async("127.0.0.1", 4433).await.unwrap();
    assert_eq!(connection.max_streams(), 5);
    assert_eq!(transport.log().binds(), 1);
}
