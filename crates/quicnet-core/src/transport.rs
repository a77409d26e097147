//! Transport abstraction for the handshake.
//!
//! A transport binds one channel per connection attempt; a channel moves whole
//! packets to and from a single peer. Each exists in a blocking and an async
//! form so the same handshake can be driven either way.
//!
//! Production uses UDP sockets ([`crate::udp`]); tests use scripted in-memory
//! channels or turmoil's simulated UDP.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use quicnet_proto::Packet;

use crate::error::TransportError;

/// Blocking transport: binds a channel to a peer.
pub trait Transport {
    /// Channel produced for each attempt.
    type Channel: Channel;

    /// Bind a fresh channel to `peer`.
    fn bind(&self, peer: SocketAddr) -> io::Result<Self::Channel>;
}

/// Blocking packet channel to one peer.
pub trait Channel {
    /// Send one packet. Blocks until handed to the network.
    fn send(&mut self, packet: &Packet) -> Result<(), TransportError>;

    /// Receive exactly one packet. Blocks until one arrives or the channel's
    /// timeout expires.
    fn recv(&mut self) -> Result<Packet, TransportError>;
}

/// Async transport: binds a channel to a peer without blocking the thread.
#[async_trait]
pub trait AsyncTransport: Send + Sync + 'static {
    /// Channel produced for each attempt.
    type Channel: AsyncChannel;

    /// Bind a fresh channel to `peer`.
    async fn bind(&self, peer: SocketAddr) -> io::Result<Self::Channel>;
}

/// Async packet channel to one peer.
///
/// A caller wanting a deadline races [`AsyncChannel::recv`] against a timer;
/// dropping the future abandons the receive.
#[async_trait]
pub trait AsyncChannel: Send + 'static {
    /// Send one packet.
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError>;

    /// Receive exactly one packet.
    async fn recv(&mut self) -> Result<Packet, TransportError>;
}
