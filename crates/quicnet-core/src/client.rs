//! Client: blocking and async drivers for the handshake state machine.
//!
//! Both drivers run the same loop: execute the current [`HandshakeAction`],
//! feed the outcome back into the [`Handshake`], repeat until it establishes
//! or fails. Nothing about an attempt outlives the call that started it.

use std::fmt;

use quicnet_proto::{
    DEFAULT_MAX_STREAMS, InitialBuilder, MIN_INITIAL_DATAGRAM_SIZE, PROTOCOL_VERSION, Packet,
};
use tracing::{debug, instrument};

use crate::{
    connection::Connection,
    endpoint::resolve_endpoint,
    error::ConnectError,
    handshake::{Handshake, HandshakeAction, Negotiated, SessionParameters},
    transport::{AsyncChannel, AsyncTransport, Channel, Transport},
    udp::UdpTransport,
};

/// Client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Stream cap assumed when the reply carries no MaxStreams frame
    pub default_max_streams: u64,
    /// Version written into the Initial packet
    pub version: u32,
    /// Initial packet is padded to this many bytes (0 disables padding)
    pub min_initial_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_max_streams: DEFAULT_MAX_STREAMS,
            version: PROTOCOL_VERSION,
            min_initial_size: MIN_INITIAL_DATAGRAM_SIZE,
        }
    }
}

/// Handshake client over transport `T`.
///
/// Holds no per-attempt state, so one client can run any number of
/// sequential or concurrent attempts.
#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
    builder: InitialBuilder,
    config: ClientConfig,
}

impl Client<UdpTransport> {
    /// Client over UDP with default configuration.
    pub fn new() -> Self {
        Self::with_transport(UdpTransport::default(), ClientConfig::default())
    }
}

impl Default for Client<UdpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Client<T> {
    /// Client over `transport`.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let builder =
            InitialBuilder::new(config.version).with_min_datagram_size(config.min_initial_size);
        Self { transport, builder, config }
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn handshake(&self) -> Handshake {
        Handshake::new(SessionParameters::new(self.config.default_max_streams))
    }
}

impl<T: Transport> Client<T> {
    /// Perform the handshake, blocking the calling thread.
    ///
    /// Sends one Initial packet, waits for exactly one reply and returns the
    /// established connection. There are no retries; a lost reply surfaces as
    /// the transport's timeout.
    ///
    /// # Errors
    /// - `AddressFormat` if `address` is not an IP literal (nothing is bound)
    /// - `Transport` if binding, sending or receiving fails
    /// - `Connectivity` if the peer closed the handshake
    /// - `Handshake` if the reply is not an Initial packet
    #[instrument(level = "debug", skip(self))]
    pub fn connect(
        &self,
        address: &str,
        port: u16,
    ) -> Result<Connection<T::Channel>, ConnectError> {
        let peer = resolve_endpoint(address, port)?;
        let mut channel = Transport::bind(&self.transport, peer)?;
        let mut handshake = self.handshake();

        let mut action = handshake.start(&self.builder)?;
        loop {
            action = match action {
                HandshakeAction::SendPacket(packet) => {
                    Channel::send(&mut channel, &packet)
                        .inspect_err(|err| aborted(&mut handshake, err))?;
                    debug!(%peer, bytes = packet.encoded_len(), "initial packet sent");
                    handshake.packet_sent()?
                },
                HandshakeAction::AwaitReply => {
                    let reply = Channel::recv(&mut channel)
                        .inspect_err(|err| aborted(&mut handshake, err))?;
                    received(&reply);
                    handshake.receive_reply(&reply).inspect_err(|err| aborted(&mut handshake, err))?
                },
                HandshakeAction::Establish(negotiated) => {
                    established(&negotiated);
                    return Ok(Connection::new(channel, negotiated));
                },
            };
        }
    }
}

impl<T: AsyncTransport> Client<T> {
    /// Perform the handshake without blocking the thread.
    ///
    /// Same transitions and errors as [`Client::connect`]. Dropping the
    /// returned future cancels the attempt; the next call starts fresh.
    ///
    /// # Errors
    /// See [`Client::connect`].
    #[instrument(level = "debug", skip(self))]
    pub async fn connect_async(
        &self,
        address: &str,
        port: u16,
    ) -> Result<Connection<T::Channel>, ConnectError> {
        let peer = resolve_endpoint(address, port)?;
        let mut channel = AsyncTransport::bind(&self.transport, peer).await?;
        let mut handshake = self.handshake();

        let mut action = handshake.start(&self.builder)?;
        loop {
            action = match action {
                HandshakeAction::SendPacket(packet) => {
                    AsyncChannel::send(&mut channel, &packet)
                        .await
                        .inspect_err(|err| aborted(&mut handshake, err))?;
                    debug!(%peer, bytes = packet.encoded_len(), "initial packet sent");
                    handshake.packet_sent()?
                },
                HandshakeAction::AwaitReply => {
                    let reply = AsyncChannel::recv(&mut channel)
                        .await
                        .inspect_err(|err| aborted(&mut handshake, err))?;
                    received(&reply);
                    handshake.receive_reply(&reply).inspect_err(|err| aborted(&mut handshake, err))?
                },
                HandshakeAction::Establish(negotiated) => {
                    established(&negotiated);
                    return Ok(Connection::new(channel, negotiated));
                },
            };
        }
    }
}

fn aborted(handshake: &mut Handshake, err: &impl fmt::Display) {
    handshake.abort();
    debug!(%err, "handshake aborted");
}

fn received(reply: &Packet) {
    debug!(packet_type = %reply.packet_type(), frames = reply.frames().len(), "reply received");
}

fn established(negotiated: &Negotiated) {
    debug!(
        connection_id = %negotiated.connection_id,
        max_streams = negotiated.max_streams,
        "handshake established"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_protocol_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.default_max_streams, 128);
        assert_eq!(config.version, PROTOCOL_VERSION);
        assert_eq!(config.min_initial_size, 1200);
    }

    #[test]
    fn builder_follows_config() {
        let config = ClientConfig { version: 7, min_initial_size: 0, ..ClientConfig::default() };
        let client = Client::with_transport(UdpTransport::default(), config);

        assert_eq!(client.builder.version(), 7);
        assert_eq!(client.builder.min_datagram_size(), 0);
        assert_eq!(client.config(), &config);
    }
}
