//! Simulated UDP transport using turmoil.
//!
//! Runs the async handshake driver over turmoil's deterministic network, so
//! tests can inject latency and partitions. Only usable inside a turmoil
//! simulation.

use std::{
    fmt, io,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use quicnet_core::{AsyncChannel, AsyncTransport, TransportError};
use quicnet_proto::{MAX_DATAGRAM_SIZE, Packet};
use tracing::trace;
use turmoil::net::UdpSocket;

/// Async transport over turmoil UDP.
#[derive(Debug, Clone, Copy)]
pub struct SimTransport {
    receive_timeout: Duration,
}

impl SimTransport {
    /// Transport whose receives give up after `receive_timeout` of simulated
    /// time.
    pub fn new(receive_timeout: Duration) -> Self {
        Self { receive_timeout }
    }

    /// Receive deadline.
    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }
}

impl Default for SimTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl AsyncTransport for SimTransport {
    type Channel = SimChannel;

    async fn bind(&self, peer: SocketAddr) -> io::Result<SimChannel> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))).await?;
        trace!(local = %socket.local_addr()?, %peer, "bound simulated udp channel");

        Ok(SimChannel {
            socket,
            peer,
            receive_timeout: self.receive_timeout,
            buf: vec![0; MAX_DATAGRAM_SIZE],
        })
    }
}

/// Simulated UDP channel to one peer.
///
/// turmoil sockets are not connected, so datagrams from other senders are
/// filtered here.
pub struct SimChannel {
    socket: UdpSocket,
    peer: SocketAddr,
    receive_timeout: Duration,
    buf: Vec<u8>,
}

impl fmt::Debug for SimChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimChannel")
            .field("peer", &self.peer)
            .field("receive_timeout", &self.receive_timeout)
            .finish_non_exhaustive()
    }
}

impl SimChannel {
    /// Peer this channel talks to.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    async fn recv_from_peer(&mut self) -> io::Result<usize> {
        loop {
            let (len, from) = self.socket.recv_from(&mut self.buf).await?;
            if from == self.peer {
                return Ok(len);
            }
            trace!(%from, "dropped datagram from unexpected sender");
        }
    }
}

#[async_trait]
impl AsyncChannel for SimChannel {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let datagram = packet.to_bytes()?;
        self.socket.send_to(&datagram, self.peer).await?;
        trace!(bytes = datagram.len(), peer = %self.peer, "datagram sent");
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, TransportError> {
        let limit = self.receive_timeout;
        let len = tokio::time::timeout(limit, self.recv_from_peer())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no reply in simulated time"))??;
        trace!(bytes = len, peer = %self.peer, "datagram received");
        Ok(Packet::decode(&self.buf[..len])?)
    }
}
