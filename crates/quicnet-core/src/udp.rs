//! UDP transports.
//!
//! [`UdpTransport`] implements both [`Transport`] (over `std::net`) and
//! [`AsyncTransport`] (over tokio). Each attempt binds an ephemeral local port
//! of the peer's address family and connects the socket to the peer, so the
//! kernel filters datagrams from other senders.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use bytes::BytesMut;
use quicnet_proto::{MAX_DATAGRAM_SIZE, Packet};
use tracing::trace;

use crate::{
    error::TransportError,
    transport::{AsyncChannel, AsyncTransport, Channel, Transport},
};

/// UDP transport configuration
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Local IP to bind. `None` binds the unspecified address of the peer's
    /// family.
    pub local_ip: Option<IpAddr>,
    /// Deadline for each receive. `None` waits forever.
    pub receive_timeout: Option<Duration>,
    /// Receive buffer size; longer datagrams are truncated by the kernel.
    pub max_datagram_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            local_ip: None,
            receive_timeout: Some(Duration::from_secs(30)),
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl UdpConfig {
    fn local_addr(&self, peer: SocketAddr) -> SocketAddr {
        let ip = self.local_ip.unwrap_or(match peer {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        });
        SocketAddr::new(ip, 0)
    }

    fn timeout(&self) -> Option<Duration> {
        self.receive_timeout.filter(|limit| !limit.is_zero())
    }
}

/// UDP transport for both the blocking and the async handshake path.
#[derive(Debug, Clone, Default)]
pub struct UdpTransport {
    config: UdpConfig,
}

impl UdpTransport {
    /// Create a transport with the given configuration.
    pub fn new(config: UdpConfig) -> Self {
        Self { config }
    }

    /// Transport configuration.
    pub fn config(&self) -> &UdpConfig {
        &self.config
    }
}

impl Transport for UdpTransport {
    type Channel = UdpChannel;

    fn bind(&self, peer: SocketAddr) -> io::Result<UdpChannel> {
        let socket = std::net::UdpSocket::bind(self.config.local_addr(peer))?;
        socket.connect(peer)?;
        socket.set_read_timeout(self.config.timeout())?;
        trace!(local = %socket.local_addr()?, %peer, "bound blocking udp channel");

        Ok(UdpChannel { socket, peer, buf: vec![0; self.config.max_datagram_size] })
    }
}

#[async_trait]
impl AsyncTransport for UdpTransport {
    type Channel = TokioUdpChannel;

    async fn bind(&self, peer: SocketAddr) -> io::Result<TokioUdpChannel> {
        let socket = tokio::net::UdpSocket::bind(self.config.local_addr(peer)).await?;
        socket.connect(peer).await?;
        trace!(local = %socket.local_addr()?, %peer, "bound async udp channel");

        Ok(TokioUdpChannel {
            socket,
            peer,
            receive_timeout: self.config.timeout(),
            buf: vec![0; self.config.max_datagram_size],
        })
    }
}

/// Blocking UDP channel connected to one peer.
#[derive(Debug)]
pub struct UdpChannel {
    socket: std::net::UdpSocket,
    peer: SocketAddr,
    buf: Vec<u8>,
}

impl UdpChannel {
    /// Peer this channel is connected to.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Underlying socket.
    pub fn socket(&self) -> &std::net::UdpSocket {
        &self.socket
    }
}

impl Channel for UdpChannel {
    fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let datagram = encode(packet)?;
        let sent = self.socket.send(&datagram)?;
        trace!(bytes = sent, peer = %self.peer, "datagram sent");
        Ok(())
    }

    fn recv(&mut self) -> Result<Packet, TransportError> {
        // A read timeout surfaces as WouldBlock on Unix and TimedOut on Windows
        let len = self.socket.recv(&mut self.buf).map_err(|err| match err.kind() {
            io::ErrorKind::WouldBlock => timed_out(),
            _ => err,
        })?;
        trace!(bytes = len, peer = %self.peer, "datagram received");
        Ok(Packet::decode(&self.buf[..len])?)
    }
}

/// Async UDP channel connected to one peer.
#[derive(Debug)]
pub struct TokioUdpChannel {
    socket: tokio::net::UdpSocket,
    peer: SocketAddr,
    receive_timeout: Option<Duration>,
    buf: Vec<u8>,
}

impl TokioUdpChannel {
    /// Peer this channel is connected to.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Underlying socket.
    pub fn socket(&self) -> &tokio::net::UdpSocket {
        &self.socket
    }
}

#[async_trait]
impl AsyncChannel for TokioUdpChannel {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let datagram = encode(packet)?;
        let sent = self.socket.send(&datagram).await?;
        trace!(bytes = sent, peer = %self.peer, "datagram sent");
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, TransportError> {
        let receive = self.socket.recv(&mut self.buf);
        let len = match self.receive_timeout {
            Some(limit) => {
                tokio::time::timeout(limit, receive).await.map_err(|_| timed_out())??
            },
            None => receive.await?,
        };
        trace!(bytes = len, peer = %self.peer, "datagram received");
        Ok(Packet::decode(&self.buf[..len])?)
    }
}

fn encode(packet: &Packet) -> Result<BytesMut, TransportError> {
    let mut datagram = BytesMut::with_capacity(packet.encoded_len());
    packet.encode(&mut datagram)?;
    Ok(datagram)
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "no reply before receive timeout")
}
