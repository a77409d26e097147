//! Scripted in-memory transport.
//!
//! Replays a fixed sequence of [`WireEvent`]s. Every bind starts from a fresh
//! copy of the script, so one transport can serve repeated attempts and both
//! drivers observe identical input.

use std::{
    collections::VecDeque,
    io,
    net::SocketAddr,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use quicnet_core::{AsyncChannel, AsyncTransport, Channel, Transport, TransportError};
use quicnet_proto::Packet;

/// One step of the wire script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// Next send fails with this error kind
    SendFails(io::ErrorKind),
    /// Next receive yields this packet
    Reply(Packet),
    /// Next receive yields these raw bytes, decoded as a datagram
    Datagram(Vec<u8>),
    /// Next receive fails with this error kind
    ReceiveFails(io::ErrorKind),
    /// Next receive never completes on the async path and times out on the
    /// blocking path
    Silence,
}

/// Everything the transport observed, shared by all channels it bound.
#[derive(Debug, Default)]
pub struct WireLog {
    binds: AtomicUsize,
    peers: Mutex<Vec<SocketAddr>>,
    sent: Mutex<Vec<Packet>>,
}

impl WireLog {
    /// Number of successful binds.
    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    /// Peers that channels were bound to, in order.
    pub fn peers(&self) -> Vec<SocketAddr> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Packets accepted by `send`, in order.
    pub fn sent(&self) -> Vec<Packet> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record_bind(&self, peer: SocketAddr) {
        self.binds.fetch_add(1, Ordering::SeqCst);
        self.peers.lock().unwrap_or_else(PoisonError::into_inner).push(peer);
    }

    fn record_send(&self, packet: &Packet) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(packet.clone());
    }
}

/// Transport that replays a wire script.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    script: Vec<WireEvent>,
    bind_error: Option<io::ErrorKind>,
    log: Arc<WireLog>,
}

impl ScriptedTransport {
    /// Transport replaying `script` on every bind.
    pub fn new(script: Vec<WireEvent>) -> Self {
        Self { script, bind_error: None, log: Arc::new(WireLog::default()) }
    }

    /// Transport whose peer answers with `reply`.
    pub fn replying(reply: Packet) -> Self {
        Self::new(vec![WireEvent::Reply(reply)])
    }

    /// Transport whose bind always fails with `kind`.
    pub fn failing_bind(kind: io::ErrorKind) -> Self {
        Self { bind_error: Some(kind), ..Self::new(Vec::new()) }
    }

    /// The script replayed on each bind.
    pub fn script(&self) -> &[WireEvent] {
        &self.script
    }

    /// Shared observation log.
    pub fn log(&self) -> &Arc<WireLog> {
        &self.log
    }

    fn open(&self, peer: SocketAddr) -> io::Result<ScriptedChannel> {
        if let Some(kind) = self.bind_error {
            return Err(io::Error::new(kind, "scripted bind failure"));
        }
        self.log.record_bind(peer);
        Ok(ScriptedChannel {
            events: self.script.iter().cloned().collect(),
            log: Arc::clone(&self.log),
        })
    }
}

impl Transport for ScriptedTransport {
    type Channel = ScriptedChannel;

    fn bind(&self, peer: SocketAddr) -> io::Result<ScriptedChannel> {
        self.open(peer)
    }
}

#[async_trait]
impl AsyncTransport for ScriptedTransport {
    type Channel = ScriptedChannel;

    async fn bind(&self, peer: SocketAddr) -> io::Result<ScriptedChannel> {
        tokio::task::yield_now().await;
        self.open(peer)
    }
}

/// Channel consuming the remaining script.
#[derive(Debug)]
pub struct ScriptedChannel {
    events: VecDeque<WireEvent>,
    log: Arc<WireLog>,
}

impl ScriptedChannel {
    /// Events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl Channel for ScriptedChannel {
    fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        if let Some(WireEvent::SendFails(kind)) = self.events.front() {
            let kind = *kind;
            self.events.pop_front();
            return Err(io::Error::new(kind, "scripted send failure").into());
        }
        self.log.record_send(packet);
        Ok(())
    }

    fn recv(&mut self) -> Result<Packet, TransportError> {
        match self.events.pop_front() {
            Some(WireEvent::Reply(packet)) => Ok(packet),
            Some(WireEvent::Datagram(bytes)) => Ok(Packet::decode(&bytes)?),
            Some(WireEvent::ReceiveFails(kind)) => {
                Err(io::Error::new(kind, "scripted receive failure").into())
            },
            // Script exhausted or out of step: nothing arrives
            Some(WireEvent::Silence | WireEvent::SendFails(_)) | None => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "scripted silence").into())
            },
        }
    }
}

#[async_trait]
impl AsyncChannel for ScriptedChannel {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        tokio::task::yield_now().await;
        Channel::send(self, packet)
    }

    async fn recv(&mut self) -> Result<Packet, TransportError> {
        tokio::task::yield_now().await;
        if matches!(self.events.front(), Some(WireEvent::Silence)) {
            std::future::pending::<()>().await;
        }
        Channel::recv(self)
    }
}

#[cfg(test)]
mod tests {
    use quicnet_proto::{ConnectionId, PROTOCOL_VERSION, PacketType};

    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 4433))
    }

    fn packet() -> Packet {
        Packet::new(PacketType::Initial, PROTOCOL_VERSION, ConnectionId::ZERO, ConnectionId::new(3), 0)
    }

    #[test]
    fn every_bind_replays_the_whole_script() {
        let transport = ScriptedTransport::replying(packet());

        for _ in 0..2 {
            let mut channel = Transport::bind(&transport, peer()).unwrap();
            assert_eq!(Channel::recv(&mut channel).unwrap(), packet());
            assert_eq!(channel.remaining(), 0);
        }
        assert_eq!(transport.log().binds(), 2);
        assert_eq!(transport.log().peers(), vec![peer(), peer()]);
    }

    #[test]
    fn exhausted_script_times_out() {
        let mut channel = Transport::bind(&ScriptedTransport::new(Vec::new()), peer()).unwrap();
        let err = Channel::recv(&mut channel).unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::TimedOut));
    }

    #[test]
    fn send_failure_is_consumed_once() {
        let transport = ScriptedTransport::new(vec![WireEvent::SendFails(io::ErrorKind::BrokenPipe)]);
        let mut channel = Transport::bind(&transport, peer()).unwrap();

        assert!(Channel::send(&mut channel, &packet()).is_err());
        assert!(Channel::send(&mut channel, &packet()).is_ok());
        assert_eq!(transport.log().sent().len(), 1);
    }

    #[test]
    fn failing_bind_records_nothing() {
        let transport = ScriptedTransport::failing_bind(io::ErrorKind::AddrInUse);
        let err = Transport::bind(&transport, peer()).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        assert_eq!(transport.log().binds(), 0);
    }
}
