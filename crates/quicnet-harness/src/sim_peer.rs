//! Simulated handshake peer.
//!
//! Runs as a turmoil host, answering each Initial according to a fixed
//! [`PeerBehavior`]. Connection identifiers come from a seeded RNG so runs
//! are reproducible.

use std::{
    error::Error,
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
};

use quicnet_proto::{ConnectionId, MAX_DATAGRAM_SIZE, Packet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use turmoil::net::UdpSocket;

use crate::reply::ReplyBuilder;

/// UDP port the simulated peer listens on.
pub const PEER_PORT: u16 = 4433;

/// How the peer answers an Initial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerBehavior {
    /// Reply with an Initial carrying leading padding and, if set, a
    /// MaxStreams frame
    Accept {
        /// Stream cap to advertise
        max_streams: Option<u64>,
    },
    /// Reply with a ConnectionClose frame
    Refuse {
        /// Close error code
        error_code: u64,
        /// Close reason phrase
        reason: String,
    },
    /// Receive the Initial and never answer
    Silent,
    /// Reply with this exact packet
    Fixed(Packet),
}

/// Handshake peer for turmoil simulations.
#[derive(Debug, Clone)]
pub struct SimPeer {
    behavior: PeerBehavior,
    rng: ChaCha8Rng,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl SimPeer {
    /// Peer with the given behaviour and RNG seed.
    pub fn new(behavior: PeerBehavior, seed: u64) -> Self {
        Self {
            behavior,
            rng: ChaCha8Rng::seed_from_u64(seed),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Peer accepting every handshake, advertising `max_streams` if given.
    pub fn accepting(max_streams: Option<u64>, seed: u64) -> Self {
        Self::new(PeerBehavior::Accept { max_streams }, seed)
    }

    /// Peer refusing every handshake.
    pub fn refusing(error_code: u64, reason: &str) -> Self {
        Self::new(PeerBehavior::Refuse { error_code, reason: reason.to_string() }, 0)
    }

    /// Peer that never answers.
    pub fn silent() -> Self {
        Self::new(PeerBehavior::Silent, 0)
    }

    /// Raw datagrams received so far, shared across clones.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Connection identifier the peer assigns on its `n`th accepted
    /// handshake (zero-based), given its seed.
    pub fn assigned_id(seed: u64, n: usize) -> ConnectionId {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut id = ConnectionId::ZERO;
        for _ in 0..=n {
            id = ConnectionId::new(rng.r#gen());
        }
        id
    }

    /// Answer `attempts` Initials on [`PEER_PORT`], then return.
    pub async fn serve(mut self, attempts: usize) -> Result<(), Box<dyn Error>> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, PEER_PORT))).await?;
        let mut buf = vec![0; MAX_DATAGRAM_SIZE];

        for _ in 0..attempts {
            let (len, from) = socket.recv_from(&mut buf).await?;
            self.received.lock().unwrap_or_else(PoisonError::into_inner).push(buf[..len].to_vec());

            let initial = Packet::decode(&buf[..len])?;
            debug!(%from, bytes = len, "peer received initial");

            if let Some(reply) = self.reply_to(&initial) {
                socket.send_to(&reply.to_bytes()?, from).await?;
            }
        }
        Ok(())
    }

    fn reply_to(&mut self, initial: &Packet) -> Option<Packet> {
        match &self.behavior {
            PeerBehavior::Accept { max_streams } => {
                let id = self.rng.r#gen::<u32>();
                let reply = ReplyBuilder::initial(id).to(initial.source_id()).padding(64);
                Some(match max_streams {
                    Some(maximum) => reply.max_streams(*maximum).build(),
                    None => reply.build(),
                })
            },
            PeerBehavior::Refuse { error_code, reason } => {
                Some(ReplyBuilder::initial(0).to(initial.source_id()).close(*error_code, reason).build())
            },
            PeerBehavior::Silent => None,
            PeerBehavior::Fixed(packet) => Some(packet.clone()),
        }
    }
}

impl Default for SimPeer {
    fn default() -> Self {
        Self::accepting(None, 0)
    }
}
