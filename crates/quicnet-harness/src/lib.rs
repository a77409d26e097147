//! Deterministic test harness for the QuicNet handshake.
//!
//! # Components
//!
//! - [`ScriptedTransport`]: in-memory transport replaying a fixed wire script,
//!   usable by both the blocking and the async driver
//! - [`ReplyBuilder`]: concise construction of peer replies
//! - [`SimTransport`] / [`SimPeer`]: turmoil-backed UDP for network
//!   simulation (latency, partitions) with a seeded peer
//! - [`scenario`]: declarative scenarios that run both drivers against the
//!   same script and verify the outcome with a mandatory oracle

pub mod reply;
pub mod scenario;
pub mod scripted;
pub mod sim_peer;
pub mod sim_transport;

pub use reply::ReplyBuilder;
pub use scenario::{Outcome, Scenario};
pub use scripted::{ScriptedChannel, ScriptedTransport, WireEvent, WireLog};
pub use sim_peer::{PEER_PORT, PeerBehavior, SimPeer};
pub use sim_transport::{SimChannel, SimTransport};
