//! QuicNet client handshake.
//!
//! Turns a peer address into an established [`Connection`] by sending one
//! Initial packet, waiting for exactly one reply, and reading the handshake
//! control frames it carries.
//!
//! # Architecture
//!
//! The protocol lives in a single sans-IO state machine ([`handshake`]). It
//! never touches sockets, clocks or loggers; each transition returns the next
//! action for a driver to execute. [`Client`] provides two drivers over that
//! one machine:
//!
//! - [`Client::connect`] blocks the calling thread on a [`Transport`]
//! - [`Client::connect_async`] suspends on an [`AsyncTransport`]
//!
//! Because both drivers execute the same transitions in the same order, they
//! produce identical results for identical wire input.
//!
//! All per-attempt state (endpoint, channel, session parameters) is local to
//! one call. Dropping a `connect_async` future cancels the attempt and leaves
//! nothing behind for the next one.
//!
//! # Components
//!
//! - [`client`]: `Client` and its blocking/async drivers
//! - [`handshake`]: Handshake state machine and frame classification
//! - [`connection`]: The established connection handed to callers
//! - [`transport`]: Blocking and async transport traits
//! - [`udp`]: UDP implementations of both transport traits
//! - [`endpoint`]: Peer address parsing
//! - [`error`]: Handshake, transport and connect errors

pub mod client;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod handshake;
pub mod transport;
pub mod udp;

pub use client::{Client, ClientConfig};
pub use connection::Connection;
pub use endpoint::resolve_endpoint;
pub use error::{ConnectError, HandshakeError, TransportError};
pub use handshake::{Handshake, HandshakeAction, HandshakeState, Negotiated, SessionParameters};
pub use transport::{AsyncChannel, AsyncTransport, Channel, Transport};
pub use udp::{TokioUdpChannel, UdpChannel, UdpConfig, UdpTransport};
