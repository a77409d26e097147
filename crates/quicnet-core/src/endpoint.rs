//! Peer address parsing.

use std::net::{IpAddr, SocketAddr};

use crate::error::ConnectError;

/// Parse an IP literal and port into the peer's socket address.
///
/// Accepts IPv4 and IPv6 literals; IPv6 may be wrapped in square brackets.
/// Host names are rejected: resolution is the caller's job.
///
/// # Errors
/// Returns `AddressFormat` if `address` is not an IP literal.
pub fn resolve_endpoint(address: &str, port: u16) -> Result<SocketAddr, ConnectError> {
    let literal =
        address.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')).unwrap_or(address);

    let ip: IpAddr = literal
        .parse()
        .map_err(|source| ConnectError::AddressFormat { input: address.to_string(), source })?;
    Ok(SocketAddr::new(ip, port))
}
