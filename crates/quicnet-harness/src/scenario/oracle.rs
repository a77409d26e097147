//! Reusable oracles.

use std::io;

use quicnet_proto::{ConnectionId, MIN_INITIAL_DATAGRAM_SIZE, PacketType};

use super::{Observed, OracleFn, Outcome};

/// Exactly one Initial packet was sent, built from zero seeds and padded to
/// the minimum datagram size.
pub fn single_padded_initial(observed: &Observed) -> Result<(), String> {
    let [initial] = observed.sent() else {
        return Err(format!("expected one packet sent, got {}", observed.sent().len()));
    };
    if initial.packet_type() != PacketType::Initial {
        return Err(format!("first packet was {}", initial.packet_type()));
    }
    if !initial.source_id().is_zero() || !initial.destination_id().is_zero() {
        return Err(format!(
            "initial carried ids {}/{}, expected zero seeds",
            initial.source_id(),
            initial.destination_id()
        ));
    }
    let len = initial.encoded_len();
    if !(MIN_INITIAL_DATAGRAM_SIZE - 1..=MIN_INITIAL_DATAGRAM_SIZE).contains(&len) {
        return Err(format!("initial was {len} bytes"));
    }
    Ok(())
}

/// The handshake established with `id` on both sides and `max_streams`.
pub fn established(id: u32, max_streams: u64) -> OracleFn {
    Box::new(move |observed| {
        single_padded_initial(observed)?;
        let Some(negotiated) = observed.outcome().negotiated() else {
            return Err(format!("expected establishment, got {:?}", observed.outcome()));
        };
        let id = ConnectionId::new(id);
        if negotiated.connection_id != id || negotiated.peer_connection_id != id {
            return Err(format!(
                "expected ids {id}, got {}/{}",
                negotiated.connection_id, negotiated.peer_connection_id
            ));
        }
        if negotiated.max_streams != max_streams {
            return Err(format!(
                "expected max_streams {max_streams}, got {}",
                negotiated.max_streams
            ));
        }
        Ok(())
    })
}

/// The peer refused with exactly `reason`.
pub fn refused(reason: &'static str) -> OracleFn {
    Box::new(move |observed| match observed.outcome() {
        Outcome::Refused { reason: got, .. } if got == reason => Ok(()),
        other => Err(format!("expected refusal {reason:?}, got {other:?}")),
    })
}

/// The attempt failed with an I/O error of `kind`.
pub fn io_failure(kind: io::ErrorKind) -> OracleFn {
    Box::new(move |observed| match observed.outcome() {
        Outcome::Io(got) if *got == kind => Ok(()),
        other => Err(format!("expected {kind:?}, got {other:?}")),
    })
}

/// Nothing was bound and nothing was sent.
pub fn no_io(observed: &Observed) -> Result<(), String> {
    if observed.binds() == 0 && observed.sent().is_empty() {
        Ok(())
    } else {
        Err(format!("expected no I/O, saw {} binds", observed.binds()))
    }
}
