//! QUIC variable-length integers.
//!
//! The two most significant bits of the first byte select the encoded width
//! (1, 2, 4 or 8 bytes); the remaining bits hold the value in network byte
//! order.

use bytes::{Buf, BufMut};

use crate::errors::{ProtocolError, Result};

/// Largest value a varint can carry (2^62 - 1).
pub const MAX: u64 = (1 << 62) - 1;

/// Number of bytes `value` occupies once encoded.
pub fn encoded_len(value: u64) -> usize {
    match value {
        0..=0x3f => 1,
        0x40..=0x3fff => 2,
        0x4000..=0x3fff_ffff => 4,
        _ => 8,
    }
}

/// Append `value` to `buf` using the shortest encoding.
pub fn encode(value: u64, buf: &mut impl BufMut) -> Result<()> {
    if value > MAX {
        return Err(ProtocolError::VarIntOutOfRange(value));
    }

    match encoded_len(value) {
        1 => buf.put_u8(value as u8),
        2 => buf.put_u16(0x4000 | value as u16),
        4 => buf.put_u32(0x8000_0000 | value as u32),
        _ => buf.put_u64(0xc000_0000_0000_0000 | value),
    }
    Ok(())
}

/// Read one varint from the front of `buf`.
pub fn decode(buf: &mut impl Buf) -> Result<u64> {
    ensure(buf, 1)?;
    let width = 1usize << (buf.chunk()[0] >> 6);
    ensure(buf, width)?;

    let value = match width {
        1 => u64::from(buf.get_u8()),
        2 => u64::from(buf.get_u16() & 0x3fff),
        4 => u64::from(buf.get_u32() & 0x3fff_ffff),
        _ => buf.get_u64() & MAX,
    };
    Ok(value)
}

/// Fail with [`ProtocolError::Truncated`] unless `needed` bytes remain.
pub(crate) fn ensure(buf: &impl Buf, needed: usize) -> Result<()> {
    let available = buf.remaining();
    if available < needed {
        return Err(ProtocolError::Truncated { needed, available });
    }
    Ok(())
}
