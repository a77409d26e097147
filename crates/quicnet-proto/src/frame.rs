//! Handshake-scoped frames.
//!
//! Only the frames that can appear before stream traffic begins are modelled.
//! Each frame starts with a varint type code followed by type-specific fields.
//!
//! | Code | Frame | Fields |
//! |------|-------|--------|
//! | 0x00 | Padding | none (runs of zero bytes) |
//! | 0x01 | Ping | none |
//! | 0x10 | MaxData | maximum |
//! | 0x12 / 0x13 | MaxStreams | maximum (bidirectional / unidirectional) |
//! | 0x1c | ConnectionClose | error code, frame type, reason |
//! | 0x1d | ConnectionClose (application) | error code, reason |

use bytes::{Buf, BufMut};

use crate::{
    MAX_STREAMS_LIMIT,
    errors::{ProtocolError, Result},
    varint::{self, ensure},
};

/// Frame type codes carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// 0x00
    Padding,
    /// 0x01
    Ping,
    /// 0x10
    MaxData,
    /// 0x12
    MaxStreamsBidi,
    /// 0x13
    MaxStreamsUni,
    /// 0x1c
    ConnectionClose,
    /// 0x1d
    ApplicationClose,
}

impl FrameType {
    /// Wire code for this frame type.
    pub const fn to_u64(self) -> u64 {
        match self {
            Self::Padding => 0x00,
            Self::Ping => 0x01,
            Self::MaxData => 0x10,
            Self::MaxStreamsBidi => 0x12,
            Self::MaxStreamsUni => 0x13,
            Self::ConnectionClose => 0x1c,
            Self::ApplicationClose => 0x1d,
        }
    }

    /// Look up a wire code. Returns `None` for codes outside the modelled set.
    pub const fn from_u64(code: u64) -> Option<Self> {
        match code {
            0x00 => Some(Self::Padding),
            0x01 => Some(Self::Ping),
            0x10 => Some(Self::MaxData),
            0x12 => Some(Self::MaxStreamsBidi),
            0x13 => Some(Self::MaxStreamsUni),
            0x1c => Some(Self::ConnectionClose),
            0x1d => Some(Self::ApplicationClose),
            _ => None,
        }
    }
}

/// Which stream kind a MaxStreams frame limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDirection {
    /// Bidirectional streams
    Bidirectional,
    /// Unidirectional streams
    Unidirectional,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Structural filler. Consecutive zero bytes decode as one frame.
    Padding {
        /// Number of padding bytes
        length: usize,
    },

    /// Keep-alive with no payload.
    Ping,

    /// Connection-level flow control limit.
    MaxData {
        /// Maximum bytes the peer may send
        maximum: u64,
    },

    /// Cap on the number of streams the peer may open.
    MaxStreams {
        /// Stream kind being limited
        direction: StreamDirection,
        /// Cumulative stream count allowed
        maximum: u64,
    },

    /// Peer is terminating the connection.
    ConnectionClose {
        /// Transport or application error code
        error_code: u64,
        /// Frame type that triggered the close. `None` for application closes.
        frame_type: Option<u64>,
        /// Human-readable reason phrase
        reason: String,
    },
}

impl Frame {
    /// Transport-level close with no triggering frame.
    pub fn close(error_code: u64, reason: impl Into<String>) -> Self {
        Self::ConnectionClose { error_code, frame_type: Some(0), reason: reason.into() }
    }

    /// Bidirectional stream cap.
    pub fn max_streams(maximum: u64) -> Self {
        Self::MaxStreams { direction: StreamDirection::Bidirectional, maximum }
    }

    /// Wire type of this frame.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Padding { .. } => FrameType::Padding,
            Self::Ping => FrameType::Ping,
            Self::MaxData { .. } => FrameType::MaxData,
            Self::MaxStreams { direction: StreamDirection::Bidirectional, .. } => {
                FrameType::MaxStreamsBidi
            },
            Self::MaxStreams { direction: StreamDirection::Unidirectional, .. } => {
                FrameType::MaxStreamsUni
            },
            Self::ConnectionClose { frame_type: Some(_), .. } => FrameType::ConnectionClose,
            Self::ConnectionClose { frame_type: None, .. } => FrameType::ApplicationClose,
        }
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Padding { length } => *length,
            Self::Ping => 1,
            Self::MaxData { maximum } | Self::MaxStreams { maximum, .. } => {
                1 + varint::encoded_len(*maximum)
            },
            Self::ConnectionClose { error_code, frame_type, reason } => {
                1 + varint::encoded_len(*error_code)
                    + frame_type.map_or(0, varint::encoded_len)
                    + varint::encoded_len(reason.len() as u64)
                    + reason.len()
            },
        }
    }

    /// Append this frame to `buf`.
    ///
    /// A zero-length Padding frame writes nothing.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        match self {
            Self::Padding { length } => buf.put_bytes(0, *length),
            Self::Ping => buf.put_u8(FrameType::Ping.to_u64() as u8),
            Self::MaxData { maximum } => {
                buf.put_u8(FrameType::MaxData.to_u64() as u8);
                varint::encode(*maximum, buf)?;
            },
            Self::MaxStreams { maximum, .. } => {
                if *maximum > MAX_STREAMS_LIMIT {
                    return Err(ProtocolError::StreamLimitExceeded(*maximum));
                }
                buf.put_u8(self.frame_type().to_u64() as u8);
                varint::encode(*maximum, buf)?;
            },
            Self::ConnectionClose { error_code, frame_type, reason } => {
                buf.put_u8(self.frame_type().to_u64() as u8);
                varint::encode(*error_code, buf)?;
                if let Some(frame_type) = frame_type {
                    varint::encode(*frame_type, buf)?;
                }
                varint::encode(reason.len() as u64, buf)?;
                buf.put_slice(reason.as_bytes());
            },
        }
        Ok(())
    }

    /// Read one frame from the front of `buf`.
    ///
    /// Frame types must use their shortest encoding.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        let before = buf.remaining();
        let code = varint::decode(buf)?;
        if before - buf.remaining() != varint::encoded_len(code) {
            return Err(ProtocolError::NonMinimalFrameType(code));
        }
        let frame_type = FrameType::from_u64(code).ok_or(ProtocolError::UnknownFrameType(code))?;

        match frame_type {
            FrameType::Padding => {
                let mut length = 1;
                while buf.has_remaining() && buf.chunk()[0] == 0 {
                    buf.advance(1);
                    length += 1;
                }
                Ok(Self::Padding { length })
            },
            FrameType::Ping => Ok(Self::Ping),
            FrameType::MaxData => Ok(Self::MaxData { maximum: varint::decode(buf)? }),
            FrameType::MaxStreamsBidi | FrameType::MaxStreamsUni => {
                let maximum = varint::decode(buf)?;
                if maximum > MAX_STREAMS_LIMIT {
                    return Err(ProtocolError::StreamLimitExceeded(maximum));
                }
                let direction = if frame_type == FrameType::MaxStreamsBidi {
                    StreamDirection::Bidirectional
                } else {
                    StreamDirection::Unidirectional
                };
                Ok(Self::MaxStreams { direction, maximum })
            },
            FrameType::ConnectionClose | FrameType::ApplicationClose => {
                let error_code = varint::decode(buf)?;
                let trigger = if frame_type == FrameType::ConnectionClose {
                    Some(varint::decode(buf)?)
                } else {
                    None
                };

                let declared = varint::decode(buf)?;
                let length = usize::try_from(declared).map_err(|_| {
                    ProtocolError::LengthMismatch { declared, remaining: buf.remaining() }
                })?;
                ensure(buf, length)?;
                let reason = String::from_utf8(buf.copy_to_bytes(length).to_vec())
                    .map_err(|_| ProtocolError::InvalidReason)?;

                Ok(Self::ConnectionClose { error_code, frame_type: trigger, reason })
            },
        }
    }

    /// Decode every frame left in `buf`.
    pub fn decode_all(mut buf: impl Buf) -> Result<Vec<Self>> {
        let mut frames = Vec::new();
        while buf.has_remaining() {
            frames.push(Self::decode(&mut buf)?);
        }
        Ok(frames)
    }
}
