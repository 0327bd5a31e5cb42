//! Errors raised while building or parsing frames.

use thiserror::Error;

use super::FrameType;
use crate::varint::VarInt;

/// The frame layer's error kinds.
///
/// These map onto the abstract error kinds of the frame layer's contract:
/// a malformed wire encoding, a protocol-level ordering/uniqueness violation,
/// an unsupported (extension) frame type, a resource-exhaustion failure, or a
/// reference to a stream the stream table refuses to create implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The frame type byte read from the stream is outside the base range
    /// `0x00..=0x1E` this crate's dispatch table covers.
    #[error("frame type {0} is not a recognized base frame type")]
    InvalidType(VarInt),

    /// Fewer bytes remain in the packet than the frame's type code requires
    /// to even begin parsing.
    #[error("incomplete frame type: {0}")]
    IncompleteType(String),

    /// A `{0:?}` frame's fields could not be parsed out of the remaining
    /// payload: a varint ran past the end of the packet, an announced length
    /// exceeded the bytes available, or a bounded field (ACK range count,
    /// CONNECTION_CLOSE reason length) was out of range.
    #[error("malformed {0:?} frame: {1}")]
    MalformedFrame(FrameType, &'static str),

    /// A `{0:?}` frame was well-formed on the wire but violated an ordering
    /// or uniqueness invariant the connection enforces (non-consecutive
    /// NEW_CONNECTION_ID sequence numbers, RETIRE_CONNECTION_ID that does not
    /// target the oldest or targets the only remaining id).
    #[error("protocol violation while processing {0:?}: {1}")]
    ProtocolViolation(FrameType, &'static str),

    /// Buffer allocation, or copying data into one, failed.
    #[error("no memory available to {0}")]
    NoMemory(&'static str),

    /// The frame referenced a stream the stream table does not auto-create
    /// in this context.
    #[error("reference to unknown stream {0}")]
    StreamNotFound(u64),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
