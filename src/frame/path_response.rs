//! PATH_RESPONSE (type 0x1b).

use bytes::BytesMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathResponseFrame {
    pub entropy: [u8; 8],
}

impl GetFrameType for PathResponseFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::PathResponse
    }
}

impl EncodeFrame for PathResponseFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.extend_from_slice(&self.entropy);
    }
}

/// Carries the given entropy back to the peer verbatim; no connection state
/// changes until the peer's own PATH_CHALLENGE told us what to echo.
pub fn build(_conn: &mut Connection, entropy: [u8; 8]) -> Result<PathResponseFrame, Error> {
    Ok(PathResponseFrame { entropy })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], PathResponseFrame), Error> {
    let frame_type = FrameType::PathResponse;
    let (input, entropy_bytes) = super::take(input, 8, frame_type, "truncated entropy")?;
    let mut entropy = [0u8; 8];
    entropy.copy_from_slice(entropy_bytes);

    conn.path.on_path_response(entropy);

    Ok((input, PathResponseFrame { entropy }))
}
