//! HANDSHAKE_DONE (type 0x1e): server-only signal that the handshake is
//! confirmed. No fields, no decode-time side effect at this layer.

use bytes::{BufMut, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandshakeDoneFrame;

impl GetFrameType for HandshakeDoneFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::HandshakeDone
    }
}

impl EncodeFrame for HandshakeDoneFrame {
    fn max_encoding_size(&self) -> usize {
        1
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0x1e);
    }
}

pub fn build(_conn: &mut Connection) -> Result<HandshakeDoneFrame, Error> {
    Ok(HandshakeDoneFrame)
}

pub fn parse<'a>(
    _conn: &mut Connection,
    input: &'a [u8],
) -> Result<(&'a [u8], HandshakeDoneFrame), Error> {
    Ok((input, HandshakeDoneFrame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn round_trips() {
        let mut conn = test_connection();
        let frame = build(&mut conn).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(&buf[..], &[0x1e]);
    }
}
