//! PING (type 0x01): no fields, exists purely to be ack-eliciting.

use bytes::{BufMut, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingFrame;

impl GetFrameType for PingFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Ping
    }
}

impl EncodeFrame for PingFrame {
    fn max_encoding_size(&self) -> usize {
        1
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0x01);
    }
}

pub fn build(_conn: &mut Connection) -> Result<PingFrame, Error> {
    Ok(PingFrame)
}

pub fn parse<'a>(_conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], PingFrame), Error> {
    Ok((input, PingFrame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn build_emits_single_byte() {
        let mut conn = test_connection();
        let frame = build(&mut conn).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(&buf[..], &[0x01]);
    }

    #[test]
    fn parse_consumes_nothing() {
        let mut conn = test_connection();
        let (rest, _frame) = parse(&mut conn, &[0xaa]).unwrap();
        assert_eq!(rest, &[0xaa]);
    }
}
