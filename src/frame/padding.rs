//! PADDING (type 0x00): `L` zero bytes with no further structure.

use bytes::{BufMut, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingFrame {
    pub length: usize,
}

impl GetFrameType for PaddingFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Padding
    }
}

impl EncodeFrame for PaddingFrame {
    fn max_encoding_size(&self) -> usize {
        1 + self.length
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0x00);
        buf.put_bytes(0, self.length);
    }
}

pub fn build(_conn: &mut Connection, length: usize) -> Result<PaddingFrame, Error> {
    Ok(PaddingFrame { length })
}

/// PADDING consumes every remaining byte in the packet payload; the packet
/// loop terminates naturally once this returns.
pub fn parse<'a>(_conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], PaddingFrame), Error> {
    Ok((&[], PaddingFrame { length: input.len() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn build_emits_type_byte_then_zeros() {
        let mut conn = test_connection();
        let frame = build(&mut conn, 3).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn parse_consumes_everything() {
        let mut conn = test_connection();
        let (rest, frame) = parse(&mut conn, &[0x00, 0x00, 0x00]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(frame.length, 3);
    }
}
