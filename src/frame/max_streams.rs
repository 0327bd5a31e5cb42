//! MAX_STREAMS_{BIDI,UNI} (types 0x12/0x13).

use bytes::BytesMut;

use super::{EncodeFrame, Frame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxStreamsFrame {
    pub uni: bool,
    pub max: VarInt,
}

impl GetFrameType for MaxStreamsFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::MaxStreams(if self.uni { 1 } else { 0 })
    }
}

impl EncodeFrame for MaxStreamsFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.max);
    }
}

pub fn build(_conn: &mut Connection, uni: bool, max: u64) -> Result<MaxStreamsFrame, Error> {
    Ok(MaxStreamsFrame {
        uni,
        max: VarInt::try_from(max).map_err(|_| Error::NoMemory("max streams exceeds varint range"))?,
    })
}

/// Raises our peer's permitted concurrent stream count iff this is an
/// increase over the current advertised cap. The "next permissible stream
/// id" the source derives from `max` is documentation only and is not
/// computed here.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8], uni: bool) -> Result<(&'a [u8], MaxStreamsFrame), Error> {
    let frame_type = FrameType::MaxStreams(if uni { 1 } else { 0 });
    let (input, max) = super::read_varint(input, frame_type, "truncated max streams")?;
    conn.streams.on_max_streams(uni, max.into_inner());
    Ok((input, MaxStreamsFrame { uni, max }))
}

pub(crate) fn reactive(uni: bool, max: u64) -> Result<Frame, Error> {
    Ok(Frame::MaxStreams(MaxStreamsFrame {
        uni,
        max: VarInt::try_from(max).map_err(|_| Error::NoMemory("max streams exceeds varint range"))?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn raises_cap_only_on_increase() {
        let mut conn = test_connection();
        conn.streams.on_max_streams(false, 10);
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(5));
            buf
        };
        parse(&mut conn, &bytes, false).unwrap();
        assert_eq!(conn.streams.max_streams_bidi(), 10);
    }
}
