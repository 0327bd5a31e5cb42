//! STREAMS_BLOCKED_{BIDI,UNI} (types 0x16/0x17).

use bytes::BytesMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamsBlockedFrame {
    pub uni: bool,
    pub max: VarInt,
}

impl GetFrameType for StreamsBlockedFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::StreamsBlocked(if self.uni { 1 } else { 0 })
    }
}

impl EncodeFrame for StreamsBlockedFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.max);
    }
}

/// `attempted_stream_id` is the id whose creation was blocked; the wire
/// field is derived from it as `(id >> 2) + 1`, converting a stream id into
/// the stream count that would have permitted it.
pub fn build(_conn: &mut Connection, uni: bool, attempted_stream_id: u64) -> Result<StreamsBlockedFrame, Error> {
    let max = (attempted_stream_id >> 2) + 1;
    Ok(StreamsBlockedFrame {
        uni,
        max: VarInt::try_from(max).map_err(|_| Error::NoMemory("streams blocked count exceeds varint range"))?,
    })
}

/// If the peer reports being blocked above our currently advertised cap,
/// enqueue a MAX_STREAMS with that value and adopt it as the new cap.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8], uni: bool) -> Result<(&'a [u8], StreamsBlockedFrame), Error> {
    let frame_type = FrameType::StreamsBlocked(if uni { 1 } else { 0 });
    let (input, max) = super::read_varint(input, frame_type, "truncated max streams")?;

    let current = if uni {
        conn.streams.max_streams_uni()
    } else {
        conn.streams.max_streams_bidi()
    };
    if max.into_inner() > current {
        conn.streams.on_max_streams(uni, max.into_inner());
        let frame = super::max_streams::reactive(uni, max.into_inner())?;
        conn.enqueue_control(frame, false);
    }

    Ok((input, StreamsBlockedFrame { uni, max }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::frame::Frame;

    #[test]
    fn build_derives_count_from_stream_id() {
        let mut conn = test_connection();
        let frame = build(&mut conn, false, 8).unwrap();
        assert_eq!(frame.max.into_inner(), 3);
    }

    #[test]
    fn parse_adopts_peer_value_above_current_cap() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(5));
            buf
        };
        parse(&mut conn, &bytes, true).unwrap();
        assert_eq!(conn.streams.max_streams_uni(), 5);
        assert_eq!(conn.control_queue.len(), 1);
        assert!(matches!(conn.control_queue[0], Frame::MaxStreams(_)));
    }
}
