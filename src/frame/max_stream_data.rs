//! MAX_STREAM_DATA (type 0x11): per-stream flow-control credit.

use bytes::BytesMut;

use super::{EncodeFrame, Frame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::stream::StreamId;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxStreamDataFrame {
    pub stream_id: VarInt,
    pub max_bytes: VarInt,
}

impl GetFrameType for MaxStreamDataFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::MaxStreamData
    }
}

impl EncodeFrame for MaxStreamDataFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 * 2
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.stream_id);
        buf.put_varint(&self.max_bytes);
    }
}

pub fn build(conn: &mut Connection, stream_id: StreamId) -> Result<MaxStreamDataFrame, Error> {
    let recv = conn
        .streams
        .recv_get(stream_id)
        .ok_or(Error::StreamNotFound(stream_id.value()))?;
    Ok(MaxStreamDataFrame {
        stream_id: VarInt::try_from(stream_id.value())
            .map_err(|_| Error::NoMemory("stream id exceeds varint range"))?,
        max_bytes: VarInt::try_from(recv.credit.max_bytes())
            .map_err(|_| Error::NoMemory("max stream data exceeds varint range"))?,
    })
}

/// Raises our send credit on an already-known stream. Unlike DATA_BLOCKED's
/// reactive MAX_DATA, a peer naming an unknown stream here is an error, not
/// a reason to fabricate one: the stream table only auto-creates in
/// contexts where the peer could be establishing the stream for the first
/// time, and MAX_STREAM_DATA is never that context.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], MaxStreamDataFrame), Error> {
    let frame_type = FrameType::MaxStreamData;
    let (input, stream_id) = super::read_varint(input, frame_type, "truncated stream id")?;
    let (input, max_bytes) = super::read_varint(input, frame_type, "truncated max stream data")?;

    let id = StreamId::new(stream_id.into_inner());
    let send = conn
        .streams
        .find_mut(id)
        .and_then(|s| s.send.as_mut())
        .ok_or(Error::StreamNotFound(id.value()))?;
    send.credit.on_max_bytes(max_bytes.into_inner());

    Ok((input, MaxStreamDataFrame { stream_id, max_bytes }))
}

pub(crate) fn reactive(stream_id: StreamId, new_max: u64) -> Result<Frame, Error> {
    Ok(Frame::MaxStreamData(MaxStreamDataFrame {
        stream_id: VarInt::try_from(stream_id.value())
            .map_err(|_| Error::NoMemory("stream id exceeds varint range"))?,
        max_bytes: VarInt::try_from(new_max).map_err(|_| Error::NoMemory("max stream data exceeds varint range"))?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn credit_is_monotone_per_stream() {
        let mut conn = test_connection();
        let id = StreamId::new(0);
        conn.streams.send_get(id, true).unwrap().credit = crate::flow::SendCredit::new(10);

        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(5));
            buf
        };
        parse(&mut conn, &bytes).unwrap();
        assert_eq!(conn.streams.find(id).unwrap().send.as_ref().unwrap().credit.max_bytes(), 10);
    }

    #[test]
    fn parse_rejects_unknown_stream() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(5));
            buf
        };
        assert!(matches!(parse(&mut conn, &bytes), Err(Error::StreamNotFound(0))));
    }
}
