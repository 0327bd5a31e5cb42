//! STREAM_DATA_BLOCKED (type 0x15).

use bytes::BytesMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::stream::StreamId;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDataBlockedFrame {
    pub stream_id: VarInt,
    pub max_bytes: VarInt,
}

impl GetFrameType for StreamDataBlockedFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::StreamDataBlocked
    }
}

impl EncodeFrame for StreamDataBlockedFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 * 2
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.stream_id);
        buf.put_varint(&self.max_bytes);
    }
}

pub fn build(conn: &mut Connection, stream_id: StreamId) -> Result<StreamDataBlockedFrame, Error> {
    let send = conn
        .streams
        .send_get(stream_id, true)
        .ok_or(Error::StreamNotFound(stream_id.value()))?;
    Ok(StreamDataBlockedFrame {
        stream_id: VarInt::try_from(stream_id.value())
            .map_err(|_| Error::NoMemory("stream id exceeds varint range"))?,
        max_bytes: VarInt::try_from(send.credit.max_bytes())
            .map_err(|_| Error::NoMemory("max stream data exceeds varint range"))?,
    })
}

/// Raises our advertised per-stream receive credit and enqueues a reactive
/// MAX_STREAM_DATA; rolls back on enqueue failure. The stream must already
/// be known — the peer could only have been blocked sending to a stream we
/// had already advertised some credit on, so an unknown stream id here is a
/// protocol violation, not an invitation to create one.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], StreamDataBlockedFrame), Error> {
    let frame_type = FrameType::StreamDataBlocked;
    let (input, stream_id) = super::read_varint(input, frame_type, "truncated stream id")?;
    let (input, max_bytes) = super::read_varint(input, frame_type, "truncated max stream data")?;

    let id = StreamId::new(stream_id.into_inner());
    let recv = conn
        .streams
        .find_mut(id)
        .and_then(|s| s.recv.as_mut())
        .ok_or(Error::StreamNotFound(id.value()))?;
    let previous = recv.credit.max_bytes();
    let new_max = recv.credit.raise_on_blocked();

    match super::max_stream_data::reactive(id, new_max) {
        Ok(frame) => conn.enqueue_control(frame, false),
        Err(err) => {
            conn.streams
                .find_mut(id)
                .and_then(|s| s.recv.as_mut())
                .expect("just resolved above")
                .credit
                .rollback(previous);
            return Err(err);
        }
    }

    Ok((input, StreamDataBlockedFrame { stream_id, max_bytes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::frame::Frame;

    #[test]
    fn raises_per_stream_credit_and_enqueues_max_stream_data() {
        let mut conn = test_connection();
        let id = StreamId::new(0);
        conn.streams.recv_get(id).unwrap().credit = crate::flow::RecvCredit::new(100);
        conn.streams.recv_get(id).unwrap().credit.add_received(50);

        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(100));
            buf
        };
        parse(&mut conn, &bytes).unwrap();

        assert_eq!(conn.streams.find(id).unwrap().recv.as_ref().unwrap().credit.max_bytes(), 150);
        assert_eq!(conn.control_queue.len(), 1);
        assert!(matches!(conn.control_queue[0], Frame::MaxStreamData(_)));
    }

    #[test]
    fn parse_rejects_unknown_stream() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(100));
            buf
        };
        assert!(matches!(parse(&mut conn, &bytes), Err(Error::StreamNotFound(0))));
    }
}
