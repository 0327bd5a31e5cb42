//! STOP_SENDING (type 0x05).

use bytes::BytesMut;

use super::{EncodeFrame, Frame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::stream::StreamId;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSendingFrame {
    pub stream_id: VarInt,
    pub error_code: VarInt,
}

impl GetFrameType for StopSendingFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::StopSending
    }
}

impl EncodeFrame for StopSendingFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 * 2
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.stream_id);
        buf.put_varint(&self.error_code);
    }
}

pub fn build(_conn: &mut Connection, stream_id: StreamId, error_code: u64) -> Result<StopSendingFrame, Error> {
    Ok(StopSendingFrame {
        stream_id: VarInt::try_from(stream_id.value())
            .map_err(|_| Error::NoMemory("stream id exceeds varint range"))?,
        error_code: VarInt::try_from(error_code).map_err(|_| Error::NoMemory("error code exceeds varint range"))?,
    })
}

/// Resolves the send stream (it must already exist — STOP_SENDING only ever
/// names a stream we ourselves are sending on), builds a reactive
/// RESET_STREAM on it (final size taken from whatever offset has been sent
/// so far, error code 0 since the application has not supplied one at this
/// layer), enqueues it, and marks the stream `ResetSent`.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], StopSendingFrame), Error> {
    let frame_type = FrameType::StopSending;
    let (input, stream_id) = super::read_varint(input, frame_type, "truncated stream id")?;
    let (input, error_code) = super::read_varint(input, frame_type, "truncated error code")?;

    let id = StreamId::new(stream_id.into_inner());
    let offset = conn
        .streams
        .send_get(id, false)
        .map(|send| send.offset)
        .ok_or(Error::StreamNotFound(id.value()))?;

    let reset = super::reset_stream::ResetStreamFrame {
        stream_id,
        error_code: VarInt::from_u32(0),
        final_size: VarInt::try_from(offset).map_err(|_| Error::NoMemory("final size exceeds varint range"))?,
    };
    conn.enqueue_control(Frame::ResetStream(reset), false);
    conn.streams.mark_reset_sent(id);

    Ok((input, StopSendingFrame { stream_id, error_code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::stream::SendState;

    #[test]
    fn parse_enqueues_reset_stream_and_marks_reset_sent() {
        let mut conn = test_connection();
        let stream_id = 0x00u64; // client bidi, ours to send on
        conn.streams.send_get(StreamId::new(stream_id), true).unwrap();

        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(stream_id as u32));
            buf.put_varint(&VarInt::from_u32(9));
            buf
        };
        let (rest, _frame) = parse(&mut conn, &bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(conn.control_queue.len(), 1);
        assert!(matches!(conn.control_queue[0], Frame::ResetStream(_)));
        let stream = conn.streams.find(StreamId::new(stream_id)).unwrap();
        assert_eq!(stream.send.as_ref().unwrap().state, SendState::ResetSent);
    }

    #[test]
    fn parse_rejects_unknown_stream() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(9));
            buf
        };
        assert!(matches!(parse(&mut conn, &bytes), Err(Error::StreamNotFound(0))));
    }
}
