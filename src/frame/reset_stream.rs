//! RESET_STREAM (type 0x04).

use bytes::BytesMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::stream::{RecvState, StreamId};
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetStreamFrame {
    pub stream_id: VarInt,
    pub error_code: VarInt,
    pub final_size: VarInt,
}

impl GetFrameType for ResetStreamFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::ResetStream
    }
}

impl EncodeFrame for ResetStreamFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 * 3
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.stream_id);
        buf.put_varint(&self.error_code);
        buf.put_varint(&self.final_size);
    }
}

/// Builds a RESET_STREAM announcing `error_code` on `stream_id`, with
/// `final_size` taken from the stream's current send offset. Clears the
/// stream table's active-send marker if it pointed at this stream.
pub fn build(conn: &mut Connection, stream_id: StreamId, error_code: u64) -> Result<ResetStreamFrame, Error> {
    let offset = conn
        .streams
        .find(stream_id)
        .and_then(|s| s.send.as_ref())
        .map(|send| send.offset)
        .ok_or(Error::StreamNotFound(stream_id.value()))?;
    conn.streams.clear_active_send_if(stream_id);
    Ok(ResetStreamFrame {
        stream_id: VarInt::try_from(stream_id.value())
            .map_err(|_| Error::NoMemory("stream id exceeds varint range"))?,
        error_code: VarInt::try_from(error_code).map_err(|_| Error::NoMemory("error code exceeds varint range"))?,
        final_size: VarInt::try_from(offset).map_err(|_| Error::NoMemory("final size exceeds varint range"))?,
    })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], ResetStreamFrame), Error> {
    let frame_type = FrameType::ResetStream;
    let (input, stream_id) = super::read_varint(input, frame_type, "truncated stream id")?;
    let (input, error_code) = super::read_varint(input, frame_type, "truncated error code")?;
    let (input, final_size) = super::read_varint(input, frame_type, "truncated final size")?;

    let id = StreamId::new(stream_id.into_inner());
    let recv = conn.streams.recv_get(id).ok_or(Error::StreamNotFound(id.value()))?;
    recv.state = RecvState::ResetRecvd;

    Ok((
        input,
        ResetStreamFrame {
            stream_id,
            error_code,
            final_size,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::stream::Role;

    #[test]
    fn build_uses_current_send_offset_as_final_size() {
        let mut conn = test_connection();
        let id = StreamId::new(0x04); // client-initiated, bidi, owned by this client
        conn.streams.send_get(id, true).unwrap().offset = 42;

        let frame = build(&mut conn, id, 1).unwrap();
        assert_eq!(frame.final_size.into_inner(), 42);
    }

    #[test]
    fn parse_sets_recv_state_and_creates_stream() {
        let mut conn = test_connection();
        let stream_id = 0x01u64; // server-initiated bidi, peer-initiated for a client
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(stream_id as u32));
            buf.put_varint(&VarInt::from_u32(7));
            buf.put_varint(&VarInt::from_u32(100));
            buf
        };
        let (rest, _frame) = parse(&mut conn, &bytes).unwrap();
        assert!(rest.is_empty());
        let stream = conn.streams.find(StreamId::new(stream_id)).unwrap();
        assert_eq!(stream.recv.as_ref().unwrap().state, RecvState::ResetRecvd);
        let _ = Role::Client;
    }

    #[test]
    fn parse_rejects_self_initiated_unidirectional_stream() {
        let mut conn = test_connection();
        let stream_id = 0x02u64; // client-initiated, uni: only we could send on this
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(stream_id as u32));
            buf.put_varint(&VarInt::from_u32(7));
            buf.put_varint(&VarInt::from_u32(100));
            buf
        };
        assert!(matches!(parse(&mut conn, &bytes), Err(Error::StreamNotFound(id)) if id == stream_id));
    }
}
