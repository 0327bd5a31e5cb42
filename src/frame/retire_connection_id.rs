//! RETIRE_CONNECTION_ID (type 0x19).

use bytes::BytesMut;

use super::{EncodeFrame, Frame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetireConnectionIdFrame {
    pub seqno: VarInt,
}

impl GetFrameType for RetireConnectionIdFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::RetireConnectionId
    }
}

impl EncodeFrame for RetireConnectionIdFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.seqno);
    }
}

/// Voluntarily retires one of the connection ids our peer gave us.
pub fn build(conn: &mut Connection, seqno: u64) -> Result<RetireConnectionIdFrame, Error> {
    conn.remote_cids.remove(seqno);
    Ok(RetireConnectionIdFrame {
        seqno: VarInt::try_from(seqno).map_err(|_| Error::NoMemory("sequence number exceeds varint range"))?,
    })
}

/// The peer is retiring one of the connection ids we issued them. Removes it
/// from our locally-owned (source) set and, if that set has fallen below its
/// target size, reactively issues a replacement.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], RetireConnectionIdFrame), Error> {
    let frame_type = FrameType::RetireConnectionId;
    let (input, seqno) = super::read_varint(input, frame_type, "truncated sequence number")?;

    let first = conn.local_cids.first_number();
    let last = conn.local_cids.last_number();
    if seqno.into_inner() != first {
        return Err(Error::ProtocolViolation(frame_type, "does not target the oldest connection id"));
    }
    if seqno.into_inner() == last {
        return Err(Error::ProtocolViolation(frame_type, "cannot retire the only remaining connection id"));
    }

    conn.local_cids.remove(seqno.into_inner());

    if conn.local_cids.len() < conn.local_cids.max_count() {
        let frame = Frame::NewConnectionId(super::new_connection_id::build(
            conn,
            0,
            super::new_connection_id::DEFAULT_CID_LEN,
        )?);
        conn.enqueue_control(frame, false);
    }

    Ok((input, RetireConnectionIdFrame { seqno }))
}

pub(crate) fn reactive(seqno: u64) -> Result<Frame, Error> {
    Ok(Frame::RetireConnectionId(RetireConnectionIdFrame {
        seqno: VarInt::try_from(seqno).map_err(|_| Error::NoMemory("sequence number exceeds varint range"))?,
    }))
}
