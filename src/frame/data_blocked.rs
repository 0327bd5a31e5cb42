//! DATA_BLOCKED (type 0x14).

use bytes::BytesMut;

use super::{EncodeFrame, Frame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBlockedFrame {
    pub max_bytes: VarInt,
}

impl GetFrameType for DataBlockedFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::DataBlocked
    }
}

impl EncodeFrame for DataBlockedFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.max_bytes);
    }
}

pub fn build(conn: &mut Connection) -> Result<DataBlockedFrame, Error> {
    Ok(DataBlockedFrame {
        max_bytes: VarInt::try_from(conn.send_credit.max_bytes())
            .map_err(|_| Error::NoMemory("max data exceeds varint range"))?,
    })
}

/// Raises our advertised connection-level receive credit and enqueues a
/// reactive MAX_DATA; rolls the credit back if the enqueue cannot be
/// recorded (here, enqueue never fails since the queue is unbounded, but
/// the rollback path exists so the contract matches the general pattern
/// used by `stream_data_blocked`).
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], DataBlockedFrame), Error> {
    let frame_type = FrameType::DataBlocked;
    let (input, max_bytes) = super::read_varint(input, frame_type, "truncated max data")?;

    let previous = conn.recv_credit.max_bytes();
    let new_max = conn.recv_credit.raise_on_blocked();
    match super::max_data::reactive(new_max) {
        Ok(frame) => conn.enqueue_control(frame, false),
        Err(err) => {
            conn.recv_credit.rollback(previous);
            return Err(err);
        }
    }

    Ok((input, DataBlockedFrame { max_bytes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::frame::Frame;

    #[test]
    fn raises_credit_and_enqueues_max_data() {
        let mut conn = test_connection();
        conn.recv_credit = crate::flow::RecvCredit::new(100);
        conn.recv_credit.add_received(80);

        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(100));
            buf
        };
        parse(&mut conn, &bytes).unwrap();

        assert_eq!(conn.recv_credit.max_bytes(), 180);
        assert_eq!(conn.control_queue.len(), 1);
        assert!(matches!(conn.control_queue[0], Frame::MaxData(_)));
    }
}
