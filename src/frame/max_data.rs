//! MAX_DATA (type 0x10): connection-level flow-control credit.

use bytes::BytesMut;

use super::{EncodeFrame, Frame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxDataFrame {
    pub max_bytes: VarInt,
}

impl GetFrameType for MaxDataFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::MaxData
    }
}

impl EncodeFrame for MaxDataFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.max_bytes);
    }
}

pub fn build(conn: &mut Connection) -> Result<MaxDataFrame, Error> {
    Ok(MaxDataFrame {
        max_bytes: VarInt::try_from(conn.recv_credit.max_bytes())
            .map_err(|_| Error::NoMemory("max data exceeds varint range"))?,
    })
}

/// Raises the connection's send credit iff the announced value is an
/// increase, and clears `data_blocked`.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], MaxDataFrame), Error> {
    let frame_type = FrameType::MaxData;
    let (input, max_bytes) = super::read_varint(input, frame_type, "truncated max data")?;
    conn.send_credit.on_max_bytes(max_bytes.into_inner());
    Ok((input, MaxDataFrame { max_bytes }))
}

/// Reactive MAX_DATA for DATA_BLOCKED handling, used by `data_blocked`.
pub(crate) fn reactive(new_max: u64) -> Result<Frame, Error> {
    Ok(Frame::MaxData(MaxDataFrame {
        max_bytes: VarInt::try_from(new_max).map_err(|_| Error::NoMemory("max data exceeds varint range"))?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn credit_is_monotone_across_several_frames() {
        let mut conn = test_connection();
        conn.send_credit = crate::flow::SendCredit::new(10);
        for v in [20u32, 15, 30] {
            let bytes = {
                let mut buf = BytesMut::new();
                buf.put_varint(&VarInt::from_u32(v));
                buf
            };
            parse(&mut conn, &bytes).unwrap();
        }
        assert_eq!(conn.send_credit.max_bytes(), 30);
    }
}
