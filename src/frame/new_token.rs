//! NEW_TOKEN (type 0x07).

use bytes::{Bytes, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTokenFrame {
    pub data: Bytes,
}

impl GetFrameType for NewTokenFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::NewToken
    }
}

impl EncodeFrame for NewTokenFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 + self.data.len()
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&VarInt::try_from(self.data.len() as u64).unwrap_or(VarInt::MAX));
        buf.extend_from_slice(&self.data);
    }
}

pub fn build(_conn: &mut Connection, data: Bytes) -> Result<NewTokenFrame, Error> {
    Ok(NewTokenFrame { data })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], NewTokenFrame), Error> {
    let frame_type = FrameType::NewToken;
    let (input, length) = super::read_varint(input, frame_type, "truncated length")?;
    let (input, data) = super::take(
        input,
        length.into_inner() as usize,
        frame_type,
        "announced length exceeds remaining bytes",
    )?;

    conn.token_store = data.to_vec();

    Ok((
        input,
        NewTokenFrame {
            data: Bytes::copy_from_slice(data),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn parse_replaces_token_store() {
        let mut conn = test_connection();
        conn.token_store = vec![0xff];
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(3));
            buf.extend_from_slice(&[1, 2, 3]);
            buf
        };
        let (rest, frame) = parse(&mut conn, &bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(conn.token_store, vec![1, 2, 3]);
        assert_eq!(frame.data.as_ref(), &[1, 2, 3]);
    }
}
