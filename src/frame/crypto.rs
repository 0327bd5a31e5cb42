//! CRYPTO (type 0x06).
//!
//! This crate only ever builds CRYPTO frames carrying a session ticket at
//! offset 0, and only ever parses inbound CRYPTO frames as a session ticket
//! delivery; the TLS handshake itself is out of scope.

use bytes::{Bytes, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

/// The TLS 1.3 handshake message type for NewSessionTicket (RFC 8446 §4).
const TLS_NEW_SESSION_TICKET: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoFrame {
    pub offset: VarInt,
    pub data: Bytes,
}

impl GetFrameType for CryptoFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Crypto
    }
}

impl EncodeFrame for CryptoFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 + 8 + self.data.len()
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.offset);
        buf.put_varint(&VarInt::try_from(self.data.len() as u64).unwrap_or(VarInt::MAX));
        buf.extend_from_slice(&self.data);
    }
}

pub fn build(_conn: &mut Connection, data: Bytes) -> Result<CryptoFrame, Error> {
    Ok(CryptoFrame {
        offset: VarInt::from_u32(0),
        data,
    })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], CryptoFrame), Error> {
    let frame_type = FrameType::Crypto;
    let (input, offset) = super::read_varint(input, frame_type, "truncated offset")?;
    if offset.into_inner() != 0 {
        return Err(Error::MalformedFrame(frame_type, "nonzero CRYPTO offset is not supported"));
    }
    let (input, length) = super::read_varint(input, frame_type, "truncated length")?;
    let (input, data) = super::take(
        input,
        length.into_inner() as usize,
        frame_type,
        "announced length exceeds remaining bytes",
    )?;

    match data.first() {
        Some(&TLS_NEW_SESSION_TICKET) => {}
        _ => return Err(Error::MalformedFrame(frame_type, "expected a NewSessionTicket message")),
    }

    conn.ticket_store = data.to_vec();

    Ok((
        input,
        CryptoFrame {
            offset,
            data: Bytes::copy_from_slice(data),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn build_fixes_offset_at_zero() {
        let mut conn = test_connection();
        let frame = build(&mut conn, Bytes::from_static(&[4, 1, 2, 3])).unwrap();
        assert_eq!(frame.offset.into_inner(), 0);
    }

    #[test]
    fn parse_replaces_ticket_store_on_new_session_ticket() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(4));
            buf.extend_from_slice(&[4, 9, 9, 9]);
            buf
        };
        let (rest, _frame) = parse(&mut conn, &bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(conn.ticket_store, vec![4, 9, 9, 9]);
    }

    #[test]
    fn parse_rejects_nonzero_offset() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(1));
            buf.put_varint(&VarInt::from_u32(0));
            buf
        };
        assert!(parse(&mut conn, &bytes).is_err());
    }

    #[test]
    fn parse_rejects_wrong_message_type() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_varint(&VarInt::from_u32(1));
            buf.extend_from_slice(&[1]);
            buf
        };
        assert!(parse(&mut conn, &bytes).is_err());
    }
}
