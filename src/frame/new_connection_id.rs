//! NEW_CONNECTION_ID (type 0x18).

use bytes::{BufMut, Bytes, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::cid::ConnectionId;
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

/// The connection id length this crate issues when it has no caller
/// preference, matching common deployments (RFC 9000 allows up to 20).
pub const DEFAULT_CID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnectionIdFrame {
    pub seqno: VarInt,
    pub prior: VarInt,
    pub cid: Bytes,
    pub reset_token: [u8; 16],
}

impl GetFrameType for NewConnectionIdFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::NewConnectionId
    }
}

impl EncodeFrame for NewConnectionIdFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 + 8 + 1 + self.cid.len() + 16
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.seqno);
        buf.put_varint(&self.prior);
        buf.put_u8(self.cid.len() as u8);
        buf.extend_from_slice(&self.cid);
        buf.extend_from_slice(&self.reset_token);
    }
}

/// Issues the next connection id in our locally-owned (source) set, drawing
/// both the id and its stateless reset token from the connection's CSPRNG.
pub fn build(conn: &mut Connection, prior_retire_seqno: u64, cid_len: usize) -> Result<NewConnectionIdFrame, Error> {
    let seqno = conn.local_cids.last_number() + 1;

    let mut cid_bytes = vec![0u8; cid_len];
    conn.rng.fill(&mut cid_bytes);
    let mut reset_token = [0u8; 16];
    conn.rng.fill(&mut reset_token);

    conn.local_cids
        .append(seqno, ConnectionId::from_slice(&cid_bytes), Some(reset_token));

    Ok(NewConnectionIdFrame {
        seqno: VarInt::try_from(seqno).map_err(|_| Error::NoMemory("sequence number exceeds varint range"))?,
        prior: VarInt::try_from(prior_retire_seqno)
            .map_err(|_| Error::NoMemory("retire prior to exceeds varint range"))?,
        cid: Bytes::from(cid_bytes),
        reset_token,
    })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], NewConnectionIdFrame), Error> {
    let frame_type = FrameType::NewConnectionId;
    let (input, seqno) = super::read_varint(input, frame_type, "truncated sequence number")?;
    let (input, prior) = super::read_varint(input, frame_type, "truncated retire prior to")?;
    let (input, length_byte) = super::take(input, 1, frame_type, "truncated length")?;
    let (input, cid_bytes) = super::take(
        input,
        length_byte[0] as usize,
        frame_type,
        "connection id length exceeds remaining bytes",
    )?;
    let (input, token_bytes) = super::take(input, 16, frame_type, "truncated stateless reset token")?;

    let expected_seqno = conn.remote_cids.last_number() + 1;
    if seqno.into_inner() != expected_seqno {
        return Err(Error::ProtocolViolation(frame_type, "sequence number is not consecutive"));
    }
    if prior.into_inner() > seqno.into_inner() {
        return Err(Error::ProtocolViolation(frame_type, "retire prior to exceeds sequence number"));
    }

    let mut reset_token = [0u8; 16];
    reset_token.copy_from_slice(token_bytes);

    let first_seqno = conn.remote_cids.first_number();
    conn.remote_cids
        .append(seqno.into_inner(), ConnectionId::from_slice(cid_bytes), Some(reset_token));

    for retiring in first_seqno..prior.into_inner() {
        conn.remote_cids.remove(retiring);
        let frame = super::retire_connection_id::reactive(retiring)?;
        conn.enqueue_control(frame, false);
    }

    Ok((
        input,
        NewConnectionIdFrame {
            seqno,
            prior,
            cid: Bytes::copy_from_slice(cid_bytes),
            reset_token,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::frame::Frame;

    #[test]
    fn round_trip_with_no_retirement() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(1));
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_u8(16);
            buf.extend_from_slice(&[1; 16]);
            buf.extend_from_slice(&[2; 16]);
            buf
        };
        let (rest, _frame) = parse(&mut conn, &bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(conn.remote_cids.last_number(), 1);
        assert!(conn.control_queue.is_empty());
    }

    #[test]
    fn densification_enqueues_retirement_burst() {
        let mut conn = test_connection();
        // First: seqno=1, prior=0 -> no retirement.
        let first = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(1));
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_u8(16);
            buf.extend_from_slice(&[1; 16]);
            buf.extend_from_slice(&[2; 16]);
            buf
        };
        parse(&mut conn, &first).unwrap();

        // Second: seqno=2, prior=2 -> retire seqnos 0 and 1.
        let second = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(2));
            buf.put_varint(&VarInt::from_u32(2));
            buf.put_u8(16);
            buf.extend_from_slice(&[3; 16]);
            buf.extend_from_slice(&[4; 16]);
            buf
        };
        parse(&mut conn, &second).unwrap();

        assert_eq!(conn.control_queue.len(), 2);
        for (expected_seqno, frame) in [0u64, 1].into_iter().zip(&conn.control_queue) {
            match frame {
                Frame::RetireConnectionId(retire) => {
                    assert_eq!(retire.seqno.into_inner(), expected_seqno)
                }
                other => panic!("expected RetireConnectionId, got {other:?}"),
            }
        }
    }

    #[test]
    fn nonconsecutive_sequence_number_is_rejected() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(5));
            buf.put_varint(&VarInt::from_u32(0));
            buf.put_u8(16);
            buf.extend_from_slice(&[1; 16]);
            buf.extend_from_slice(&[2; 16]);
            buf
        };
        assert!(parse(&mut conn, &bytes).is_err());
    }
}
