//! CONNECTION_CLOSE, transport (type 0x1c) and application (type 0x1d).

use bytes::{BufMut, Bytes, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

/// Reason phrases are capped at 80 bytes on the wire, trailing NUL included.
const MAX_PHRASE_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCloseFrame {
    pub app: bool,
    pub error_code: VarInt,
    pub triggering_frame_type: Option<VarInt>,
    /// The encoded reason phrase, trailing NUL included.
    pub phrase: Bytes,
}

impl GetFrameType for ConnectionCloseFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::ConnectionClose(if self.app { 1 } else { 0 })
    }
}

impl EncodeFrame for ConnectionCloseFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 + 8 + 8 + self.phrase.len()
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.error_code);
        if !self.app {
            let triggering = self.triggering_frame_type.unwrap_or(VarInt::from_u32(0));
            buf.put_varint(&triggering);
        }
        buf.put_varint(&VarInt::try_from(self.phrase.len() as u64).expect("phrase length fits in a varint"));
        buf.put_slice(&self.phrase);
    }
}

/// Builds a CONNECTION_CLOSE to send. Does not itself transition the
/// connection: the caller has already decided to close before reaching for
/// this builder.
pub fn build(
    _conn: &mut Connection,
    app: bool,
    error_code: u64,
    triggering_frame_type: Option<u64>,
    phrase: &str,
) -> Result<ConnectionCloseFrame, Error> {
    let frame_type = FrameType::ConnectionClose(if app { 1 } else { 0 });

    let mut phrase_bytes = phrase.as_bytes().to_vec();
    phrase_bytes.push(0);
    if phrase_bytes.len() > MAX_PHRASE_LEN {
        return Err(Error::MalformedFrame(frame_type, "reason phrase exceeds 80 bytes"));
    }

    Ok(ConnectionCloseFrame {
        app,
        error_code: VarInt::try_from(error_code).map_err(|_| Error::NoMemory("error code exceeds varint range"))?,
        triggering_frame_type: if app {
            None
        } else {
            Some(
                VarInt::try_from(triggering_frame_type.unwrap_or(0))
                    .map_err(|_| Error::NoMemory("triggering frame type exceeds varint range"))?,
            )
        },
        phrase: Bytes::from(phrase_bytes),
    })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8], app: bool) -> Result<(&'a [u8], ConnectionCloseFrame), Error> {
    let frame_type = FrameType::ConnectionClose(if app { 1 } else { 0 });
    let (input, error_code) = super::read_varint(input, frame_type, "truncated error code")?;

    let (input, triggering_frame_type) = if app {
        (input, None)
    } else {
        let (input, value) = super::read_varint(input, frame_type, "truncated triggering frame type")?;
        (input, Some(value))
    };

    let (input, phrase_len) = super::read_varint(input, frame_type, "truncated phrase length")?;
    let phrase_len = phrase_len.into_inner() as usize;
    if phrase_len > MAX_PHRASE_LEN {
        return Err(Error::MalformedFrame(frame_type, "reason phrase exceeds 80 bytes"));
    }
    let (input, phrase_bytes) = super::take(input, phrase_len, frame_type, "phrase length exceeds remaining bytes")?;
    if phrase_bytes.last() != Some(&0) {
        return Err(Error::MalformedFrame(frame_type, "reason phrase is not NUL-terminated"));
    }

    let phrase_text = String::from_utf8_lossy(&phrase_bytes[..phrase_bytes.len() - 1]).into_owned();
    conn.close_with(
        error_code.into_inner(),
        triggering_frame_type.map(VarInt::into_inner),
        phrase_text,
    );

    Ok((
        input,
        ConnectionCloseFrame {
            app,
            error_code,
            triggering_frame_type,
            phrase: Bytes::copy_from_slice(phrase_bytes),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{test_connection, ConnectionState};

    fn varint_bytes(value: u32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_varint(&VarInt::from_u32(value));
        buf.to_vec()
    }

    #[test]
    fn parse_rejects_oversize_phrase() {
        let mut conn = test_connection();
        let mut bytes = varint_bytes(1);
        bytes.extend(varint_bytes(81));
        bytes.extend(vec![b'x'; 81]);
        assert!(parse(&mut conn, &bytes, true).is_err());
    }

    #[test]
    fn parse_rejects_non_nul_terminated_phrase() {
        let mut conn = test_connection();
        let mut bytes = varint_bytes(1);
        bytes.extend(varint_bytes(5));
        bytes.extend(vec![b'h', b'e', b'l', b'l', b'o']);
        assert!(parse(&mut conn, &bytes, true).is_err());
    }

    #[test]
    fn parse_valid_close_transitions_to_user_closed() {
        let mut conn = test_connection();
        let mut bytes = varint_bytes(42);
        bytes.extend(varint_bytes(4));
        bytes.extend(vec![b'b', b'y', b'e', 0]);
        let (rest, frame) = parse(&mut conn, &bytes, true).unwrap();
        assert!(rest.is_empty());
        assert!(frame.app);
        assert_eq!(conn.state, ConnectionState::UserClosed);
        let close = conn.close.unwrap();
        assert_eq!(close.error_code, 42);
        assert_eq!(close.phrase, "bye");
        assert_eq!(close.triggering_frame_type, None);
    }

    #[test]
    fn build_appends_nul_terminator_and_rejects_overlong_phrase() {
        let mut conn = test_connection();
        let frame = build(&mut conn, false, 1, Some(0x1a), "boom").unwrap();
        assert_eq!(frame.phrase.as_ref(), b"boom\0");
        assert_eq!(frame.triggering_frame_type.unwrap().into_inner(), 0x1a);

        let long_phrase = "x".repeat(80);
        assert!(build(&mut conn, false, 1, None, &long_phrase).is_err());
    }
}
