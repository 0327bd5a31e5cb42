//! STREAM (types 0x08-0x0f): the OFF/LEN/FIN bits select which optional
//! fields are present.

use bytes::{Bytes, BytesMut};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::{Connection, ReassemblyEvent};
use crate::frame::error::Error;
use crate::stream::StreamId;
use crate::varint::{VarInt, WriteVarInt, var_len};

const OFF_BIT: u8 = 0b100;
const LEN_BIT: u8 = 0b010;
const FIN_BIT: u8 = 0b001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    pub stream_id: VarInt,
    pub offset: Option<VarInt>,
    pub length: VarInt,
    pub fin: bool,
    pub data: Bytes,
}

impl GetFrameType for StreamFrame {
    fn frame_type(&self) -> FrameType {
        let mut bits = LEN_BIT;
        if self.offset.is_some() {
            bits |= OFF_BIT;
        }
        if self.fin {
            bits |= FIN_BIT;
        }
        FrameType::Stream(bits)
    }
}

impl EncodeFrame for StreamFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 + 8 + 8 + self.data.len()
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.stream_id);
        if let Some(offset) = &self.offset {
            buf.put_varint(offset);
        }
        buf.put_varint(&self.length);
        buf.extend_from_slice(&self.data);
    }
}

/// Builds one STREAM frame carrying as much of `data` as fits in
/// `max_payload`, per the containing packet's remaining capacity.
///
/// Sets OFF iff the stream has already sent bytes, always sets LEN, and
/// sets FIN iff the caller requested it and the whole of `data` fit.
/// Advances the stream's send offset by the number of bytes actually
/// emitted.
pub fn build(
    conn: &mut Connection,
    stream_id: StreamId,
    data: Bytes,
    fin: bool,
    max_payload: usize,
) -> Result<StreamFrame, Error> {
    let id_varint =
        VarInt::try_from(stream_id.value()).map_err(|_| Error::NoMemory("stream id exceeds varint range"))?;

    let send = conn
        .streams
        .send_get(stream_id, true)
        .ok_or(Error::StreamNotFound(stream_id.value()))?;
    let offset = send.offset;

    let off_bit = offset > 0;
    let mut hlen = 1 + id_varint.encoding_size();
    let offset_varint = if off_bit {
        let encoded =
            VarInt::try_from(offset).map_err(|_| Error::NoMemory("stream offset exceeds varint range"))?;
        hlen += encoded.encoding_size();
        Some(encoded)
    } else {
        None
    };
    hlen += var_len(max_payload as u64);

    let avail = max_payload.saturating_sub(hlen);
    let (emit_len, fin_bit) = if data.len() <= avail {
        (data.len(), fin)
    } else {
        (avail, false)
    };

    send.offset += emit_len as u64;

    Ok(StreamFrame {
        stream_id: id_varint,
        offset: offset_varint,
        length: VarInt::try_from(emit_len as u64)
            .map_err(|_| Error::NoMemory("stream data length exceeds varint range"))?,
        fin: fin_bit,
        data: data.slice(0..emit_len),
    })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8], bits: u8) -> Result<(&'a [u8], StreamFrame), Error> {
    let frame_type = FrameType::Stream(bits);
    let (input, stream_id) = super::read_varint(input, frame_type, "truncated stream id")?;

    let (input, offset) = if bits & OFF_BIT != 0 {
        let (rest, value) = super::read_varint(input, frame_type, "truncated offset")?;
        (rest, Some(value))
    } else {
        (input, None)
    };

    let (input, length, data) = if bits & LEN_BIT != 0 {
        let (rest, length) = super::read_varint(input, frame_type, "truncated length")?;
        let (rest, data) = super::take(
            rest,
            length.into_inner() as usize,
            frame_type,
            "announced length exceeds remaining bytes",
        )?;
        (rest, length, data)
    } else {
        let length = VarInt::try_from(input.len() as u64)
            .map_err(|_| Error::MalformedFrame(frame_type, "implicit stream length exceeds varint range"))?;
        (&input[input.len()..], length, input)
    };

    let fin = bits & FIN_BIT != 0;
    let offset_value = offset.map(VarInt::into_inner).unwrap_or(0);

    conn.recv_credit.add_received(length.into_inner());
    conn.record_reassembly(ReassemblyEvent {
        stream_id: stream_id.into_inner(),
        offset: offset_value,
        data: Bytes::copy_from_slice(data),
        fin,
    });

    Ok((
        input,
        StreamFrame {
            stream_id,
            offset,
            length,
            fin,
            data: Bytes::copy_from_slice(data),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn build_with_offset_and_fin_exactly_fitting() {
        let mut conn = test_connection();
        let id = StreamId::new(4);
        conn.streams.send_get(id, true).unwrap().offset = 100;

        let frame = build(&mut conn, id, Bytes::from_static(b"abc"), true, 4096).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);

        assert_eq!(&buf[..], &[0x0f, 0x04, 0x40, 0x64, 0x03, b'a', b'b', b'c']);
        assert_eq!(conn.streams.find(id).unwrap().send.as_ref().unwrap().offset, 103);
    }

    #[test]
    fn build_truncates_to_available_capacity_and_clears_fin() {
        let mut conn = test_connection();
        let id = StreamId::new(0);
        let data = Bytes::from(vec![7u8; 10]);
        // hlen = 1 (type) + 1 (stream id varint) + 1 (length-field estimate for max_payload=5) = 3
        let frame = build(&mut conn, id, data, true, 5).unwrap();
        assert_eq!(frame.data.len(), 2);
        assert!(!frame.fin);
    }

    #[test]
    fn parse_records_reassembly_event_and_recv_credit() {
        let mut conn = test_connection();
        let bytes = {
            let mut buf = BytesMut::new();
            buf.put_varint(&VarInt::from_u32(4));
            buf.put_varint(&VarInt::from_u32(100));
            buf.put_varint(&VarInt::from_u32(3));
            buf.extend_from_slice(b"abc");
            buf
        };
        let bits = OFF_BIT | LEN_BIT;
        let (rest, frame) = parse(&mut conn, &bytes, bits).unwrap();
        assert!(rest.is_empty());
        assert_eq!(frame.data.as_ref(), b"abc");
        assert_eq!(conn.reassembled.len(), 1);
        assert_eq!(conn.reassembled[0].offset, 100);
        assert_eq!(conn.recv_credit.received(), 3);
    }
}
