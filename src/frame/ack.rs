//! ACK / ACK_ECN (types 0x02/0x03).

use bytes::BytesMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::{AckNotification, Connection};
use crate::frame::error::Error;
use crate::pnmap::QUIC_PN_MAX_GAPS;
use crate::varint::{VarInt, WriteVarInt};

/// The three ECN counters ACK_ECN carries. Parsed and retained for a future
/// congestion controller; this crate never acts on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EcnCounts {
    pub ect0: u64,
    pub ect1: u64,
    pub ce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckFrame {
    pub largest: VarInt,
    pub delay: VarInt,
    pub first_range: VarInt,
    /// Additional `(Gap, AckRangeLength)` pairs, in wire order.
    pub ranges: Vec<(VarInt, VarInt)>,
    pub ecn: Option<EcnCounts>,
}

impl GetFrameType for AckFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Ack(if self.ecn.is_some() { 1 } else { 0 })
    }
}

impl EncodeFrame for AckFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8 * 3 + self.ranges.len() * 16 + if self.ecn.is_some() { 24 } else { 0 }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.put_varint(&self.largest);
        buf.put_varint(&self.delay);
        buf.put_varint(&VarInt::from_u32(self.ranges.len() as u32));
        buf.put_varint(&self.first_range);
        for (gap, range) in &self.ranges {
            buf.put_varint(gap);
            buf.put_varint(range);
        }
        if let Some(ecn) = &self.ecn {
            // Saturate rather than error: these are diagnostic counters this
            // crate never interprets.
            buf.put_varint(&VarInt::try_from(ecn.ect0).unwrap_or(VarInt::MAX));
            buf.put_varint(&VarInt::try_from(ecn.ect1).unwrap_or(VarInt::MAX));
            buf.put_varint(&VarInt::try_from(ecn.ce).unwrap_or(VarInt::MAX));
        }
    }
}

/// Builds an ACK from the connection's packet-number map. `now_us` is the
/// caller-supplied current time, in microseconds, so callers (and tests)
/// control the clock rather than this layer reading one itself.
pub fn build(conn: &mut Connection, ecn: bool, now_us: u64) -> Result<AckFrame, Error> {
    let ranges = conn.pn_map.ranges_desc();
    let Some(&(first_start, largest)) = ranges.first() else {
        return Err(Error::NoMemory("no received packets to acknowledge"));
    };
    let first_range = largest - first_start;

    let delay_us = now_us.saturating_sub(conn.pn_map.max_pn_ts());
    let delay = delay_us >> conn.config.ack_delay_exponent;

    let mut pairs = Vec::new();
    for window in ranges.windows(2).take(QUIC_PN_MAX_GAPS) {
        let (prev_start, _prev_end) = window[0];
        let (next_start, next_end) = window[1];
        let gap = prev_start - next_end - 2;
        let range = next_end - next_start;
        pairs.push((
            VarInt::try_from(gap).map_err(|_| Error::NoMemory("ack gap exceeds varint range"))?,
            VarInt::try_from(range).map_err(|_| Error::NoMemory("ack range exceeds varint range"))?,
        ));
    }

    Ok(AckFrame {
        largest: VarInt::try_from(largest).map_err(|_| Error::NoMemory("largest pn exceeds varint range"))?,
        delay: VarInt::try_from(delay).map_err(|_| Error::NoMemory("ack delay exceeds varint range"))?,
        first_range: VarInt::try_from(first_range)
            .map_err(|_| Error::NoMemory("first ack range exceeds varint range"))?,
        ranges: pairs,
        ecn: ecn.then(EcnCounts::default),
    })
}

pub fn parse<'a>(conn: &mut Connection, input: &'a [u8], ecn: bool) -> Result<(&'a [u8], AckFrame), Error> {
    let frame_type = FrameType::Ack(if ecn { 1 } else { 0 });

    let (input, largest) = super::read_varint(input, frame_type, "truncated largest acknowledged")?;
    let (input, delay) = super::read_varint(input, frame_type, "truncated ack delay")?;
    let (input, range_count) = super::read_varint(input, frame_type, "truncated ack range count")?;
    if range_count.into_inner() > QUIC_PN_MAX_GAPS as u64 {
        return Err(Error::MalformedFrame(frame_type, "ack range count exceeds 16"));
    }
    let (mut input, first_range) = super::read_varint(input, frame_type, "truncated first ack range")?;

    let delay_us = delay.into_inner() << conn.config.ack_delay_exponent;

    let mut largest_running = largest.into_inner();
    let mut smallest_running = largest_running.saturating_sub(first_range.into_inner());
    conn.record_ack(AckNotification {
        largest: largest_running,
        smallest: smallest_running,
        ack_largest: largest_running,
        delay_us,
    });

    let mut ranges = Vec::with_capacity(range_count.into_inner() as usize);
    for _ in 0..range_count.into_inner() {
        let (rest, gap) = super::read_varint(input, frame_type, "truncated ack gap")?;
        let (rest, range) = super::read_varint(rest, frame_type, "truncated ack range")?;
        input = rest;

        largest_running = smallest_running
            .checked_sub(gap.into_inner())
            .and_then(|v| v.checked_sub(2))
            .ok_or(Error::MalformedFrame(frame_type, "ack gap underflows packet number"))?;
        smallest_running = largest_running.saturating_sub(range.into_inner());
        conn.record_ack(AckNotification {
            largest: largest_running,
            smallest: smallest_running,
            ack_largest: 0,
            delay_us: 0,
        });
        ranges.push((gap, range));
    }

    let ecn_counts = if ecn {
        let (rest, ect0) = super::read_varint(input, frame_type, "truncated ect0 count")?;
        let (rest, ect1) = super::read_varint(rest, frame_type, "truncated ect1 count")?;
        let (rest, ce) = super::read_varint(rest, frame_type, "truncated ce count")?;
        input = rest;
        Some(EcnCounts {
            ect0: ect0.into_inner(),
            ect1: ect1.into_inner(),
            ce: ce.into_inner(),
        })
    } else {
        None
    };

    Ok((
        input,
        AckFrame {
            largest,
            delay,
            first_range,
            ranges,
            ecn: ecn_counts,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;

    #[test]
    fn build_zero_gap_ack() {
        let mut conn = test_connection();
        for pn in 0..=10u64 {
            conn.pn_map.record_received(pn, 0);
        }
        let frame = build(&mut conn, false, 0).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(&buf[..], &[0x02, 0x0a, 0x00, 0x00, 0x0a]);
    }

    #[test]
    fn parse_zero_gap_ack_notifies_once() {
        let mut conn = test_connection();
        let (rest, _frame) = parse(&mut conn, &[0x0a, 0x00, 0x00, 0x0a], false).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            conn.acked,
            vec![AckNotification {
                largest: 10,
                smallest: 0,
                ack_largest: 10,
                delay_us: 0,
            }]
        );
    }

    #[test]
    fn parse_rejects_too_many_ranges() {
        let mut conn = test_connection();
        let err = parse(&mut conn, &[0x0a, 0x00, 0x11, 0x00], false).unwrap_err();
        assert!(matches!(err, Error::MalformedFrame(FrameType::Ack(0), _)));
        assert!(conn.acked.is_empty());
    }

    #[test]
    fn parse_with_one_gap_recomputes_ranges() {
        let mut conn = test_connection();
        // largest=10, first_range=2 (acks 8..=10); gap=0, range=1 -> second
        // range recomputes to largest=6, smallest=5 (acks 5..=6), leaving
        // packet 7 as the single unacknowledged gap.
        let (rest, _frame) = parse(&mut conn, &[0x0a, 0x00, 0x01, 0x02, 0x00, 0x01], false).unwrap();
        assert!(rest.is_empty());
        assert_eq!(conn.acked.len(), 2);
        assert_eq!(conn.acked[0].smallest, 8);
        assert_eq!(conn.acked[1].largest, 6);
        assert_eq!(conn.acked[1].smallest, 5);
    }
}
