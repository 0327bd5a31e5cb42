//! Packet-number map: tracks which packet numbers have been received, for
//! ACK frame construction.

use std::collections::BTreeSet;

/// The largest number of additional ranges (beyond the first) an ACK frame
/// built from this map, or accepted by the parser, may carry.
pub const QUIC_PN_MAX_GAPS: usize = 16;

/// A contiguous run of un-received packet numbers, `[start, end]` inclusive,
/// relative to the map's base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapAckBlock {
    pub start: u64,
    pub end: u64,
}

/// Tracks received packet numbers for one packet-number space and answers
/// the queries an ACK builder needs.
#[derive(Debug, Clone, Default)]
pub struct PacketNumberMap {
    received: BTreeSet<u64>,
    max_pn_ts_us: u64,
}

impl PacketNumberMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a received packet number at (an abstract) microsecond
    /// timestamp; the timestamp is only retained when this is the new
    /// largest packet number seen.
    pub fn record_received(&mut self, pn: u64, ts_us: u64) {
        let is_new_largest = self.received.iter().next_back().is_none_or(|&m| pn > m);
        self.received.insert(pn);
        if is_new_largest {
            self.max_pn_ts_us = ts_us;
        }
    }

    pub fn max_pn_seen(&self) -> Option<u64> {
        self.received.iter().next_back().copied()
    }

    pub fn min_pn_seen(&self) -> Option<u64> {
        self.received.iter().next().copied()
    }

    /// The oldest packet number still tracked, used as the map's reference
    /// point for gap arithmetic.
    pub fn base_pn(&self) -> u64 {
        self.min_pn_seen().unwrap_or(0)
    }

    pub fn max_pn_ts(&self) -> u64 {
        self.max_pn_ts_us
    }

    /// Received packet numbers collapsed into contiguous inclusive ranges,
    /// largest first: exactly what an ACK frame's FirstRange/{Gap,Range}*
    /// fields are built from.
    pub fn ranges_desc(&self) -> Vec<(u64, u64)> {
        let mut ranges = Vec::new();
        let mut iter = self.received.iter().rev().peekable();
        while let Some(&end) = iter.next() {
            let mut start = end;
            while let Some(&&next) = iter.peek() {
                if next + 1 == start {
                    start = next;
                    iter.next();
                } else {
                    break;
                }
            }
            ranges.push((start, end));
        }
        ranges
    }

    /// The complement of `ranges_desc`: the un-received runs between
    /// consecutive received ranges, largest-numbered gap first.
    pub fn gaps(&self) -> Vec<GapAckBlock> {
        let ranges = self.ranges_desc();
        ranges
            .windows(2)
            .map(|pair| GapAckBlock {
                start: pair[1].1 + 1,
                end: pair[0].0 - 1,
            })
            .collect()
    }
}
