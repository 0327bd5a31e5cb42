//! Connection-id sets: the ordered collection of active connection ids,
//! keyed by sequence number, used for both the locally-issued (source) set
//! and the peer-issued (destination) set.

use std::collections::VecDeque;

/// An opaque connection id, 1 to 20 bytes per RFC 9000 §19.15.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionId(Vec<u8>);

impl ConnectionId {
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    seqno: u64,
    cid: ConnectionId,
    reset_token: Option<[u8; 16]>,
}

/// An ordered run of connection ids, keyed by dense, monotone sequence
/// numbers. The front entry is the "retired up to" boundary.
#[derive(Debug, Clone)]
pub struct ConnectionIdSet {
    entries: VecDeque<Entry>,
    max_count: usize,
    next_seqno: u64,
}

impl ConnectionIdSet {
    /// Builds a set seeded with the sequence-0 connection id issued at
    /// handshake time, retaining at most `max_count` entries.
    pub fn new(initial: ConnectionId, max_count: usize) -> Self {
        let mut entries = VecDeque::with_capacity(max_count);
        entries.push_back(Entry {
            seqno: 0,
            cid: initial,
            reset_token: None,
        });
        Self {
            entries,
            max_count,
            next_seqno: 1,
        }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The lowest sequence number still active, i.e. the "retired up to"
    /// boundary.
    pub fn first_number(&self) -> u64 {
        self.entries.front().map(|e| e.seqno).unwrap_or(self.next_seqno)
    }

    /// The highest sequence number issued so far.
    pub fn last_number(&self) -> u64 {
        self.entries.back().map(|e| e.seqno).unwrap_or(self.next_seqno - 1)
    }

    /// Appends a new entry; callers are responsible for sequence-number
    /// validation (dense, monotone) before calling this.
    pub fn append(&mut self, seqno: u64, cid: ConnectionId, reset_token: Option<[u8; 16]>) {
        self.entries.push_back(Entry {
            seqno,
            cid,
            reset_token,
        });
        self.next_seqno = self.next_seqno.max(seqno + 1);
    }

    /// Removes the entry with the given sequence number, if present.
    pub fn remove(&mut self, seqno: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.seqno != seqno);
        self.entries.len() != before
    }

    pub fn contains(&self, seqno: u64) -> bool {
        self.entries.iter().any(|e| e.seqno == seqno)
    }

    pub fn get(&self, seqno: u64) -> Option<&ConnectionId> {
        self.entries.iter().find(|e| e.seqno == seqno).map(|e| &e.cid)
    }

    /// The next sequence number this set expects to issue (source set) or
    /// accept (destination set).
    pub fn next_seqno(&self) -> u64 {
        self.next_seqno
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_remove() {
        let mut set = ConnectionIdSet::new(ConnectionId::from_slice(&[0; 8]), 2);
        assert_eq!(set.first_number(), 0);
        assert_eq!(set.last_number(), 0);

        set.append(1, ConnectionId::from_slice(&[1; 16]), None);
        assert_eq!(set.last_number(), 1);

        assert!(set.remove(0));
        assert_eq!(set.first_number(), 1);
        assert!(!set.contains(0));
    }
}
