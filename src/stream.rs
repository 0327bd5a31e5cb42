//! Stream identifiers and per-stream send/receive state.

use std::collections::BTreeMap;

use crate::flow::{RecvCredit, SendCredit};

/// A 62-bit stream id. The two low bits encode initiator (client/server)
/// and direction (bidirectional/unidirectional).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(u64);

impl StreamId {
    pub const CLIENT_INITIATED: u64 = 0x0;
    pub const SERVER_INITIATED: u64 = 0x1;
    pub const BIDI: u64 = 0x0;
    pub const UNI: u64 = 0x2;

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_server_initiated(self) -> bool {
        self.0 & 0x1 == Self::SERVER_INITIATED
    }

    pub fn is_client_initiated(self) -> bool {
        !self.is_server_initiated()
    }

    pub fn is_uni(self) -> bool {
        self.0 & 0x2 == Self::UNI
    }

    pub fn is_bidi(self) -> bool {
        !self.is_uni()
    }

    /// Index into the stream-id space ignoring the direction/initiator bits,
    /// i.e. the Nth stream of its (initiator, direction) class.
    pub fn sequence(self) -> u64 {
        self.0 >> 2
    }

    /// Builds the id for the `sequence`th stream of the given class, the
    /// inverse of [`StreamId::sequence`]. Used to derive a concrete stream
    /// id boundary from a MAX_STREAMS value.
    pub fn from_sequence(sequence: u64, server_initiated: bool, uni: bool) -> Self {
        let mut raw = sequence << 2;
        if server_initiated {
            raw |= Self::SERVER_INITIATED;
        }
        if uni {
            raw |= Self::UNI;
        }
        Self(raw)
    }
}

/// Send-side lifecycle, RFC 9000 §3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Ready,
    Send,
    DataSent,
    DataRecvd,
    ResetSent,
    ResetRecvd,
}

/// Receive-side lifecycle, RFC 9000 §3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvState {
    Recv,
    SizeKnown,
    DataRecvd,
    ResetRecvd,
    DataRead,
    ResetRead,
}

#[derive(Debug, Clone)]
pub struct SendHalf {
    pub offset: u64,
    pub credit: SendCredit,
    pub state: SendState,
}

impl SendHalf {
    pub fn new(initial_credit: u64) -> Self {
        Self {
            offset: 0,
            credit: SendCredit::new(initial_credit),
            state: SendState::Ready,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecvHalf {
    pub credit: RecvCredit,
    pub state: RecvState,
}

impl RecvHalf {
    pub fn new(window: u64) -> Self {
        Self {
            credit: RecvCredit::new(window),
            state: RecvState::Recv,
        }
    }
}

/// One stream's state. Unidirectional streams only populate the half that
/// matches their direction relative to us.
#[derive(Debug, Clone)]
pub struct Stream {
    pub id: StreamId,
    pub send: Option<SendHalf>,
    pub recv: Option<RecvHalf>,
}

/// Whether this connection endpoint is the client or the server; determines
/// which peer-initiated streams the table auto-creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    fn is_server(self) -> bool {
        matches!(self, Role::Server)
    }
}

/// The connection's set of streams, plus the send-side concurrency caps
/// negotiated via MAX_STREAMS / STREAMS_BLOCKED.
#[derive(Debug, Clone)]
pub struct StreamTable {
    role: Role,
    streams: BTreeMap<StreamId, Stream>,
    max_streams_bidi: u64,
    max_streams_uni: u64,
    default_send_credit: u64,
    default_recv_window: u64,
    /// The stream last returned by `send_get`, cleared when that stream is
    /// reset; mirrors a "currently active send stream" cache.
    active_send: Option<StreamId>,
}

impl StreamTable {
    pub fn new(role: Role, default_send_credit: u64, default_recv_window: u64) -> Self {
        Self {
            role,
            streams: BTreeMap::new(),
            max_streams_bidi: 0,
            max_streams_uni: 0,
            default_send_credit,
            default_recv_window,
            active_send: None,
        }
    }

    pub fn find(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(&id)
    }

    pub fn find_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        self.streams.get_mut(&id)
    }

    fn is_peer_initiated(&self, id: StreamId) -> bool {
        id.is_server_initiated() != self.role.is_server()
    }

    /// Whether the peer is permitted to originate data on `id` — true for
    /// bidirectional streams regardless of initiator, and for any stream the
    /// peer itself initiated. A self-initiated unidirectional stream the
    /// peer has never seen fails this check.
    fn peer_may_originate(&self, id: StreamId) -> bool {
        id.is_bidi() || self.is_peer_initiated(id)
    }

    /// Whether we are permitted to originate data on `id` — true for
    /// bidirectional streams regardless of initiator, and for any stream we
    /// ourselves initiated.
    fn we_may_originate(&self, id: StreamId) -> bool {
        id.is_bidi() || !self.is_peer_initiated(id)
    }

    /// Resolves the receive half of `id`, creating the stream if the peer is
    /// permitted to originate data on it and it is unseen. Returns `None` if
    /// `id` names a stream only we could have initiated and have not.
    pub fn recv_get(&mut self, id: StreamId) -> Option<&mut RecvHalf> {
        if !self.streams.contains_key(&id) {
            if !self.peer_may_originate(id) {
                return None;
            }
            self.streams.insert(
                id,
                Stream {
                    id,
                    send: None,
                    recv: None,
                },
            );
        }
        let window = self.default_recv_window;
        let entry = self.streams.get_mut(&id)?;
        Some(entry.recv.get_or_insert_with(|| RecvHalf::new(window)))
    }

    /// Resolves the send half of `id`, creating the stream if `reserve` is
    /// set and we are permitted to originate it.
    pub fn send_get(&mut self, id: StreamId, reserve: bool) -> Option<&mut SendHalf> {
        let credit = self.default_send_credit;
        if !self.streams.contains_key(&id) {
            if !reserve || !self.we_may_originate(id) {
                return None;
            }
            self.streams.insert(
                id,
                Stream {
                    id,
                    send: None,
                    recv: None,
                },
            );
        }
        self.active_send = Some(id);
        let entry = self.streams.get_mut(&id)?;
        Some(entry.send.get_or_insert_with(|| SendHalf::new(credit)))
    }

    pub fn max_streams_bidi(&self) -> u64 {
        self.max_streams_bidi
    }

    pub fn max_streams_uni(&self) -> u64 {
        self.max_streams_uni
    }

    /// Applies a MAX_STREAMS value iff it raises the current cap. Returns
    /// whether it advanced.
    pub fn on_max_streams(&mut self, uni: bool, max: u64) -> bool {
        let cap = if uni {
            &mut self.max_streams_uni
        } else {
            &mut self.max_streams_bidi
        };
        if max > *cap {
            *cap = max;
            true
        } else {
            false
        }
    }

    /// Clears the active-send marker if it currently points at `id`.
    pub fn clear_active_send_if(&mut self, id: StreamId) {
        if self.active_send == Some(id) {
            self.active_send = None;
        }
    }

    /// Clears the active-send marker and transitions `id` to `ResetSent`,
    /// called when STOP_SENDING provokes a reactive RESET_STREAM.
    pub fn mark_reset_sent(&mut self, id: StreamId) {
        self.clear_active_send_if(id);
        if let Some(stream) = self.streams.get_mut(&id) {
            if let Some(send) = stream.send.as_mut() {
                send.state = SendState::ResetSent;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_initiated_recv_stream_is_created_lazily() {
        let mut table = StreamTable::new(Role::Client, 1000, 1000);
        let id = StreamId::new(0x1); // server-initiated bidi
        assert!(table.find(id).is_none());
        assert!(table.recv_get(id).is_some());
        assert!(table.find(id).is_some());
    }

    #[test]
    fn self_initiated_unidirectional_recv_is_rejected() {
        let mut table = StreamTable::new(Role::Client, 1000, 1000);
        let id = StreamId::new(0x2); // client-initiated, uni: only we send on this
        assert!(table.recv_get(id).is_none());
        assert!(table.find(id).is_none());
    }

    #[test]
    fn peer_initiated_send_is_rejected() {
        let mut table = StreamTable::new(Role::Client, 1000, 1000);
        let id = StreamId::new(0x3); // server-initiated, uni: only the peer sends on this
        assert!(table.send_get(id, true).is_none());
        assert!(table.find(id).is_none());
    }

    #[test]
    fn max_streams_is_monotone() {
        let mut table = StreamTable::new(Role::Client, 1000, 1000);
        assert!(table.on_max_streams(false, 10));
        assert!(!table.on_max_streams(false, 5));
        assert_eq!(table.max_streams_bidi(), 10);
    }

    #[test]
    fn stream_id_bit_decoding() {
        let id = StreamId::new(0x3); // server-initiated uni
        assert!(id.is_server_initiated());
        assert!(id.is_uni());
        let client_bidi = StreamId::new(0x4);
        assert!(client_bidi.is_client_initiated());
        assert!(client_bidi.is_bidi());
        assert_eq!(client_bidi.sequence(), 1);
    }
}
