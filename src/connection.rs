//! The connection: the mutable state every frame builder reads from and
//! every frame parser mutates as a side effect.
//!
//! Builders and parsers take `&mut Connection` rather than operating under
//! an explicit lock object: the borrow checker enforces the same
//! non-reentrancy a runtime lock would, without needing one at this layer.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::cid::ConnectionIdSet;
use crate::flow::{RecvCredit, SendCredit};
use crate::frame::Frame;
use crate::path::PathValidator;
use crate::pnmap::PacketNumberMap;
use crate::rng::SecureRandom;
use crate::stream::{Role, StreamTable};

/// Connection-level tuning, the values a real endpoint would learn from
/// transport parameters and local policy.
#[derive(Debug, Clone)]
pub struct Config {
    pub ack_delay_exponent: u8,
    pub initial_max_data: u64,
    pub initial_max_stream_data: u64,
    pub initial_max_streams_bidi: u64,
    pub initial_max_streams_uni: u64,
    pub active_connection_id_limit: usize,
    pub anti_amplification_factor: u32,
    pub recv_window_connection: u64,
    pub recv_window_stream: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ack_delay_exponent: 3,
            initial_max_data: 1 << 20,
            initial_max_stream_data: 1 << 16,
            initial_max_streams_bidi: 100,
            initial_max_streams_uni: 100,
            active_connection_id_limit: 2,
            anti_amplification_factor: 3,
            recv_window_connection: 1 << 20,
            recv_window_stream: 1 << 16,
        }
    }
}

impl Config {
    pub fn with_ack_delay_exponent(mut self, value: u8) -> Self {
        self.ack_delay_exponent = value;
        self
    }

    pub fn with_initial_max_data(mut self, value: u64) -> Self {
        self.initial_max_data = value;
        self
    }

    pub fn with_active_connection_id_limit(mut self, value: usize) -> Self {
        self.active_connection_id_limit = value;
        self
    }
}

/// One handoff to the reassembly collaborator: a (possibly out-of-order)
/// span of stream data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblyEvent {
    pub stream_id: u64,
    pub offset: u64,
    pub data: Bytes,
    pub fin: bool,
}

/// One notification to the retransmit collaborator: "packets in
/// `[smallest, largest]` were acknowledged".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckNotification {
    pub largest: u64,
    pub smallest: u64,
    pub ack_largest: u64,
    pub delay_us: u64,
}

/// Connection-level close state, set by CONNECTION_CLOSE processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseDetail {
    pub error_code: u64,
    pub triggering_frame_type: Option<u64>,
    pub phrase: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Active,
    UserClosed,
}

/// The connection's observable state: everything frame builders read from
/// and frame parsers mutate.
pub struct Connection {
    pub role: Role,
    pub config: Config,
    pub streams: StreamTable,
    pub pn_map: PacketNumberMap,
    pub local_cids: ConnectionIdSet,
    pub remote_cids: ConnectionIdSet,
    pub path: PathValidator,
    pub token_store: Vec<u8>,
    pub ticket_store: Vec<u8>,
    pub send_credit: SendCredit,
    pub recv_credit: RecvCredit,
    pub control_queue: VecDeque<Frame>,
    pub acked: Vec<AckNotification>,
    pub reassembled: Vec<ReassemblyEvent>,
    pub state: ConnectionState,
    pub close: Option<CloseDetail>,
    pub rng: Box<dyn SecureRandom>,
}

impl Connection {
    pub fn new(
        role: Role,
        config: Config,
        local_cid: crate::cid::ConnectionId,
        remote_cid: crate::cid::ConnectionId,
        rng: Box<dyn SecureRandom>,
    ) -> Self {
        let streams = StreamTable::new(
            role,
            config.initial_max_stream_data,
            config.recv_window_stream,
        );
        let send_credit = SendCredit::new(config.initial_max_data);
        let recv_credit = RecvCredit::new(config.recv_window_connection);
        let local_cids = ConnectionIdSet::new(local_cid, config.active_connection_id_limit);
        let remote_cids = ConnectionIdSet::new(remote_cid, config.active_connection_id_limit);

        Self {
            role,
            config,
            streams,
            pn_map: PacketNumberMap::new(),
            local_cids,
            remote_cids,
            path: PathValidator::default(),
            token_store: Vec::new(),
            ticket_store: Vec::new(),
            send_credit,
            recv_credit,
            control_queue: VecDeque::new(),
            acked: Vec::new(),
            reassembled: Vec::new(),
            state: ConnectionState::Active,
            close: None,
            rng,
        }
    }

    /// Appends a reactive control frame to the outbound queue, preserving
    /// the order triggering frames were processed in. `urgent` frames jump
    /// to the front, for protocol errors that must be sent ahead of
    /// already-queued traffic.
    pub fn enqueue_control(&mut self, frame: Frame, urgent: bool) {
        if urgent {
            self.control_queue.push_front(frame);
        } else {
            self.control_queue.push_back(frame);
        }
    }

    pub fn record_ack(&mut self, notification: AckNotification) {
        self.acked.push(notification);
    }

    pub fn record_reassembly(&mut self, event: ReassemblyEvent) {
        self.reassembled.push(event);
    }

    pub fn close_with(&mut self, error_code: u64, triggering_frame_type: Option<u64>, phrase: String) {
        self.state = ConnectionState::UserClosed;
        self.close = Some(CloseDetail {
            error_code,
            triggering_frame_type,
            phrase,
        });
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    use crate::cid::ConnectionId;
    use crate::rng::StepRandom;

    Connection::new(
        Role::Client,
        Config::default(),
        ConnectionId::from_slice(&[0; 8]),
        ConnectionId::from_slice(&[0xff; 8]),
        Box::new(StepRandom::new(0)),
    )
}
