//! Flow-control credit bookkeeping shared by the connection level and the
//! per-stream level (MAX_DATA/DATA_BLOCKED and MAX_STREAM_DATA/
//! STREAM_DATA_BLOCKED are the same accounting applied at two granularities).

/// Send-side credit: how many bytes the peer has told us we may send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendCredit {
    max_bytes: u64,
    blocked: bool,
}

impl SendCredit {
    pub fn new(initial: u64) -> Self {
        Self {
            max_bytes: initial,
            blocked: false,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn mark_blocked(&mut self) {
        self.blocked = true;
    }

    /// Applies a received MAX_DATA/MAX_STREAM_DATA value. Per RFC 9000
    /// §4.1, a value lower than the current one is ignored; an increase
    /// also clears `blocked`.
    ///
    /// Returns whether the credit actually advanced.
    pub fn on_max_bytes(&mut self, new_max: u64) -> bool {
        if new_max >= self.max_bytes {
            self.max_bytes = new_max;
            self.blocked = false;
            true
        } else {
            false
        }
    }
}

/// Receive-side credit: how many bytes we have told the peer it may send us,
/// and how many it has sent so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecvCredit {
    received: u64,
    window: u64,
    max_bytes: u64,
}

impl RecvCredit {
    pub fn new(window: u64) -> Self {
        Self {
            received: 0,
            window,
            max_bytes: window,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn record_received(&mut self, total: u64) {
        self.received = self.received.max(total);
    }

    /// Accounts for `delta` newly received bytes.
    pub fn add_received(&mut self, delta: u64) {
        self.received += delta;
    }

    /// Handles a DATA_BLOCKED/STREAM_DATA_BLOCKED from the peer: raise our
    /// advertised credit to `received + window` and return the new value to
    /// announce via a reactive MAX_DATA/MAX_STREAM_DATA frame.
    ///
    /// The caller is responsible for rolling back with [`RecvCredit::rollback`]
    /// if the reactive frame cannot be enqueued (`NoMemory`).
    pub fn raise_on_blocked(&mut self) -> u64 {
        let previous = self.max_bytes;
        self.max_bytes = self.received + self.window;
        if self.max_bytes < previous {
            self.max_bytes = previous;
        }
        self.max_bytes
    }

    pub fn rollback(&mut self, previous: u64) {
        self.max_bytes = previous;
    }
}
