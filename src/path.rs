//! Path validation state: the entropy/pending bookkeeping behind
//! PATH_CHALLENGE and PATH_RESPONSE, for both the local (source) and peer
//! (destination) path.

use std::net::SocketAddr;

/// An opaque reference to a UDP socket. Actual socket I/O is out of scope
/// for this crate; callers plug in whatever identifies a real socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketHandle(pub u64);

/// The two address slots a path entry tracks: slot 0 and slot 1, with
/// `active` selecting which one is currently in use.
#[derive(Debug, Clone, Default)]
pub struct PathEntry {
    pub entropy: [u8; 8],
    pub pending: bool,
    pub active: u8,
    pub addrs: [Option<SocketAddr>; 2],
}

impl PathEntry {
    pub fn active_addr(&self) -> Option<SocketAddr> {
        self.addrs[self.active as usize]
    }

    fn inactive_index(&self) -> usize {
        1 - self.active as usize
    }

    /// Starts a new validation round: remembers `entropy`, marks pending.
    pub fn challenge(&mut self, entropy: [u8; 8]) {
        self.entropy = entropy;
        self.pending = true;
    }

    /// Returns true and clears `pending` if `entropy` matches the
    /// outstanding challenge.
    fn complete(&mut self, entropy: [u8; 8]) -> bool {
        if self.pending && self.entropy == entropy {
            self.pending = false;
            true
        } else {
            false
        }
    }
}

/// The local path: in addition to the shared entry fields, holds references
/// to the two UDP sockets bound to its address slots.
#[derive(Debug, Clone, Default)]
pub struct SourcePath {
    pub entry: PathEntry,
    pub sockets: [Option<SocketHandle>; 2],
}

/// Bundles the source and destination path entries a connection tracks.
#[derive(Debug, Clone, Default)]
pub struct PathValidator {
    pub source: SourcePath,
    pub destination: PathEntry,
}

impl PathValidator {
    /// Applies an inbound PATH_RESPONSE's entropy against both pending
    /// challenges, per the per-path completion rules. Returns whether either
    /// path completed.
    pub fn on_path_response(&mut self, entropy: [u8; 8]) -> bool {
        let mut completed = false;

        if self.source.entry.complete(entropy) {
            let inactive = self.source.entry.inactive_index();
            self.source.sockets[inactive] = None;
            self.source.entry.addrs[inactive] = None;
            completed = true;
        }

        if self.destination.complete(entropy) {
            let inactive = self.destination.inactive_index();
            self.destination.addrs[inactive] = None;
            completed = true;
        }

        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_entropy_completes_source_path_and_clears_inactive_slot() {
        let mut validator = PathValidator::default();
        validator.source.entry.active = 0;
        validator.source.entry.addrs[1] = Some("127.0.0.1:9".parse().unwrap());
        validator.source.sockets[1] = Some(SocketHandle(7));
        validator.source.entry.challenge([1; 8]);

        assert!(validator.on_path_response([1; 8]));
        assert!(!validator.source.entry.pending);
        assert!(validator.source.entry.addrs[1].is_none());
        assert!(validator.source.sockets[1].is_none());
    }

    #[test]
    fn mismatched_entropy_does_not_complete() {
        let mut validator = PathValidator::default();
        validator.destination.challenge([1; 8]);
        assert!(!validator.on_path_response([2; 8]));
        assert!(validator.destination.pending);
    }
}
