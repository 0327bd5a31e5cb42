//! Randomness seam for connection-id and path-entropy generation.
//!
//! NEW_CONNECTION_ID and PATH_CHALLENGE both draw fresh random bytes; tests
//! need a deterministic substitute, so callers hold a `Box<dyn SecureRandom>`
//! rather than reaching for a thread-local CSPRNG directly.

use rand::RngCore;
use rand::rngs::StdRng;

/// A source of cryptographically secure random bytes.
pub trait SecureRandom: std::fmt::Debug {
    fn fill(&mut self, dest: &mut [u8]);
}

/// The default RNG, seeded from the OS entropy source.
#[derive(Debug)]
pub struct OsRandom(StdRng);

impl OsRandom {
    pub fn new() -> Self {
        use rand::SeedableRng;
        Self(StdRng::from_os_rng())
    }
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureRandom for OsRandom {
    fn fill(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

/// A deterministic RNG for tests: repeats a fixed byte, or steps through a
/// counter, so assertions can pin exact wire bytes.
#[derive(Debug, Clone)]
pub struct StepRandom {
    next: u8,
}

impl StepRandom {
    pub fn new(start: u8) -> Self {
        Self { next: start }
    }
}

impl SecureRandom for StepRandom {
    fn fill(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.next;
            self.next = self.next.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_random_is_deterministic_and_advances() {
        let mut rng = StepRandom::new(0);
        let mut a = [0u8; 4];
        let mut b = [0u8; 4];
        rng.fill(&mut a);
        rng.fill(&mut b);
        assert_eq!(a, [0, 1, 2, 3]);
        assert_eq!(b, [4, 5, 6, 7]);
    }
}
