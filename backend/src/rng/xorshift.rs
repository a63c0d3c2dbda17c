//! xorshift64* random number generator
//!
//! Fast 64-bit PRNG that passes BigCrush. Same seed → same sequence, which is
//! what makes random tie-breaks replayable after a rewind.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// The generator state is plain data, so cloning the scheduler (and with it
/// the generator) for a snapshot captures the exact point in the sequence.
///
/// # Example
/// ```
/// use cpu_scheduler_sim_core::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let index = rng.index(3);
/// assert!(index < 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1 (xorshift cannot leave the all-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform index in `[0, len)`
    ///
    /// # Panics
    /// Panics if `len == 0`
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty range");
        (self.next() % len as u64) as usize
    }

    /// Uniformly pick one element of a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index(items.len());
        items.get(i)
    }

    /// Get current RNG state (for checkpointing/replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
