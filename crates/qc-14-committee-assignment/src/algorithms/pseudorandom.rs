//! # Deterministic Pseudorandom Source
//!
//! Xorshift32 generator used by resharding. Not cryptographic; its only
//! job is to give every node the same draw sequence for the same epoch.

/// Replacement for a zero seed; xorshift has an all-zero fixed point.
const ZERO_SEED_REPLACEMENT: u32 = 0x9E37_79B9;

/// Xorshift32 (shift triple 13, 17, 5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XorshiftPseudorandom {
    state: u32,
}

impl XorshiftPseudorandom {
    /// Seed the generator.
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { ZERO_SEED_REPLACEMENT } else { seed };
        Self { state }
    }

    /// Seed from an epoch number, truncated to its low 32 bits.
    pub fn for_epoch(epoch: u64) -> Self {
        Self::new(epoch as u32)
    }

    /// Next raw value.
    pub fn uint32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in `[0, n)`; 0 when `n == 0`.
    ///
    /// Rejects raw values below `2^32 mod n` so every residue is equally
    /// likely.
    pub fn uint32n(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.uint32();
            if x >= threshold {
                return x % n;
            }
        }
    }
}
