//! This file contains the single pRNG that drives an entire campaign. Every
//! draw the generator and the driver make comes out of here in a fixed order,
//! so a (seed, iteration) pair is all you need to replay a candidate.
//!
//! SPDX-License-Identifier: MIT

/// Seed used when the user doesn't provide one
pub const DEFAULT_SEED: u64 = 0;

/// xorshift has an all-zero fixed point, we never want to start there
const ZERO_STATE_FALLBACK: u64 = 0x2545_F491_4F6C_DD1D;

/// Sequential xorshift64 generator
#[derive(Clone, Debug, PartialEq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a generator from a user seed. The seed is run through the
    /// splitmix64 finalizer first so small seeds (including the default 0)
    /// still produce well-mixed state
    pub fn new(seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;

        let state = if z == 0 { ZERO_STATE_FALLBACK } else { z };

        Rng { state }
    }

    /// Return the current state and advance
    #[inline]
    pub fn rand(&mut self) -> u64 {
        // Save off current value
        let curr = self.state;

        // Mutate current state with xorshift for next call
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;

        // Return saved off value
        curr
    }

    /// 32-bit word, used where the bias rules inspect specific bit positions
    #[inline]
    pub fn rand_u32(&mut self) -> u32 {
        self.rand() as u32
    }

    /// Uniform-ish value in `0..bound`
    #[inline]
    pub fn below(&mut self, bound: u64) -> u64 {
        self.rand() % bound
    }

    /// Uniform random byte
    #[inline]
    pub fn byte(&mut self) -> u8 {
        (self.rand() & 0xFF) as u8
    }
}
