//! This file contains the random instruction encoder. One call produces one
//! 64-byte candidate made of three parts:
//! 1. A run of 0 to 15 prefixes, strongly biased towards short runs
//! 2. A randomly selected escape sequence (none, 0F, 0F38, 0F3A, 3DNow!, VEX,
//!    EVEX, XOP)
//! 3. Uniform random bytes for everything that's left
//!
//! SPDX-License-Identifier: MIT

use crate::escape::{generate_escape, MAX_ESCAPE_LEN};
use crate::prefix::{generate_prefix_bytes, MAX_PREFIXES};
use crate::rng::Rng;

/// Size of every candidate buffer
pub const CANDIDATE_LEN: usize = 64;

/// Number of bytes the crash memento keeps, no x86 instruction is longer
pub const RECORDED_LEN: usize = 16;

/// Upper bound (exclusive) of the draw fed into the cubic transform
const PREFIX_DRAW: u64 = 254;

// Prefix run plus escape must always leave room in the buffer
const _: () = assert!(MAX_PREFIXES + MAX_ESCAPE_LEN <= CANDIDATE_LEN);
const _: () = assert!(RECORDED_LEN <= CANDIDATE_LEN);

/// One synthesized instruction encoding attempt
pub type Candidate = [u8; CANDIDATE_LEN];

/// Cubic transform of a draw in `0..254`, `253^3 >> 20 == 15` so the result is
/// always a legal prefix count. Roughly 40% of draws land on 0
#[inline]
pub fn prefix_count(draw: u64) -> usize {
    ((draw * draw * draw) >> 20) as usize
}

/// Fill `buf` with one complete candidate
pub fn generate_rand_instr(rng: &mut Rng, buf: &mut Candidate, is_64bit: bool) {
    // 0 to 15 prefixes, biased towards smaller numbers
    let num_prefixes = prefix_count(rng.below(PREFIX_DRAW));
    generate_prefix_bytes(rng, &mut buf[..num_prefixes], is_64bit);

    // Escape sequence right after the prefixes
    let cursor = num_prefixes + generate_escape(rng, &mut buf[num_prefixes..]);

    // Fill the remainder with uniform-random data
    for byte in buf[cursor..].iter_mut() {
        *byte = rng.byte();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::{EscapeClass, ESCAPE_DRAW};
    use crate::prefix::is_rex;
    use proptest::prelude::*;
    use crate::rng::Rng;

    #[test]
    fn prefix_count_bounds() {
        assert_eq!(prefix_count(0), 0);
        assert_eq!(prefix_count(101), 0);
        assert_eq!(prefix_count(102), 1);
        assert_eq!(prefix_count(PREFIX_DRAW - 1), MAX_PREFIXES);
    }

    #[test]
    fn prefix_count_mass_never_increases() {
        let mut mass = [0usize; MAX_PREFIXES + 1];
        for draw in 0..PREFIX_DRAW {
            mass[prefix_count(draw)] += 1;
        }

        assert!(mass.iter().all(|&m| m > 0));
        for pair in mass.windows(2) {
            assert!(pair[0] >= pair[1], "{:?}", mass);
        }
    }

    #[test]
    fn prefix_count_is_left_skewed_when_sampled() {
        let mut rng = Rng::new(42);
        let rounds = 100_000;
        let mut mass = [0usize; MAX_PREFIXES + 1];
        for _ in 0..rounds {
            mass[prefix_count(rng.below(PREFIX_DRAW))] += 1;
        }

        // 147 of the 254 draws map onto {0, 1, 2}
        let low = (mass[0] + mass[1] + mass[2]) as f64 / rounds as f64;
        assert!(low > 0.55 && low < 0.61, "low mass {}", low);
        assert!(mass[0] > mass[1] && mass[1] > mass[2] && mass[2] > mass[3]);
        assert!(mass[3] > mass[MAX_PREFIXES]);
    }

    #[test]
    fn seed_zero_long_mode_golden() {
        let mut rng = Rng::new(0);
        let mut buf = [0u8; CANDIDATE_LEN];
        generate_rand_instr(&mut rng, &mut buf, true);
        assert_eq!(buf, GOLDEN_SEED0_LONG64);
    }

    #[test]
    fn no_state_leaks_between_calls() {
        let mut rng = Rng::new(8);
        let mut dirty = [0xCCu8; CANDIDATE_LEN];
        generate_rand_instr(&mut rng, &mut dirty, false);

        let mut rng = Rng::new(8);
        let mut clean = [0u8; CANDIDATE_LEN];
        generate_rand_instr(&mut rng, &mut clean, false);

        assert_eq!(dirty, clean);
    }

    proptest! {
        #[test]
        fn same_seed_same_candidates(seed in any::<u64>()) {
            let mut a = Rng::new(seed);
            let mut b = Rng::new(seed);
            for i in 0..16 {
                let mut x = [0u8; CANDIDATE_LEN];
                let mut y = [0u8; CANDIDATE_LEN];
                generate_rand_instr(&mut a, &mut x, i % 2 == 0);
                generate_rand_instr(&mut b, &mut y, i % 2 == 0);
                prop_assert_eq!(x, y);
            }
        }

        #[test]
        fn legacy_candidates_start_without_rex(seed in any::<u64>()) {
            // Reconstruct the prefix run length from the same draws
            let mut probe = Rng::new(seed);
            let count = prefix_count(probe.below(PREFIX_DRAW));

            let mut rng = Rng::new(seed);
            let mut buf = [0u8; CANDIDATE_LEN];
            generate_rand_instr(&mut rng, &mut buf, false);
            prop_assert!(buf[..count].iter().all(|&b| !is_rex(b)));
        }

        #[test]
        fn escape_sits_right_after_prefixes(seed in any::<u64>(), is_64bit in any::<bool>()) {
            let mut probe = Rng::new(seed);
            let count = prefix_count(probe.below(PREFIX_DRAW));
            let mut prefixes = [0u8; MAX_PREFIXES];
            generate_prefix_bytes(&mut probe, &mut prefixes[..count], is_64bit);
            let class = EscapeClass::from_draw(probe.below(ESCAPE_DRAW));

            let mut rng = Rng::new(seed);
            let mut buf = [0u8; CANDIDATE_LEN];
            generate_rand_instr(&mut rng, &mut buf, is_64bit);

            prop_assert_eq!(&buf[..count], &prefixes[..count]);
            if let Some(lead) = class.lead_byte() {
                prop_assert_eq!(buf[count], lead);
            }
        }
    }

    // Seed 0, 64-bit mode, first candidate
    #[rustfmt::skip]
    const GOLDEN_SEED0_LONG64: Candidate = [
        0xC4, 0x03, 0xDB, 0x44, 0xB6, 0x5D, 0x81, 0x0C,
        0x6C, 0x0E, 0x34, 0xBE, 0x8B, 0xF2, 0x1D, 0x57,
        0x29, 0xB5, 0x74, 0x18, 0xEC, 0x29, 0x43, 0xDB,
        0xAC, 0x7B, 0xDF, 0x24, 0xFA, 0xC9, 0x02, 0x66,
        0x2A, 0x0E, 0x7A, 0x48, 0x5A, 0xAC, 0x4B, 0x29,
        0x39, 0xE7, 0xA6, 0xEB, 0xD8, 0x57, 0x33, 0x45,
        0xD5, 0x98, 0x51, 0x13, 0x25, 0x3D, 0x39, 0xBB,
        0x58, 0x84, 0x03, 0x85, 0x52, 0x60, 0x7C, 0x6C,
    ];
}
