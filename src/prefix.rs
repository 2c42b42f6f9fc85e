//! This file contains the logic for scribbling runs of x86 single-byte
//! instruction prefixes. Repeats and nonsensical orderings are intended, they
//! are exactly what stresses a decoder's redundant-prefix handling.
//!
//! SPDX-License-Identifier: MIT

use crate::rng::Rng;

/// Longest prefix run the encoder will ever ask for
pub const MAX_PREFIXES: usize = 15;

/// Number of REX prefixes, they always sit at the tail of `PREFIX_CATALOG`
pub const REX_COUNT: usize = 16;

/// Legacy prefixes first, weighted by repetition, then all 16 REX prefixes.
/// The REX block must stay last: outside of 64-bit mode we sample only from
/// the leading `LEGACY_COUNT` entries
#[rustfmt::skip]
pub const PREFIX_CATALOG: [u8; 44] = [
    // Operand-size, address-size, REPNE, REP
    0x66, 0x67, 0xF2, 0xF3,
    0x66, 0x67, 0xF2, 0xF3,
    0x66, 0x67, 0xF2, 0xF3,
    0x66, 0x67, 0xF2, 0xF3,

    // Segment overrides, LOCK
    0x26, 0x2E, 0x36, 0x3E,
    0x26, 0x2E, 0x36, 0x3E,
    0x64, 0x65, 0x66, 0xF0,

    // REX
    0x40, 0x41, 0x42, 0x43,
    0x44, 0x45, 0x46, 0x47,
    0x48, 0x49, 0x4A, 0x4B,
    0x4C, 0x4D, 0x4E, 0x4F,
];

/// Catalog entries usable in every mode
pub const LEGACY_COUNT: usize = PREFIX_CATALOG.len() - REX_COUNT;

/// Is this byte a REX prefix
#[inline]
pub fn is_rex(byte: u8) -> bool {
    byte & 0xF0 == 0x40
}

/// Fill every byte of `dst` with a prefix sampled with replacement from the
/// catalog. Outside of 64-bit mode the REX block is not part of the pool at
/// all
pub fn generate_prefix_bytes(rng: &mut Rng, dst: &mut [u8], is_64bit: bool) {
    let pool = if is_64bit {
        PREFIX_CATALOG.len()
    } else {
        LEGACY_COUNT
    };

    for byte in dst.iter_mut() {
        *byte = PREFIX_CATALOG[rng.below(pool as u64) as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::rng::Rng;

    #[test]
    fn rex_block_is_the_catalog_tail() {
        assert_eq!(LEGACY_COUNT, 28);
        assert!(PREFIX_CATALOG[..LEGACY_COUNT].iter().all(|&b| !is_rex(b)));
        assert!(PREFIX_CATALOG[LEGACY_COUNT..].iter().all(|&b| is_rex(b)));
    }

    #[test]
    fn zero_count_writes_nothing() {
        let mut rng = Rng::new(5);
        let mut dst: [u8; 0] = [];
        generate_prefix_bytes(&mut rng, &mut dst, true);
        assert_eq!(rng, Rng::new(5));
    }

    #[test]
    fn long_mode_eventually_emits_rex() {
        let mut rng = Rng::new(17);
        let mut dst = [0u8; MAX_PREFIXES];
        let mut saw_rex = false;
        for _ in 0..100 {
            generate_prefix_bytes(&mut rng, &mut dst, true);
            saw_rex |= dst.iter().any(|&b| is_rex(b));
        }
        assert!(saw_rex);
    }

    proptest! {
        #[test]
        fn legacy_modes_never_emit_rex(seed in any::<u64>(), count in 0usize..=MAX_PREFIXES) {
            let mut rng = Rng::new(seed);
            let mut dst = [0u8; MAX_PREFIXES];
            generate_prefix_bytes(&mut rng, &mut dst[..count], false);
            for &b in &dst[..count] {
                prop_assert!(!is_rex(b), "byte {:02X} in {:02X?}", b, &dst[..count]);
            }
        }

        #[test]
        fn every_byte_comes_from_the_catalog(seed in any::<u64>(), count in 0usize..=MAX_PREFIXES) {
            let mut rng = Rng::new(seed);
            let mut dst = [0u8; MAX_PREFIXES];
            generate_prefix_bytes(&mut rng, &mut dst[..count], true);
            for &b in &dst[..count] {
                prop_assert!(PREFIX_CATALOG.contains(&b));
            }
        }
    }
}
