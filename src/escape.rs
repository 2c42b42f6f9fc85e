//! This file contains the escape-sequence half of the instruction generator.
//! After the prefix run we append one of: nothing, a legacy 0F-based escape,
//! or the first bytes of a VEX2/VEX3/EVEX/XOP encoding.
//!
//! The extended encodings are not filled uniformly. Uniform bytes nearly
//! always select a reserved opcode map and die early in decode, so:
//! - 75% of the time the map-select field is masked to known-valid maps
//! - 25% of the time the vvvv field is forced to 1111
//!
//! Both conditions key off bits 8-9 of a fresh 32-bit draw.
//!
//! SPDX-License-Identifier: MIT

use crate::rng::Rng;

/// Longest sequence `write_escape` will emit
pub const MAX_ESCAPE_LEN: usize = 3;

/// Size of the discrete draw the class is picked from
pub const ESCAPE_DRAW: u64 = 50;

/// Bits of a random word that decide both biases
const BIAS_BITS: u32 = 0x300;

/// OR'd into the payload byte to force vvvv (and the bit above it) to ones
const VVVV_ONES: u8 = 0x78;

/// EVEX P0: clear the reserved bit so mm selects a real map
const EVEX_MAP_MASK: u8 = 0xF7;

/// VEX3/XOP byte 1: keep only the low two map-select bits
const VEX_MAP_MASK: u8 = 0xE3;

/// XOP map-select is 8..=10, flipping bit 3 moves the VEX-biased value there
const XOP_MAP_TAG: u8 = 0x08;

/// Every class of sequence we can append
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeClass {
    None,
    ThreeDNow,
    Escape0F38,
    Escape0F3A,
    Escape0F,
    Evex,
    Vex3,
    Vex2,
    Xop,
}

impl EscapeClass {
    /// Map a draw in `0..ESCAPE_DRAW` onto a class. Anything past the
    /// explicit buckets is XOP
    pub fn from_draw(draw: u64) -> Self {
        match draw {
            0 => EscapeClass::None,
            1 => EscapeClass::ThreeDNow,
            2 => EscapeClass::Escape0F38,
            3 => EscapeClass::Escape0F3A,
            4 => EscapeClass::Escape0F,
            5..=10 => EscapeClass::Evex,
            11..=16 => EscapeClass::Vex3,
            17..=22 => EscapeClass::Vex2,
            _ => EscapeClass::Xop,
        }
    }

    /// Number of bytes this class writes
    pub fn encoded_len(self) -> usize {
        match self {
            EscapeClass::None => 0,
            EscapeClass::Escape0F => 1,
            EscapeClass::ThreeDNow
            | EscapeClass::Escape0F38
            | EscapeClass::Escape0F3A
            | EscapeClass::Vex2 => 2,
            EscapeClass::Evex | EscapeClass::Vex3 | EscapeClass::Xop => 3,
        }
    }

    /// Lead byte of the sequence, if any
    pub fn lead_byte(self) -> Option<u8> {
        match self {
            EscapeClass::None => None,
            EscapeClass::ThreeDNow
            | EscapeClass::Escape0F38
            | EscapeClass::Escape0F3A
            | EscapeClass::Escape0F => Some(0x0F),
            EscapeClass::Evex => Some(0x62),
            EscapeClass::Vex3 => Some(0xC4),
            EscapeClass::Vex2 => Some(0xC5),
            EscapeClass::Xop => Some(0x8F),
        }
    }
}

// Map-select byte: masked with `mask` unless the bias bits came up zero
#[inline]
fn biased_map_byte(rv: u32, mask: u8) -> u8 {
    let mask = if rv & BIAS_BITS != 0 { mask } else { 0xFF };
    (rv as u8) & mask
}

// Payload byte carrying vvvv: forced to ones when the bias bits are zero
#[inline]
fn biased_vvvv_byte(rv: u32) -> u8 {
    let force = if rv & BIAS_BITS != 0 { 0 } else { VVVV_ONES };
    (rv as u8) | force
}

/// Write the bytes for `class` at the start of `dst` and return how many were
/// written. `dst` must have room for `MAX_ESCAPE_LEN` bytes
pub fn write_escape(rng: &mut Rng, class: EscapeClass, dst: &mut [u8]) -> usize {
    match class {
        EscapeClass::None => {}
        EscapeClass::ThreeDNow => dst[..2].copy_from_slice(&[0x0F, 0x0F]),
        EscapeClass::Escape0F38 => dst[..2].copy_from_slice(&[0x0F, 0x38]),
        EscapeClass::Escape0F3A => dst[..2].copy_from_slice(&[0x0F, 0x3A]),
        EscapeClass::Escape0F => dst[0] = 0x0F,
        EscapeClass::Evex => {
            dst[0] = 0x62;
            dst[1] = biased_map_byte(rng.rand_u32(), EVEX_MAP_MASK);
            dst[2] = biased_vvvv_byte(rng.rand_u32());
        }
        EscapeClass::Vex3 => {
            dst[0] = 0xC4;
            dst[1] = biased_map_byte(rng.rand_u32(), VEX_MAP_MASK);
            dst[2] = biased_vvvv_byte(rng.rand_u32());
        }
        EscapeClass::Vex2 => {
            dst[0] = 0xC5;
            dst[1] = biased_vvvv_byte(rng.rand_u32());
        }
        EscapeClass::Xop => {
            dst[0] = 0x8F;
            dst[1] = biased_map_byte(rng.rand_u32(), VEX_MAP_MASK) ^ XOP_MAP_TAG;
            dst[2] = biased_vvvv_byte(rng.rand_u32());
        }
    }

    class.encoded_len()
}

/// Draw a class and write its bytes, returning the number written
pub fn generate_escape(rng: &mut Rng, dst: &mut [u8]) -> usize {
    let class = EscapeClass::from_draw(rng.below(ESCAPE_DRAW));
    write_escape(rng, class, dst)
}
