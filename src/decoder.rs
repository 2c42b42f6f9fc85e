//! This file contains the seam between the fuzzer and the decoder under test.
//! The fuzzer only cares whether a decode call faults, results are thrown
//! away, but the trait keeps the decoder swappable for test doubles and the
//! fault injector.
//!
//! SPDX-License-Identifier: MIT

use iced_x86::{Decoder, DecoderError, DecoderOptions, Instruction};

use crate::machine::{BranchSemantics, DecodeConfig};

/// Why a decode call didn't produce an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    InvalidInstruction,
    NoMoreBytes,
}

/// Anything we can throw candidates at
pub trait InstructionDecoder {
    /// Opaque decoded instruction, never inspected by the fuzzer
    type Instruction;

    /// Decode one instruction from the start of `bytes`
    fn decode(
        &mut self,
        config: &DecodeConfig,
        bytes: &[u8],
    ) -> Result<Self::Instruction, DecodeError>;
}

/// The real decoder under test
#[derive(Default)]
pub struct IcedDecoder;

impl IcedDecoder {
    pub fn new() -> Self {
        IcedDecoder
    }

    fn options(config: &DecodeConfig) -> u32 {
        match config.branches {
            BranchSemantics::Intel => DecoderOptions::NONE,
            BranchSemantics::Amd => DecoderOptions::AMD,
        }
    }
}

impl InstructionDecoder for IcedDecoder {
    type Instruction = Instruction;

    fn decode(&mut self, config: &DecodeConfig, bytes: &[u8]) -> Result<Instruction, DecodeError> {
        // Bitness always comes from the fixed config table so it's 16/32/64
        let mut decoder = Decoder::with_ip(config.mode.bitness(), bytes, 0, Self::options(config));
        let instruction = decoder.decode();

        match decoder.last_error() {
            DecoderError::None => Ok(instruction),
            DecoderError::NoMoreBytes => Err(DecodeError::NoMoreBytes),
            _ => Err(DecodeError::InvalidInstruction),
        }
    }
}

/// Wraps a decoder and raises SIGSEGV right before the Nth (1-based)
/// submission reaches it. Used to check the crash report end-to-end
pub struct FaultInjector<D> {
    inner: D,
    fault_at: u64,
    submissions: u64,
}

impl<D: InstructionDecoder> FaultInjector<D> {
    pub fn new(inner: D, fault_at: u64) -> Self {
        FaultInjector {
            inner,
            fault_at,
            submissions: 0,
        }
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }
}

impl<D: InstructionDecoder> InstructionDecoder for FaultInjector<D> {
    type Instruction = D::Instruction;

    fn decode(
        &mut self,
        config: &DecodeConfig,
        bytes: &[u8],
    ) -> Result<Self::Instruction, DecodeError> {
        self.submissions += 1;
        if self.submissions == self.fault_at {
            unsafe {
                libc::raise(libc::SIGSEGV);
            }
        }

        self.inner.decode(config, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::DECODE_CONFIGS;
    use iced_x86::Mnemonic;

    #[test]
    fn decodes_vzeroupper_in_long_mode() {
        let mut decoder = IcedDecoder::new();
        let instr = decoder
            .decode(&DECODE_CONFIGS[2], &[0xC5, 0xF8, 0x77])
            .expect("decode");
        assert_eq!(instr.mnemonic(), Mnemonic::Vzeroupper);
        assert_eq!(instr.len(), 3);
    }

    #[test]
    fn bitness_follows_config() {
        // 48 is REX.W in long mode but `dec eax` everywhere else
        let bytes = [0x48, 0x89, 0xC0];
        let mut decoder = IcedDecoder::new();

        let wide = decoder.decode(&DECODE_CONFIGS[2], &bytes).expect("decode");
        assert_eq!(wide.mnemonic(), Mnemonic::Mov);

        let narrow = decoder.decode(&DECODE_CONFIGS[1], &bytes).expect("decode");
        assert_eq!(narrow.mnemonic(), Mnemonic::Dec);
    }

    #[test]
    fn truncated_input_reports_no_more_bytes() {
        let mut decoder = IcedDecoder::new();
        let result = decoder.decode(&DECODE_CONFIGS[2], &[0x0F]);
        assert_eq!(result.err(), Some(DecodeError::NoMoreBytes));
    }

    #[test]
    fn invalid_input_is_an_error_not_a_fault() {
        let mut decoder = IcedDecoder::new();
        // push es is fine in 16-bit mode but doesn't exist in long mode
        assert!(decoder.decode(&DECODE_CONFIGS[0], &[0x06, 0, 0, 0]).is_ok());
        assert_eq!(
            decoder.decode(&DECODE_CONFIGS[2], &[0x06, 0, 0, 0]).err(),
            Some(DecodeError::InvalidInstruction)
        );
    }

    #[test]
    fn injector_passes_through_before_its_turn() {
        let mut decoder = FaultInjector::new(IcedDecoder::new(), u64::MAX);
        for _ in 0..10 {
            let _ = decoder.decode(&DECODE_CONFIGS[1], &[0x90; 16]);
        }
        assert_eq!(decoder.submissions(), 10);
    }
}
