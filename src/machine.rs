/// This file contains the fixed set of decoding configurations we cycle
/// through. They're built once and never mutated, the crash memento stores
/// their id and label by value

/// Addressing mode the decoder runs in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineMode {
    Protected16,
    Protected32,
    Long64,
}

impl MachineMode {
    pub fn bitness(self) -> u32 {
        match self {
            MachineMode::Protected16 => 16,
            MachineMode::Protected32 => 32,
            MachineMode::Long64 => 64,
        }
    }
}

/// Which vendor's branch semantics the decoder applies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchSemantics {
    Intel,
    Amd,
}

/// One immutable decoding configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    pub id: u32,
    pub mode: MachineMode,
    pub branches: BranchSemantics,
    pub label: &'static str,
}

/// Every configuration we fuzz, `id` is the index into this table
pub const DECODE_CONFIGS: [DecodeConfig; 4] = [
    DecodeConfig {
        id: 0,
        mode: MachineMode::Protected16,
        branches: BranchSemantics::Intel,
        label: "protected16",
    },
    DecodeConfig {
        id: 1,
        mode: MachineMode::Protected32,
        branches: BranchSemantics::Intel,
        label: "protected32",
    },
    DecodeConfig {
        id: 2,
        mode: MachineMode::Long64,
        branches: BranchSemantics::Intel,
        label: "long64",
    },
    DecodeConfig {
        id: 3,
        mode: MachineMode::Long64,
        branches: BranchSemantics::Amd,
        label: "long64-amd",
    },
];

// The selection mask below relies on this
const _: () = assert!(DECODE_CONFIGS.len() == 4);

impl DecodeConfig {
    #[inline]
    pub fn is_64bit(&self) -> bool {
        self.mode == MachineMode::Long64
    }

    /// Pick a configuration from a raw random draw. Only the low two bits are
    /// used, so every draw maps to a valid entry
    #[inline]
    pub fn select(draw: u64) -> &'static DecodeConfig {
        &DECODE_CONFIGS[(draw & 3) as usize]
    }

    /// Look up a configuration by the id recorded in the memento
    pub fn by_id(id: u32) -> Option<&'static DecodeConfig> {
        DECODE_CONFIGS.get(id as usize)
    }
}

impl std::fmt::Display for DecodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.label)
    }
}
