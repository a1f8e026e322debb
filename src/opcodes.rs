//! # Mnemonics and the Opcode Table
//!
//! This module is the single source of truth for the instruction set. A
//! [`Mnemonic`] names an operation, fixes its 4-bit low nibble, lists the
//! addressing modes it legally supports, and carries its operation
//! microcode. The [`OpcodeTable`] is synthesized once at startup: every
//! (mnemonic, mode) pair becomes one opcode byte
//! `(mode.high_nibble() << 4) | mnemonic.low_nibble`, mapped to the full
//! microprogram `fetch + operand fetch + operation`.
//!
//! Table construction fails on opcode collisions: two pairs mapping to the
//! same byte is a static configuration error, not something to discover one
//! instruction at a time at runtime.

use thiserror::Error;

use crate::addressing::AddressingMode;
use crate::signals::{ControlWord, Signal};

/// The fixed two-step fetch prefix every instruction begins with:
/// T0 moves the PC into the MAR and increments the PC; T1 moves the
/// addressed byte into the instruction register.
pub const FETCH: [ControlWord; 2] = [
    ControlWord::NONE
        .with(Signal::EnablePc)
        .with(Signal::LatchMar)
        .with(Signal::IncrementPc),
    ControlWord::NONE
        .with(Signal::EnableRam)
        .with(Signal::LatchI),
];

/// Hard upper bound on a complete microprogram (fetch + operand fetch +
/// operation). [`OpcodeTable::build`] rejects anything longer, which is what
/// lets the sequencer's instruction-step loop be bounded.
pub const MAX_MICROPROGRAM_LEN: usize = 8;

const READ_TO_A: ControlWord = ControlWord::NONE.with(Signal::EnableRam).with(Signal::LatchA);
const READ_TO_B: ControlWord = ControlWord::NONE.with(Signal::EnableRam).with(Signal::LatchB);
const SUM_TO_A: ControlWord = ControlWord::NONE.with(Signal::EnableAlu).with(Signal::LatchA);
const DIFF_TO_A: ControlWord = SUM_TO_A.with(Signal::Subtract);
const READ_TO_O: ControlWord = ControlWord::NONE.with(Signal::EnableRam).with(Signal::LatchO);
const A_TO_O: ControlWord = ControlWord::NONE.with(Signal::EnableA).with(Signal::LatchO);
const READ_TO_PC: ControlWord = ControlWord::NONE.with(Signal::EnableRam).with(Signal::LatchPc);
const READ_TO_MAR: ControlWord = ControlWord::NONE.with(Signal::EnableRam).with(Signal::LatchMar);
const A_TO_RAM: ControlWord = ControlWord::NONE.with(Signal::EnableA).with(Signal::LatchRam);
const HALT: ControlWord = ControlWord::NONE.with(Signal::HaltPc);
const RAISE_DMA: ControlWord = ControlWord::NONE.with(Signal::Dma);

const DATA_MODES: &[AddressingMode] = &[
    AddressingMode::Immediate,
    AddressingMode::Absolute,
    AddressingMode::Indirect,
];

const BRANCH_MODES: &[AddressingMode] = &[
    AddressingMode::AbsoluteBranching,
    AddressingMode::IndirectBranching,
];

const IMPLIED_ONLY: &[AddressingMode] = &[AddressingMode::Implied];

/// An instruction mnemonic: name, low opcode nibble, legal addressing modes,
/// and the operation micro-ops run after the operand fetch.
#[derive(Debug, Clone, Copy)]
pub struct Mnemonic {
    /// Assembly-language name, uppercase.
    pub name: &'static str,

    /// The low nibble this mnemonic contributes to every one of its opcodes.
    pub low_nibble: u8,

    /// Addressing modes this mnemonic may legally be encoded with.
    pub addressing_modes: &'static [AddressingMode],

    /// Operation microcode, entered with the MAR addressing the operand's
    /// final location (for non-implied modes).
    pub operation: &'static [ControlWord],
}

/// The machine's standard instruction set.
///
/// `STA` deliberately uses the branching operand fetch: its operation needs
/// the operand's *address* in the MAR (to route A into memory), not the byte
/// behind it, which is exactly the shape branch targets have.
pub const STANDARD_SET: &[Mnemonic] = &[
    Mnemonic {
        name: "LDA",
        low_nibble: 0x0,
        addressing_modes: DATA_MODES,
        operation: &[READ_TO_A],
    },
    Mnemonic {
        name: "ADD",
        low_nibble: 0x1,
        addressing_modes: DATA_MODES,
        operation: &[READ_TO_B, SUM_TO_A],
    },
    Mnemonic {
        name: "SUB",
        low_nibble: 0x2,
        addressing_modes: DATA_MODES,
        operation: &[READ_TO_B, DIFF_TO_A],
    },
    Mnemonic {
        name: "OUT",
        low_nibble: 0x3,
        addressing_modes: DATA_MODES,
        operation: &[READ_TO_O],
    },
    Mnemonic {
        name: "JMP",
        low_nibble: 0x4,
        addressing_modes: BRANCH_MODES,
        operation: &[READ_TO_PC],
    },
    Mnemonic {
        name: "STA",
        low_nibble: 0x5,
        addressing_modes: BRANCH_MODES,
        operation: &[READ_TO_MAR, A_TO_RAM],
    },
    Mnemonic {
        name: "OTA",
        low_nibble: 0x6,
        addressing_modes: IMPLIED_ONLY,
        operation: &[A_TO_O],
    },
    Mnemonic {
        name: "DMA",
        low_nibble: 0xD,
        addressing_modes: IMPLIED_ONLY,
        operation: &[RAISE_DMA],
    },
    Mnemonic {
        name: "NOP",
        low_nibble: 0xE,
        addressing_modes: IMPLIED_ONLY,
        operation: &[],
    },
    Mnemonic {
        name: "HLT",
        low_nibble: 0xF,
        addressing_modes: IMPLIED_ONLY,
        operation: &[HALT],
    },
];

/// Looks up a mnemonic of the standard set by its (uppercase) name.
#[must_use]
pub fn standard_mnemonic(name: &str) -> Option<&'static Mnemonic> {
    STANDARD_SET.iter().find(|m| m.name == name)
}

/// Composes the opcode byte for a (mnemonic, mode) pair.
#[must_use]
pub const fn opcode_byte(mnemonic: &Mnemonic, mode: AddressingMode) -> u8 {
    (mode.high_nibble() << 4) | mnemonic.low_nibble
}

/// A static configuration error detected while building an [`OpcodeTable`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpcodeTableError {
    /// Two (mnemonic, mode) pairs synthesized the same opcode byte.
    #[error("opcode {opcode:#04X} collision: {first} and {second}")]
    Collision {
        opcode: u8,
        first: &'static str,
        second: &'static str,
    },

    /// A microprogram exceeds the sequencer's hard T-state bound.
    #[error("{mnemonic} microprogram is {len} T-states, limit is {limit}")]
    MicroprogramTooLong {
        mnemonic: &'static str,
        len: usize,
        limit: usize,
    },
}

/// One decoded opcode: its origin pair and the complete microprogram.
#[derive(Debug, Clone)]
pub struct OpcodeEntry {
    /// Mnemonic name, for decode logging and inspection.
    pub mnemonic: &'static str,

    /// Addressing mode encoded in the opcode's high nibble.
    pub addressing_mode: AddressingMode,

    /// Full microprogram: fetch prefix + operand fetch + operation,
    /// concatenated once at build time.
    pub microprogram: Vec<ControlWord>,
}

/// Immutable opcode-to-microprogram mapping, built once at startup and owned
/// by the machine aggregate. There are no process-wide mutable tables.
#[derive(Debug)]
pub struct OpcodeTable {
    entries: Box<[Option<OpcodeEntry>; 256]>,
}

impl OpcodeTable {
    /// Builds a table from an instruction set, failing on opcode collisions
    /// or over-long microprograms.
    pub fn build(set: &[Mnemonic]) -> Result<OpcodeTable, OpcodeTableError> {
        let mut entries: Box<[Option<OpcodeEntry>; 256]> =
            Box::new(std::array::from_fn(|_| None));

        for mnemonic in set {
            for &mode in mnemonic.addressing_modes {
                let opcode = opcode_byte(mnemonic, mode);

                let mut microprogram =
                    Vec::with_capacity(FETCH.len() + mode.operand_fetch().len() + mnemonic.operation.len());
                microprogram.extend_from_slice(&FETCH);
                microprogram.extend_from_slice(mode.operand_fetch());
                microprogram.extend_from_slice(mnemonic.operation);

                if microprogram.len() > MAX_MICROPROGRAM_LEN {
                    return Err(OpcodeTableError::MicroprogramTooLong {
                        mnemonic: mnemonic.name,
                        len: microprogram.len(),
                        limit: MAX_MICROPROGRAM_LEN,
                    });
                }

                if let Some(existing) = &entries[opcode as usize] {
                    return Err(OpcodeTableError::Collision {
                        opcode,
                        first: existing.mnemonic,
                        second: mnemonic.name,
                    });
                }

                entries[opcode as usize] = Some(OpcodeEntry {
                    mnemonic: mnemonic.name,
                    addressing_mode: mode,
                    microprogram,
                });
            }
        }

        Ok(OpcodeTable { entries })
    }

    /// Builds the table for [`STANDARD_SET`].
    #[must_use]
    pub fn standard() -> OpcodeTable {
        // The standard set is fixed and covered by tests; a collision here
        // is a bug in this module, not a runtime condition.
        Self::build(STANDARD_SET).expect("standard instruction set builds without collisions")
    }

    /// Looks up an opcode byte. `None` means the opcode is unmapped; the
    /// sequencer treats that as recoverable, not fatal.
    #[must_use]
    pub fn get(&self, opcode: u8) -> Option<&OpcodeEntry> {
        self.entries[opcode as usize].as_ref()
    }

    /// Number of mapped opcodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }
}
