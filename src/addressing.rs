//! # Addressing Modes
//!
//! This module defines the six addressing modes of the machine. Each mode
//! contributes two things to an opcode:
//!
//! - the **high nibble** of the opcode byte (the mnemonic supplies the low
//!   nibble), and
//! - the **operand-fetch microcode** spliced between the fetch prefix and the
//!   mnemonic's operation micro-ops.
//!
//! The operand byte count is a pure function of the mode: implied
//! instructions are one byte, everything else is opcode + one operand byte.

use crate::signals::{ControlWord, Signal};

const NEXT_BYTE_TO_MAR: ControlWord = ControlWord::NONE
    .with(Signal::EnablePc)
    .with(Signal::LatchMar)
    .with(Signal::IncrementPc);

const DEREF_MAR: ControlWord = ControlWord::NONE
    .with(Signal::EnableRam)
    .with(Signal::LatchMar);

/// How an instruction interprets the byte following its opcode.
///
/// The branching variants fetch their operand exactly like the plain
/// variants one dereference earlier; the difference is downstream: the
/// mnemonic's operation latches the fetched byte into the program counter
/// instead of using it as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand; the operation is implied by the opcode alone.
    ///
    /// Examples: NOP, HLT, OTA
    Implied,

    /// The operand byte is the value itself.
    ///
    /// Example: LDA #$C2 (accumulator becomes 0xC2)
    Immediate,

    /// The operand byte is a memory address holding the value.
    ///
    /// Example: LDA $C2 (accumulator becomes the byte at 0xC2)
    Absolute,

    /// The operand byte is the address of a pointer to the value.
    ///
    /// Example: LDA ($C2) (0xC2 holds an address p; accumulator becomes the
    /// byte at p)
    Indirect,

    /// The operand byte is the branch target.
    ///
    /// Example: JMP $C2 (PC becomes 0xC2)
    AbsoluteBranching,

    /// The operand byte is the address of the branch target.
    ///
    /// Example: JMP ($C2) (PC becomes the byte at 0xC2)
    IndirectBranching,
}

impl AddressingMode {
    /// All modes, in high-nibble order.
    pub const ALL: [AddressingMode; 6] = [
        AddressingMode::Absolute,
        AddressingMode::Indirect,
        AddressingMode::Immediate,
        AddressingMode::AbsoluteBranching,
        AddressingMode::IndirectBranching,
        AddressingMode::Implied,
    ];

    /// The high nibble this mode contributes to the opcode byte.
    #[must_use]
    pub const fn high_nibble(self) -> u8 {
        match self {
            AddressingMode::Absolute => 0x0,
            AddressingMode::Indirect => 0x1,
            AddressingMode::Immediate => 0x2,
            AddressingMode::AbsoluteBranching => 0x3,
            AddressingMode::IndirectBranching => 0x4,
            AddressingMode::Implied => 0xF,
        }
    }

    /// Micro-ops that bring the operand within reach of the mnemonic's
    /// operation. On exit the MAR addresses the operand's final location
    /// (for non-implied modes), so an operation like `LDA`'s single
    /// `EnableRam + LatchA` step works identically under every mode.
    #[must_use]
    pub const fn operand_fetch(self) -> &'static [ControlWord] {
        match self {
            // No operand to fetch.
            AddressingMode::Implied => &[],

            // MAR addresses the operand byte itself.
            AddressingMode::Immediate => &[NEXT_BYTE_TO_MAR],

            // Operand byte is an address: one extra dereference.
            AddressingMode::Absolute => &[NEXT_BYTE_TO_MAR, DEREF_MAR],

            // Operand byte is the address of a pointer: two dereferences.
            AddressingMode::Indirect => &[NEXT_BYTE_TO_MAR, DEREF_MAR, DEREF_MAR],

            // Branch targets sit one dereference earlier than their data
            // counterparts; the operation consumes an address, not a value.
            AddressingMode::AbsoluteBranching => &[NEXT_BYTE_TO_MAR],
            AddressingMode::IndirectBranching => &[NEXT_BYTE_TO_MAR, DEREF_MAR],
        }
    }

    /// Number of operand bytes following the opcode (0 or 1).
    #[must_use]
    pub const fn operand_size(self) -> usize {
        match self {
            AddressingMode::Implied => 0,
            _ => 1,
        }
    }

    /// Total encoded instruction size in bytes (opcode + operand).
    #[must_use]
    pub const fn instruction_size(self) -> usize {
        1 + self.operand_size()
    }
}

impl std::fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            AddressingMode::Implied => "implied",
            AddressingMode::Immediate => "immediate",
            AddressingMode::Absolute => "absolute",
            AddressingMode::Indirect => "indirect",
            AddressingMode::AbsoluteBranching => "absolute",
            AddressingMode::IndirectBranching => "indirect",
        };
        f.write_str(name)
    }
}
