//! # sap8: an 8-bit bus-and-microcode computer
//!
//! An emulator for a minimal stored-program, byte-addressable computer built
//! around a single shared internal bus and a microcode-sequenced clock,
//! together with a two-pass assembler for its small mnemonic language.
//!
//! ## Quick start
//!
//! ```
//! use sap8::{assemble, Machine};
//!
//! let program = assemble(
//!     "        LDA #$05\n\
//!             ADD #$03\n\
//!             OTA\n\
//!             HLT\n",
//! )
//! .unwrap();
//!
//! let mut machine = Machine::new();
//! machine.load_program(&program).unwrap();
//!
//! while !machine.is_halted() {
//!     machine.step_instruction().unwrap();
//! }
//! assert_eq!(machine.output(), 0x08);
//! ```
//!
//! ## Architecture
//!
//! - **Single shared bus**: every register and unit implements the
//!   [`BusComponent`] clock/data contract; at most one component may drive
//!   the bus per T-state.
//! - **Microcoded control**: instructions are sequences of [`ControlWord`]s;
//!   the opcode table is synthesized once from mnemonics x addressing modes.
//! - **Table-driven assembler**: operand syntax selects the addressing mode;
//!   labels resolve through a symbol table over two passes.
//!
//! ## Modules
//!
//! - [`signals`] - control signals and control words
//! - [`bus`] - the bus component contract
//! - [`register`] - general registers and the program counter
//! - [`alu`] - the combinational arithmetic unit
//! - [`memory`] - 256-byte memory with its internal address register
//! - [`addressing`] - addressing modes and their operand-fetch microcode
//! - [`opcodes`] - mnemonics, the fetch microprogram, and the opcode table
//! - [`machine`] - the machine aggregate and clock sequencer
//! - [`assembler`] - the two-pass assembler

pub mod addressing;
pub mod alu;
pub mod assembler;
pub mod bus;
pub mod machine;
pub mod memory;
pub mod opcodes;
pub mod register;
pub mod signals;

pub use addressing::AddressingMode;
pub use alu::ArithmeticUnit;
pub use assembler::{assemble, AssemblerError};
pub use bus::BusComponent;
pub use machine::Machine;
pub use memory::Memory;
pub use opcodes::{Mnemonic, OpcodeTable, OpcodeTableError, STANDARD_SET};
pub use register::{ProgramCounter, Register};
pub use signals::{ControlWord, Signal};

use thiserror::Error;

/// Errors raised while clocking the machine.
///
/// Bus contention and a latch with an empty bus both indicate miswired
/// microcode and abort the step. Byte range violations cannot occur at
/// runtime: every cell is a `u8`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// More than one component drove the bus in a single T-state.
    #[error("bus contention: {producers} components driving the bus during {cw:?}")]
    BusContention {
        producers: usize,
        cw: ControlWord,
    },

    /// A latch signal was asserted while no component drove the bus.
    #[error("{component} latch asserted with no value on the bus")]
    MissingBusData { component: &'static str },

    /// The sequencer failed to reach an instruction boundary within the
    /// hard T-state bound.
    #[error("microprogram still running after {0} T-states")]
    MicrocodeOverrun(usize),

    /// A program larger than the 256-byte memory was loaded.
    #[error("program of {len} bytes exceeds 256-byte memory")]
    ProgramTooLarge { len: usize },
}
