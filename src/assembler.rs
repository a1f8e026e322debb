//! # Two-Pass Assembler
//!
//! Converts assembly source text into the machine's binary encoding.
//!
//! - **Pass 1** walks the source, strips blanks and comments, records label
//!   definitions (`name:`) at their cumulative byte offset, and sizes every
//!   instruction. Byte length is a pure function of the addressing mode, so
//!   forward references never need a speculative encode.
//! - **Pass 2** encodes each parsed line, resolving label operands through
//!   the symbol table at the token level. Resolution never touches raw
//!   source text, so a label name appearing inside another token can't be
//!   corrupted.
//!
//! ```
//! use sap8::assemble;
//!
//! let bytes = assemble(
//!     "        LDA $C2     ; absolute load\n\
//!      loop:\n\
//!             JMP loop\n",
//! )
//! .unwrap();
//!
//! assert_eq!(bytes, vec![0x00, 0xC2, 0x34, 0x02]);
//! ```

pub mod encoder;
pub mod parser;
pub mod symbol_table;

use thiserror::Error;

use crate::memory::MEMORY_SIZE;
use parser::LineKind;
use symbol_table::SymbolTable;

pub use symbol_table::Symbol;

/// A fatal assembly error. Every variant names the offending text and the
/// 1-indexed source line it came from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    /// The line does not parse as a label, an instruction, or a directive.
    #[error("line {line}: could not understand `{text}`")]
    SyntaxError { line: usize, text: String },

    /// The mnemonic is not part of the instruction set.
    #[error("line {line}: unknown mnemonic `{text}`")]
    UnknownMnemonic { line: usize, text: String },

    /// The operand matches none of the recognized syntax forms.
    #[error("line {line}: could not understand argument `{text}`")]
    BadOperand { line: usize, text: String },

    /// The operand form is valid syntax but the mnemonic does not declare
    /// that addressing mode.
    #[error("line {line}: {mnemonic} does not support {mode} addressing (`{operand}`)")]
    IllegalAddressingMode {
        line: usize,
        mnemonic: String,
        mode: &'static str,
        operand: String,
    },

    /// The operand value does not fit in one byte.
    #[error("line {line}: `{text}` exceeds one byte")]
    ValueTooLarge { line: usize, text: String },

    /// A label name is malformed.
    #[error("line {line}: invalid label name `{name}`: {reason}")]
    InvalidLabel {
        line: usize,
        name: String,
        reason: &'static str,
    },

    /// The same label was defined twice.
    #[error("line {line}: duplicate label `{name}` (first defined on line {first})")]
    DuplicateLabel {
        line: usize,
        name: String,
        first: usize,
    },

    /// An operand referenced a label no line defines.
    #[error("line {line}: undefined label `{name}`")]
    UndefinedLabel { line: usize, name: String },

    /// The assembled program does not fit in the 256-byte memory.
    #[error("program of {bytes} bytes exceeds 256-byte memory")]
    ProgramTooLarge { bytes: usize },
}

/// Complete output from assembling source code.
#[derive(Debug, Clone)]
pub struct AssemblerOutput {
    /// Assembled machine code.
    pub bytes: Vec<u8>,

    /// Every label defined by the source, with its resolved address.
    pub symbols: Vec<Symbol>,
}

/// Assembles source text into machine code bytes.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    assemble_with_symbols(source).map(|output| output.bytes)
}

/// Assembles source text, returning the bytes together with the resolved
/// symbol table.
pub fn assemble_with_symbols(source: &str) -> Result<AssemblerOutput, AssemblerError> {
    let mut symbols = SymbolTable::new();
    let mut lines = Vec::new();

    // Pass 1: parse every line, record labels at their byte offset.
    let mut offset = 0usize;
    for (index, raw) in source.lines().enumerate() {
        let line = parser::parse_line(raw, index + 1)?;
        match &line.kind {
            LineKind::Blank => {}
            LineKind::Label(name) => {
                if offset >= MEMORY_SIZE {
                    return Err(AssemblerError::ProgramTooLarge { bytes: offset + 1 });
                }
                symbols
                    .define(name.clone(), offset as u8, line.number)
                    .map_err(|first| AssemblerError::DuplicateLabel {
                        line: line.number,
                        name: name.clone(),
                        first: first.defined_at,
                    })?;
            }
            _ => offset += encoder::size(&line),
        }
        lines.push(line);
    }

    if offset > MEMORY_SIZE {
        return Err(AssemblerError::ProgramTooLarge { bytes: offset });
    }

    // Pass 2: encode with the full symbol table in hand.
    let mut bytes = Vec::with_capacity(offset);
    for line in &lines {
        encoder::encode(line, &symbols, &mut bytes)?;
    }

    Ok(AssemblerOutput {
        bytes,
        symbols: symbols.into_symbols(),
    })
}
