//! Encodes parsed lines into machine code bytes.
//!
//! Sizing and encoding are split so pass 1 can lay out labels without a
//! symbol table: an instruction's length depends only on whether it takes an
//! operand, never on the operand's value.

use crate::addressing::AddressingMode;
use crate::assembler::parser::{LineKind, Operand, OperandValue, SourceLine};
use crate::assembler::symbol_table::SymbolTable;
use crate::assembler::AssemblerError;
use crate::opcodes::{opcode_byte, standard_mnemonic, Mnemonic};

/// Encoded size of a line in bytes. Pure in the line's shape: labels and
/// blanks are zero, implied instructions one, operand-taking instructions
/// two, `BYTE` runs their literal length.
#[must_use]
pub fn size(line: &SourceLine) -> usize {
    match &line.kind {
        LineKind::Blank | LineKind::Label(_) => 0,
        LineKind::Bytes(bytes) => bytes.len(),
        LineKind::Instruction { operand: None, .. } => 1,
        LineKind::Instruction { .. } => 2,
    }
}

/// Encodes one line, appending its bytes to `out`.
pub fn encode(
    line: &SourceLine,
    symbols: &SymbolTable,
    out: &mut Vec<u8>,
) -> Result<(), AssemblerError> {
    match &line.kind {
        LineKind::Blank | LineKind::Label(_) => Ok(()),
        LineKind::Bytes(bytes) => {
            out.extend_from_slice(bytes);
            Ok(())
        }
        LineKind::Instruction { mnemonic, operand } => {
            encode_instruction(line.number, mnemonic, operand.as_ref(), symbols, out)
        }
    }
}

fn encode_instruction(
    number: usize,
    name: &str,
    operand: Option<&Operand>,
    symbols: &SymbolTable,
    out: &mut Vec<u8>,
) -> Result<(), AssemblerError> {
    let mnemonic = standard_mnemonic(name).ok_or_else(|| AssemblerError::UnknownMnemonic {
        line: number,
        text: name.to_string(),
    })?;

    let mode = select_mode(number, mnemonic, operand)?;
    out.push(opcode_byte(mnemonic, mode));

    match operand {
        None => {}
        Some(Operand::Immediate(value)) => out.push(*value),
        Some(Operand::Direct(value)) | Some(Operand::Indirect(value)) => {
            out.push(resolve(number, value, symbols)?);
        }
    }
    Ok(())
}

/// Maps the operand's syntactic family onto the mnemonic's legal modes. A
/// direct operand means absolute addressing for data mnemonics and
/// absolute-branching for branch mnemonics; likewise for indirect. The
/// mnemonic declares which family it belongs to, so the first candidate it
/// lists is the encoding.
fn select_mode(
    number: usize,
    mnemonic: &Mnemonic,
    operand: Option<&Operand>,
) -> Result<AddressingMode, AssemblerError> {
    let (family, candidates): (&'static str, &[AddressingMode]) = match operand {
        None => ("implied", &[AddressingMode::Implied]),
        Some(Operand::Immediate(_)) => ("immediate", &[AddressingMode::Immediate]),
        Some(Operand::Direct(_)) => (
            "absolute",
            &[AddressingMode::Absolute, AddressingMode::AbsoluteBranching],
        ),
        Some(Operand::Indirect(_)) => (
            "indirect",
            &[AddressingMode::Indirect, AddressingMode::IndirectBranching],
        ),
    };

    candidates
        .iter()
        .copied()
        .find(|mode| mnemonic.addressing_modes.contains(mode))
        .ok_or_else(|| AssemblerError::IllegalAddressingMode {
            line: number,
            mnemonic: mnemonic.name.to_string(),
            mode: family,
            operand: operand.map(|o| o.to_string()).unwrap_or_default(),
        })
}

fn resolve(
    number: usize,
    value: &OperandValue,
    symbols: &SymbolTable,
) -> Result<u8, AssemblerError> {
    match value {
        OperandValue::Literal(byte) => Ok(*byte),
        OperandValue::Label(name) => {
            symbols
                .lookup(name)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: number,
                    name: name.clone(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::parser::parse_line;

    fn encode_one(raw: &str, symbols: &SymbolTable) -> Result<Vec<u8>, AssemblerError> {
        let line = parse_line(raw, 1)?;
        let mut out = Vec::new();
        encode(&line, symbols, &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_mode_selection_per_family() {
        let symbols = SymbolTable::new();
        assert_eq!(encode_one("LDA #$C2", &symbols).unwrap(), vec![0x20, 0xC2]);
        assert_eq!(encode_one("LDA $C2", &symbols).unwrap(), vec![0x00, 0xC2]);
        assert_eq!(encode_one("LDA ($C2)", &symbols).unwrap(), vec![0x10, 0xC2]);
        assert_eq!(encode_one("JMP $04", &symbols).unwrap(), vec![0x34, 0x04]);
        assert_eq!(encode_one("JMP ($04)", &symbols).unwrap(), vec![0x44, 0x04]);
        assert_eq!(encode_one("STA $30", &symbols).unwrap(), vec![0x35, 0x30]);
        assert_eq!(encode_one("OTA", &symbols).unwrap(), vec![0xF6]);
        assert_eq!(encode_one("HLT", &symbols).unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_size_is_pure_in_shape() {
        let implied = parse_line("NOP", 1).unwrap();
        let with_operand = parse_line("JMP somewhere_far_away", 1).unwrap();
        let label = parse_line("here:", 1).unwrap();
        let data = parse_line("BYTE #$010203", 1).unwrap();

        assert_eq!(size(&implied), 1);
        assert_eq!(size(&with_operand), 2);
        assert_eq!(size(&label), 0);
        assert_eq!(size(&data), 3);
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = encode_one("XYZ", &SymbolTable::new()).unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnknownMnemonic {
                line: 1,
                text: "XYZ".to_string(),
            }
        );
    }

    #[test]
    fn test_illegal_mode_for_mnemonic() {
        let symbols = SymbolTable::new();

        // HLT takes no operand.
        assert!(matches!(
            encode_one("HLT $00", &symbols).unwrap_err(),
            AssemblerError::IllegalAddressingMode { .. }
        ));

        // JMP has no immediate form.
        assert!(matches!(
            encode_one("JMP #$04", &symbols).unwrap_err(),
            AssemblerError::IllegalAddressingMode { .. }
        ));

        // LDA requires an operand.
        assert!(matches!(
            encode_one("LDA", &symbols).unwrap_err(),
            AssemblerError::IllegalAddressingMode { .. }
        ));
    }

    #[test]
    fn test_label_resolution() {
        let mut symbols = SymbolTable::new();
        symbols.define("loop".to_string(), 0x02, 1).unwrap();

        assert_eq!(encode_one("JMP loop", &symbols).unwrap(), vec![0x34, 0x02]);
        assert_eq!(encode_one("JMP (loop)", &symbols).unwrap(), vec![0x44, 0x02]);
    }

    #[test]
    fn test_undefined_label() {
        let err = encode_one("JMP nowhere", &SymbolTable::new()).unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UndefinedLabel {
                line: 1,
                name: "nowhere".to_string(),
            }
        );
    }
}
