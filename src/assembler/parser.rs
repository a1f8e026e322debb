//! Line-level parser for the assembly language.
//!
//! Each source line is independently one of: blank (possibly just a `;`
//! comment), a label definition (`name:` alone on the line), a `BYTE` data
//! directive, or a single instruction with at most one operand. Operand
//! *syntax* picks the addressing-mode family:
//!
//! | form        | family    |
//! |-------------|-----------|
//! | (none)      | implied   |
//! | `#$XX`      | immediate |
//! | `$XX`       | direct    |
//! | `($XX)`     | indirect  |
//! | `name`      | direct    |
//! | `(name)`    | indirect  |
//!
//! Whether "direct" means absolute or absolute-branching is the mnemonic's
//! business, decided in the encoder.

use crate::assembler::AssemblerError;

/// One parsed source line, tagged with its 1-indexed line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Nothing but whitespace or a comment.
    Blank,

    /// A label definition, pinned to the next emitted byte.
    Label(String),

    /// An instruction, operand still unresolved.
    Instruction {
        /// Mnemonic, normalized to uppercase.
        mnemonic: String,
        operand: Option<Operand>,
    },

    /// Literal bytes from a `BYTE #$...` directive.
    Bytes(Vec<u8>),
}

/// An operand as written, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `#$XX` - the byte itself.
    Immediate(u8),

    /// `$XX` or `name` - an address used directly.
    Direct(OperandValue),

    /// `($XX)` or `(name)` - an address used through one extra dereference.
    Indirect(OperandValue),
}

/// The value inside an operand: a literal byte or a label reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandValue {
    Literal(u8),
    Label(String),
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Operand::Immediate(value) => write!(f, "#${:02X}", value),
            Operand::Direct(value) => write!(f, "{}", value),
            Operand::Indirect(value) => write!(f, "({})", value),
        }
    }
}

impl std::fmt::Display for OperandValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OperandValue::Literal(value) => write!(f, "${:02X}", value),
            OperandValue::Label(name) => f.write_str(name),
        }
    }
}

/// Parses one raw source line.
pub fn parse_line(raw: &str, number: usize) -> Result<SourceLine, AssemblerError> {
    let code = raw.split(';').next().unwrap_or("").trim();

    if code.is_empty() {
        return Ok(SourceLine {
            number,
            kind: LineKind::Blank,
        });
    }

    let mut tokens = code.split_whitespace();
    let first = tokens.next().unwrap_or("");

    if let Some(name) = first.strip_suffix(':') {
        // Label definitions stand alone on their line.
        if tokens.next().is_some() {
            return Err(AssemblerError::SyntaxError {
                line: number,
                text: code.to_string(),
            });
        }
        validate_label(name, number)?;
        return Ok(SourceLine {
            number,
            kind: LineKind::Label(name.to_string()),
        });
    }

    let mnemonic = first.to_uppercase();
    let operand_text = tokens.next();

    if tokens.next().is_some() {
        return Err(AssemblerError::SyntaxError {
            line: number,
            text: code.to_string(),
        });
    }

    if mnemonic == "BYTE" {
        let text = operand_text.ok_or_else(|| AssemblerError::BadOperand {
            line: number,
            text: String::new(),
        })?;
        return Ok(SourceLine {
            number,
            kind: LineKind::Bytes(parse_byte_run(text, number)?),
        });
    }

    let operand = match operand_text {
        Some(text) => Some(parse_operand(text, number)?),
        None => None,
    };

    Ok(SourceLine {
        number,
        kind: LineKind::Instruction { mnemonic, operand },
    })
}

fn parse_operand(text: &str, line: usize) -> Result<Operand, AssemblerError> {
    if let Some(hex) = text.strip_prefix("#$") {
        return Ok(Operand::Immediate(parse_byte(hex, text, line)?));
    }

    if let Some(rest) = text.strip_prefix('(') {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| AssemblerError::BadOperand {
                line,
                text: text.to_string(),
            })?;
        return Ok(Operand::Indirect(parse_value(inner.trim(), text, line)?));
    }

    Ok(Operand::Direct(parse_value(text, text, line)?))
}

/// Parses the inside of a direct or indirect operand: `$XX` or a label name.
fn parse_value(inner: &str, whole: &str, line: usize) -> Result<OperandValue, AssemblerError> {
    if let Some(hex) = inner.strip_prefix('$') {
        return Ok(OperandValue::Literal(parse_byte(hex, whole, line)?));
    }

    validate_label(inner, line).map_err(|_| AssemblerError::BadOperand {
        line,
        text: whole.to_string(),
    })?;
    Ok(OperandValue::Label(inner.to_string()))
}

/// Parses a hex byte, distinguishing "not hex" from "too big for a byte".
fn parse_byte(hex: &str, whole: &str, line: usize) -> Result<u8, AssemblerError> {
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AssemblerError::BadOperand {
            line,
            text: whole.to_string(),
        });
    }
    u8::from_str_radix(hex, 16).map_err(|_| AssemblerError::ValueTooLarge {
        line,
        text: whole.to_string(),
    })
}

/// Parses a `BYTE` operand: `#$` followed by an even run of hex digits, two
/// digits per emitted byte.
fn parse_byte_run(text: &str, line: usize) -> Result<Vec<u8>, AssemblerError> {
    let bad = || AssemblerError::BadOperand {
        line,
        text: text.to_string(),
    };

    let hex = text.strip_prefix("#$").ok_or_else(bad)?;
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }

    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).map_err(|_| bad())?;
            u8::from_str_radix(pair, 16).map_err(|_| bad())
        })
        .collect()
}

/// Checks a label name: leading letter, then letters, digits, or underscores.
pub fn validate_label(name: &str, line: usize) -> Result<(), AssemblerError> {
    let mut chars = name.chars();
    match chars.next() {
        None => {
            return Err(AssemblerError::InvalidLabel {
                line,
                name: name.to_string(),
                reason: "empty name",
            })
        }
        Some(c) if !c.is_ascii_alphabetic() => {
            return Err(AssemblerError::InvalidLabel {
                line,
                name: name.to_string(),
                reason: "must start with a letter",
            })
        }
        Some(_) => {}
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AssemblerError::InvalidLabel {
            line,
            name: name.to_string(),
            reason: "only letters, digits, and underscores allowed",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> LineKind {
        parse_line(raw, 1).unwrap().kind
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse(""), LineKind::Blank);
        assert_eq!(parse("   \t "), LineKind::Blank);
        assert_eq!(parse("; just a comment"), LineKind::Blank);
    }

    #[test]
    fn test_implied_instruction() {
        assert_eq!(
            parse("HLT"),
            LineKind::Instruction {
                mnemonic: "HLT".to_string(),
                operand: None,
            }
        );
    }

    #[test]
    fn test_mnemonic_case_normalized() {
        assert_eq!(
            parse("lda #$c2"),
            LineKind::Instruction {
                mnemonic: "LDA".to_string(),
                operand: Some(Operand::Immediate(0xC2)),
            }
        );
    }

    #[test]
    fn test_operand_forms() {
        assert_eq!(
            parse("LDA $C2"),
            LineKind::Instruction {
                mnemonic: "LDA".to_string(),
                operand: Some(Operand::Direct(OperandValue::Literal(0xC2))),
            }
        );
        assert_eq!(
            parse("LDA ($C2)"),
            LineKind::Instruction {
                mnemonic: "LDA".to_string(),
                operand: Some(Operand::Indirect(OperandValue::Literal(0xC2))),
            }
        );
        assert_eq!(
            parse("JMP loop"),
            LineKind::Instruction {
                mnemonic: "JMP".to_string(),
                operand: Some(Operand::Direct(OperandValue::Label("loop".to_string()))),
            }
        );
        assert_eq!(
            parse("JMP (vector)"),
            LineKind::Instruction {
                mnemonic: "JMP".to_string(),
                operand: Some(Operand::Indirect(OperandValue::Label("vector".to_string()))),
            }
        );
    }

    #[test]
    fn test_label_definition() {
        assert_eq!(parse("loop:"), LineKind::Label("loop".to_string()));
        assert_eq!(parse("  loop:  ; top"), LineKind::Label("loop".to_string()));
    }

    #[test]
    fn test_label_definition_must_stand_alone() {
        let err = parse_line("loop: NOP", 4).unwrap_err();
        assert!(matches!(err, AssemblerError::SyntaxError { line: 4, .. }));
    }

    #[test]
    fn test_invalid_label_names() {
        assert!(parse_line("1st:", 1).is_err());
        assert!(parse_line("has space:", 1).is_err()); // two tokens
        assert!(matches!(
            parse_line("bad-name:", 1).unwrap_err(),
            AssemblerError::InvalidLabel { .. }
        ));
    }

    #[test]
    fn test_byte_directive() {
        assert_eq!(parse("BYTE #$C0FFEE"), LineKind::Bytes(vec![0xC0, 0xFF, 0xEE]));
        assert_eq!(parse("BYTE #$00"), LineKind::Bytes(vec![0x00]));
    }

    #[test]
    fn test_byte_directive_rejects_odd_or_bad_hex() {
        assert!(parse_line("BYTE #$ABC", 1).is_err());
        assert!(parse_line("BYTE #$GG", 1).is_err());
        assert!(parse_line("BYTE $AB", 1).is_err());
        assert!(parse_line("BYTE", 1).is_err());
    }

    #[test]
    fn test_value_too_large() {
        let err = parse_line("LDA #$1FF", 7).unwrap_err();
        assert_eq!(
            err,
            AssemblerError::ValueTooLarge {
                line: 7,
                text: "#$1FF".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_operands() {
        assert!(matches!(
            parse_line("LDA ($C2", 1).unwrap_err(),
            AssemblerError::BadOperand { .. }
        ));
        assert!(matches!(
            parse_line("LDA #C2", 1).unwrap_err(),
            AssemblerError::BadOperand { .. }
        ));
        assert!(matches!(
            parse_line("LDA $", 1).unwrap_err(),
            AssemblerError::BadOperand { .. }
        ));
    }

    #[test]
    fn test_too_many_tokens() {
        assert!(matches!(
            parse_line("LDA $00 $01", 1).unwrap_err(),
            AssemblerError::SyntaxError { .. }
        ));
    }
}
