//! # Arithmetic Unit
//!
//! A combinational adder/subtractor over the accumulator and the B register.
//! It holds no state of its own: its inputs are wired to A and B, and its
//! output appears on the bus whenever its enable signal is asserted.

use crate::signals::{ControlWord, Signal};

/// The combinational arithmetic unit.
///
/// With [`Signal::EnableAlu`] asserted the unit drives `(A + B) mod 256` onto
/// the bus; with [`Signal::Subtract`] also asserted it drives
/// `(A - B) mod 256` (two's-complement wraparound, no carry or borrow
/// exposed).
///
/// Unlike the registers, the unit's output depends on the live A and B
/// values, so the machine hands them in at poll time rather than routing them
/// through the bus contract.
#[derive(Debug, Default)]
pub struct ArithmeticUnit;

impl ArithmeticUnit {
    pub fn new() -> Self {
        ArithmeticUnit
    }

    /// Returns the unit's bus output for this control word, or `None` when
    /// the unit is not enabled.
    #[must_use]
    pub fn data(&self, cw: ControlWord, a: u8, b: u8) -> Option<u8> {
        if !cw.contains(Signal::EnableAlu) {
            return None;
        }

        if cw.contains(Signal::Subtract) {
            Some(a.wrapping_sub(b))
        } else {
            Some(a.wrapping_add(b))
        }
    }
}
