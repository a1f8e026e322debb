//! # Control Signals and Control Words
//!
//! This module defines the named control signals that wire the machine
//! together and the [`ControlWord`] bitset that says which signals are active
//! during one T-state.
//!
//! A microprogram is an ordered sequence of control words. Because
//! `ControlWord` is const-constructible, microcode lives in `const` tables
//! (see [`crate::opcodes`]) rather than being built at runtime.

/// A named control signal.
///
/// Latch signals (`Latch*`) tell a component to capture the bus value on the
/// clock edge; enable signals (`Enable*`) tell a component to drive the bus.
/// Correct microcode never asserts two enable signals in the same control
/// word; the bus arbiter treats that as a wiring fault
/// ([`crate::MachineError::BusContention`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Signal {
    /// Program counter drives the bus.
    EnablePc,
    /// Program counter increments.
    IncrementPc,
    /// Program counter latches an absolute address from the bus (jumps).
    LatchPc,
    /// Program counter parks on the current instruction and freezes.
    HaltPc,
    /// Memory address register latches the bus value.
    LatchMar,
    /// Memory stores the bus value at the MAR address.
    LatchRam,
    /// Memory drives the bus with the byte at the MAR address.
    EnableRam,
    /// Instruction register latches the bus value.
    LatchI,
    /// Accumulator latches the bus value.
    LatchA,
    /// Accumulator drives the bus.
    EnableA,
    /// B register latches the bus value.
    LatchB,
    /// Output register latches the bus value and fires the output hook.
    LatchO,
    /// Arithmetic unit drives the bus with A + B (or A - B with [`Signal::Subtract`]).
    EnableAlu,
    /// Arithmetic unit subtracts instead of adding. Only meaningful together
    /// with [`Signal::EnableAlu`].
    Subtract,
    /// Machine invokes the bulk-memory (DMA) hook.
    Dma,
}

impl Signal {
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// The set of control signals active during one T-state.
///
/// Immutable and `Copy`; built up with [`ControlWord::with`] in `const`
/// context:
///
/// ```
/// use sap8::{ControlWord, Signal};
///
/// const FETCH_T0: ControlWord = ControlWord::NONE
///     .with(Signal::EnablePc)
///     .with(Signal::LatchMar)
///     .with(Signal::IncrementPc);
///
/// assert!(FETCH_T0.contains(Signal::EnablePc));
/// assert!(!FETCH_T0.contains(Signal::EnableRam));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlWord(u16);

impl ControlWord {
    /// The empty control word: no signals, nothing happens on the edge.
    pub const NONE: ControlWord = ControlWord(0);

    /// Returns a copy of this word with `signal` also asserted.
    #[must_use]
    pub const fn with(self, signal: Signal) -> ControlWord {
        ControlWord(self.0 | signal.bit())
    }

    /// Returns true if `signal` is asserted in this word.
    #[must_use]
    pub const fn contains(self, signal: Signal) -> bool {
        self.0 & signal.bit() != 0
    }

    /// Returns true if no signal is asserted.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Debug for ControlWord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        const ALL: [Signal; 15] = [
            Signal::EnablePc,
            Signal::IncrementPc,
            Signal::LatchPc,
            Signal::HaltPc,
            Signal::LatchMar,
            Signal::LatchRam,
            Signal::EnableRam,
            Signal::LatchI,
            Signal::LatchA,
            Signal::EnableA,
            Signal::LatchB,
            Signal::LatchO,
            Signal::EnableAlu,
            Signal::Subtract,
            Signal::Dma,
        ];

        let mut set = f.debug_set();
        for signal in ALL {
            if self.contains(signal) {
                set.entry(&signal);
            }
        }
        set.finish()
    }
}
