//! # Registers
//!
//! One parameterized [`Register`] type covers the accumulator, the B operand
//! register, the instruction register, and the output register: each is just
//! a byte cell with a latch signal, an optional enable signal, and an
//! optional side-effect hook. The [`ProgramCounter`] is its own type because
//! it adds increment, absolute-latch, and sticky-halt behavior.

use crate::bus::BusComponent;
use crate::signals::{ControlWord, Signal};
use crate::MachineError;

/// Callback invoked with the latched byte when a hooked register is written.
pub type WriteHook = Box<dyn FnMut(u8)>;

/// A byte register attached to the bus.
///
/// The latch signal captures the bus value; the enable signal (if the
/// register has one) drives the stored byte onto the bus. Registers without
/// an enable signal are write-only by design: B, the instruction register,
/// and the output register never drive the bus.
///
/// ```
/// use sap8::{BusComponent, ControlWord, Register, Signal};
///
/// let mut a = Register::new("A", Signal::LatchA, Some(Signal::EnableA));
/// a.clock(Some(0xC2), ControlWord::NONE.with(Signal::LatchA)).unwrap();
///
/// assert_eq!(a.data(ControlWord::NONE.with(Signal::EnableA)), Some(0xC2));
/// assert_eq!(a.data(ControlWord::NONE), None);
/// ```
pub struct Register {
    name: &'static str,
    value: u8,
    latch: Signal,
    enable: Option<Signal>,
    hook: Option<WriteHook>,
}

impl Register {
    /// Creates a register with the given latch signal and optional enable
    /// signal. `enable: None` makes the register write-only.
    pub fn new(name: &'static str, latch: Signal, enable: Option<Signal>) -> Self {
        Register {
            name,
            value: 0x00,
            latch,
            enable,
            hook: None,
        }
    }

    /// Installs a side-effect hook fired with the new value on every latch.
    ///
    /// Used by the output register to drive an external display sink.
    pub fn set_hook(&mut self, hook: WriteHook) {
        self.hook = Some(hook);
    }

    /// Returns the stored byte, bypassing the bus. For inspection only; bus
    /// transfers must go through [`BusComponent::data`].
    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns the register's name, used in error reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl BusComponent for Register {
    fn clock(&mut self, data: Option<u8>, cw: ControlWord) -> Result<(), MachineError> {
        if cw.contains(self.latch) {
            let value = data.ok_or(MachineError::MissingBusData {
                component: self.name(),
            })?;
            self.value = value;
            if let Some(hook) = &mut self.hook {
                hook(value);
            }
        }
        Ok(())
    }

    fn data(&self, cw: ControlWord) -> Option<u8> {
        match self.enable {
            Some(enable) if cw.contains(enable) => Some(self.value),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.value = 0x00;
    }
}

/// The program counter.
///
/// Beyond the plain register contract, the PC supports three extra signals:
///
/// - [`Signal::IncrementPc`]: advance by one (wrapping mod 256).
/// - [`Signal::LatchPc`]: load an absolute address from the bus (jumps).
/// - [`Signal::HaltPc`]: step back onto the halt instruction's own address
///   and freeze. The halt is sticky: every later control word is ignored by
///   the PC until [`BusComponent::reset`]. The step-back matters because the
///   fetch that brought in `HLT` already incremented past it.
pub struct ProgramCounter {
    value: u8,
    halted: bool,
}

impl ProgramCounter {
    pub fn new() -> Self {
        ProgramCounter {
            value: 0x00,
            halted: false,
        }
    }

    /// Returns the current counter value, bypassing the bus.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns true once a halt signal has frozen the counter.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl Default for ProgramCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl BusComponent for ProgramCounter {
    fn clock(&mut self, data: Option<u8>, cw: ControlWord) -> Result<(), MachineError> {
        if self.halted {
            return Ok(());
        }

        if cw.contains(Signal::HaltPc) {
            self.value = self.value.wrapping_sub(1);
            self.halted = true;
        } else if cw.contains(Signal::LatchPc) {
            self.value = data.ok_or(MachineError::MissingBusData { component: "PC" })?;
        } else if cw.contains(Signal::IncrementPc) {
            self.value = self.value.wrapping_add(1);
        }
        Ok(())
    }

    fn data(&self, cw: ControlWord) -> Option<u8> {
        // The PC keeps driving the bus while halted; only its clock effects
        // are frozen. The machine re-fetches the halt instruction forever.
        if cw.contains(Signal::EnablePc) {
            Some(self.value)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.value = 0x00;
        self.halted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn cw(signals: &[Signal]) -> ControlWord {
        signals
            .iter()
            .fold(ControlWord::NONE, |word, &s| word.with(s))
    }

    #[test]
    fn test_register_roundtrip() {
        let mut a = Register::new("A", Signal::LatchA, Some(Signal::EnableA));

        assert_eq!(a.data(cw(&[Signal::EnableA])), Some(0x00));
        a.clock(Some(0xAB), cw(&[Signal::LatchA])).unwrap();
        assert_eq!(a.value(), 0xAB);
        assert_eq!(a.data(cw(&[Signal::EnableA])), Some(0xAB));
    }

    #[test]
    fn test_register_without_enable_returns_none() {
        let mut a = Register::new("A", Signal::LatchA, Some(Signal::EnableA));
        a.clock(Some(0xAB), cw(&[Signal::LatchA])).unwrap();
        assert_eq!(a.data(ControlWord::NONE), None);
    }

    #[test]
    fn test_register_ignores_foreign_latch() {
        let mut a = Register::new("A", Signal::LatchA, Some(Signal::EnableA));
        a.clock(Some(0xAB), cw(&[Signal::LatchB])).unwrap();
        assert_eq!(a.value(), 0x00);
    }

    #[test]
    fn test_write_only_register_never_drives_bus() {
        let mut b = Register::new("B", Signal::LatchB, None);
        b.clock(Some(0xAB), cw(&[Signal::LatchB])).unwrap();

        assert_eq!(b.value(), 0xAB);
        assert_eq!(b.data(cw(&[Signal::LatchB])), None);
        assert_eq!(b.data(cw(&[Signal::EnableA])), None);
    }

    #[test]
    fn test_latch_without_bus_value_fails() {
        let mut a = Register::new("A", Signal::LatchA, Some(Signal::EnableA));
        let err = a.clock(None, cw(&[Signal::LatchA])).unwrap_err();
        assert_eq!(err, MachineError::MissingBusData { component: "A" });
    }

    #[test]
    fn test_error_carries_register_name() {
        let mut b = Register::new("B", Signal::LatchB, None);
        assert_eq!(b.name(), "B");

        let err = b.clock(None, cw(&[Signal::LatchB])).unwrap_err();
        assert_eq!(
            err,
            MachineError::MissingBusData {
                component: b.name()
            }
        );
    }

    #[test]
    fn test_register_resets_to_zero() {
        let mut a = Register::new("A", Signal::LatchA, Some(Signal::EnableA));
        a.clock(Some(0xAB), cw(&[Signal::LatchA])).unwrap();
        a.reset();
        assert_eq!(a.value(), 0x00);
    }

    #[test]
    fn test_hook_fires_on_every_latch() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut out = Register::new("O", Signal::LatchO, None);
        out.set_hook(Box::new(move |value| sink.borrow_mut().push(value)));

        out.clock(Some(0x11), cw(&[Signal::LatchO])).unwrap();
        out.clock(Some(0x22), cw(&[Signal::LatchO])).unwrap();
        out.clock(Some(0x33), cw(&[Signal::LatchA])).unwrap(); // not our latch

        assert_eq!(*seen.borrow(), vec![0x11, 0x22]);
    }

    #[test]
    fn test_pc_increments() {
        let mut pc = ProgramCounter::new();

        pc.clock(None, ControlWord::NONE).unwrap();
        assert_eq!(pc.value(), 0x00);

        pc.clock(None, cw(&[Signal::IncrementPc])).unwrap();
        pc.clock(None, cw(&[Signal::IncrementPc])).unwrap();
        assert_eq!(pc.value(), 0x02);
    }

    #[test]
    fn test_pc_increment_wraps() {
        let mut pc = ProgramCounter::new();
        for _ in 0..256 {
            pc.clock(None, cw(&[Signal::IncrementPc])).unwrap();
        }
        assert_eq!(pc.value(), 0x00);
    }

    #[test]
    fn test_pc_latches_absolute_address() {
        let mut pc = ProgramCounter::new();
        pc.clock(Some(0xC4), cw(&[Signal::LatchPc])).unwrap();
        assert_eq!(pc.value(), 0xC4);
    }

    #[test]
    fn test_pc_data_requires_enable() {
        let pc = ProgramCounter::new();
        assert_eq!(pc.data(ControlWord::NONE), None);
        assert_eq!(pc.data(cw(&[Signal::EnablePc])), Some(0x00));
    }

    #[test]
    fn test_pc_halt_parks_and_sticks() {
        let mut pc = ProgramCounter::new();
        for _ in 0..3 {
            pc.clock(None, cw(&[Signal::IncrementPc])).unwrap();
        }

        pc.clock(None, cw(&[Signal::HaltPc])).unwrap();
        assert_eq!(pc.value(), 0x02);
        assert!(pc.is_halted());

        // Every later control word is ignored until reset.
        pc.clock(None, cw(&[Signal::IncrementPc])).unwrap();
        pc.clock(Some(0x80), cw(&[Signal::LatchPc])).unwrap();
        assert_eq!(pc.value(), 0x02);

        // Halted PC still drives the bus.
        assert_eq!(pc.data(cw(&[Signal::EnablePc])), Some(0x02));

        pc.reset();
        assert_eq!(pc.value(), 0x00);
        assert!(!pc.is_halted());
    }
}
