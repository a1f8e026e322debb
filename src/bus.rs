//! # Bus Component Contract
//!
//! Every register and functional unit attached to the internal bus implements
//! [`BusComponent`]: a two-operation clock/data contract that models a
//! synchronous digital circuit at a clock edge.
//!
//! Each T-state the machine first polls every component with
//! [`BusComponent::data`] (sampling the bus before any state changes), then
//! drives every component's [`BusComponent::clock`] with the sampled value.
//! Reads-before-writes is what makes a transfer like "PC → MAR, PC++" safe
//! inside a single control word.

use crate::signals::ControlWord;
use crate::MachineError;

/// A component attached to the shared internal bus.
///
/// Implementations react only to their own signals inside the control word;
/// an edge whose control word carries none of their signals is a no-op.
pub trait BusComponent {
    /// Applies one clock edge.
    ///
    /// `data` is the byte currently on the bus (if any component is driving
    /// it). A component whose latch signal is asserted must receive
    /// `Some(value)`; an asserted latch with an empty bus is a microcode
    /// wiring fault and fails with [`MachineError::MissingBusData`].
    fn clock(&mut self, data: Option<u8>, cw: ControlWord) -> Result<(), MachineError>;

    /// Returns the byte this component drives onto the bus, if its enable
    /// signal is asserted. Write-only components always return `None`.
    fn data(&self, cw: ControlWord) -> Option<u8>;

    /// Returns the component to its power-on state.
    fn reset(&mut self);
}
