//! # Memory
//!
//! 256 bytes of random-access memory, addressed exclusively through the
//! memory address register (MAR). The MAR is internal to the memory unit: it
//! latches an address from the bus on [`Signal::LatchMar`] and never drives
//! the bus itself. There is no other addressing path; every read and write
//! goes through whatever address the MAR currently holds.
//!
//! For external inspection the full contents can be exported as a fixed
//! 16x16 grid ([`Memory::grid`]); that path is read-only and sits outside
//! the bus protocol, so it never disturbs the MAR.

use crate::bus::BusComponent;
use crate::signals::{ControlWord, Signal};
use crate::MachineError;

/// Number of addressable bytes.
pub const MEMORY_SIZE: usize = 256;

/// Side length of the inspection grid returned by [`Memory::grid`].
pub const GRID_DIM: usize = 16;

/// The machine's 256-byte memory with its internal address register.
///
/// ```
/// use sap8::{BusComponent, ControlWord, Memory, Signal};
///
/// let mut mem = Memory::new();
///
/// // Latch an address, then store a byte there.
/// mem.clock(Some(0x0F), ControlWord::NONE.with(Signal::LatchMar)).unwrap();
/// mem.clock(Some(0xAB), ControlWord::NONE.with(Signal::LatchRam)).unwrap();
///
/// assert_eq!(mem.data(ControlWord::NONE.with(Signal::EnableRam)), Some(0xAB));
/// assert_eq!(mem.data(ControlWord::NONE), None);
/// ```
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
    mar: u8,
}

impl Memory {
    /// Creates a zeroed memory with the MAR at address 0.
    pub fn new() -> Self {
        Memory {
            cells: [0x00; MEMORY_SIZE],
            mar: 0x00,
        }
    }

    /// Returns the current MAR contents.
    #[must_use]
    pub fn address(&self) -> u8 {
        self.mar
    }

    /// Reads a byte directly, outside the bus protocol. Inspection only;
    /// does not touch the MAR.
    #[must_use]
    pub fn peek(&self, address: u8) -> u8 {
        self.cells[address as usize]
    }

    /// Exports the full contents as a 16x16 grid, row `r` holding addresses
    /// `r * 16 ..= r * 16 + 15`. Read-only, outside the bus protocol.
    #[must_use]
    pub fn grid(&self) -> [[u8; GRID_DIM]; GRID_DIM] {
        let mut grid = [[0u8; GRID_DIM]; GRID_DIM];
        for (high, row) in grid.iter_mut().enumerate() {
            for (low, cell) in row.iter_mut().enumerate() {
                *cell = self.cells[(high << 4) | low];
            }
        }
        grid
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl BusComponent for Memory {
    fn clock(&mut self, data: Option<u8>, cw: ControlWord) -> Result<(), MachineError> {
        if cw.contains(Signal::LatchMar) {
            self.mar = data.ok_or(MachineError::MissingBusData { component: "MAR" })?;
        }
        if cw.contains(Signal::LatchRam) {
            let value = data.ok_or(MachineError::MissingBusData { component: "RAM" })?;
            self.cells[self.mar as usize] = value;
        }
        Ok(())
    }

    fn data(&self, cw: ControlWord) -> Option<u8> {
        if cw.contains(Signal::EnableRam) {
            Some(self.cells[self.mar as usize])
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.cells = [0x00; MEMORY_SIZE];
        self.mar = 0x00;
    }
}
