//! # Machine Aggregate and Clock Sequencer
//!
//! [`Machine`] wires the components onto the shared bus and runs the
//! fetch-decode-execute cycle one T-state at a time.
//!
//! ## Execution model
//!
//! Every instruction's microprogram begins with the fixed two-step fetch
//! prefix (see [`crate::opcodes::FETCH`]). At the T-state immediately after
//! fetch the instruction register is decoded against the opcode table and the
//! sequencer swaps in that opcode's full microprogram; execution continues
//! through its operand-fetch and operation micro-ops, then wraps back to
//! fetch T0.
//!
//! ## Bus arbitration
//!
//! Each T-state the machine polls every component for bus output *before*
//! applying any clock edge: reads happen before writes, modeling one atomic
//! clock edge. Zero producers leaves the bus empty; exactly one producer puts
//! its byte on the bus; two or more is [`MachineError::BusContention`],
//! a microcode wiring fault that aborts the step.

use log::{debug, trace, warn};

use crate::alu::ArithmeticUnit;
use crate::bus::BusComponent;
use crate::memory::{Memory, GRID_DIM, MEMORY_SIZE};
use crate::opcodes::{OpcodeTable, FETCH, MAX_MICROPROGRAM_LEN};
use crate::register::{ProgramCounter, Register};
use crate::signals::{ControlWord, Signal};
use crate::MachineError;

/// Callback invoked with the full memory grid when a DMA micro-op fires.
pub type DmaHook = Box<dyn FnMut([[u8; GRID_DIM]; GRID_DIM])>;

/// The complete computer: registers, ALU, memory, opcode table, and the
/// microcode sequencer.
///
/// ```
/// use sap8::Machine;
///
/// let mut machine = Machine::new();
/// machine.load_program(&[0x20, 0xC2]).unwrap(); // LDA #$C2
/// machine.step_instruction().unwrap();
///
/// assert_eq!(machine.a(), 0xC2);
/// assert_eq!(machine.pc(), 0x02);
/// ```
pub struct Machine {
    pc: ProgramCounter,
    a: Register,
    b: Register,
    i: Register,
    out: Register,
    alu: ArithmeticUnit,
    memory: Memory,
    opcodes: OpcodeTable,
    dma_hook: Option<DmaHook>,

    /// Index of the next T-state within `exec`.
    t_state: usize,

    /// The microprogram currently being sequenced. Starts as the fetch
    /// prefix; decode swaps in the instruction's full microprogram.
    exec: Vec<ControlWord>,
}

impl Machine {
    /// Creates a machine with the standard instruction set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(OpcodeTable::standard())
    }

    /// Creates a machine with a caller-built opcode table.
    #[must_use]
    pub fn with_table(opcodes: OpcodeTable) -> Self {
        Machine {
            pc: ProgramCounter::new(),
            a: Register::new("A", Signal::LatchA, Some(Signal::EnableA)),
            b: Register::new("B", Signal::LatchB, None),
            i: Register::new("I", Signal::LatchI, None),
            out: Register::new("O", Signal::LatchO, None),
            alu: ArithmeticUnit::new(),
            memory: Memory::new(),
            opcodes,
            dma_hook: None,
            t_state: 0,
            exec: FETCH.to_vec(),
        }
    }

    /// Returns every component to its power-on state and the sequencer to
    /// fetch T0. Clears a sticky halt.
    pub fn reset(&mut self) {
        self.pc.reset();
        self.a.reset();
        self.b.reset();
        self.i.reset();
        self.out.reset();
        self.memory.reset();
        self.t_state = 0;
        self.exec = FETCH.to_vec();
    }

    /// Loads a program into memory starting at address 0 by pulsing
    /// latch-address / latch-data signal pairs, one byte per pair, the same
    /// path front-panel switches would use.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MachineError> {
        if program.len() > MEMORY_SIZE {
            return Err(MachineError::ProgramTooLarge { len: program.len() });
        }

        for (address, &byte) in program.iter().enumerate() {
            self.memory.clock(
                Some(address as u8),
                ControlWord::NONE.with(Signal::LatchMar),
            )?;
            self.memory
                .clock(Some(byte), ControlWord::NONE.with(Signal::LatchRam))?;
        }
        Ok(())
    }

    /// Installs the output-register hook, invoked with the latched byte on
    /// every write. The sink (a display, a test probe) is an external
    /// collaborator.
    pub fn set_output_hook(&mut self, hook: impl FnMut(u8) + 'static) {
        self.out.set_hook(Box::new(hook));
    }

    /// Installs the bulk-memory hook, invoked with the 16x16 grid when a
    /// `DMA` instruction executes.
    pub fn set_dma_hook(&mut self, hook: impl FnMut([[u8; GRID_DIM]; GRID_DIM]) + 'static) {
        self.dma_hook = Some(Box::new(hook));
    }

    /// Executes one T-state.
    ///
    /// Returns `Ok(true)` when the T-state completed the current instruction
    /// (the sequencer wrapped back to fetch T0), `Ok(false)` otherwise.
    pub fn step(&mut self) -> Result<bool, MachineError> {
        let cw = self.exec[self.t_state];

        let data = self.bus_data(cw)?;
        trace!("T{}: bus={:02X?} cw={:?}", self.t_state, data, cw);

        self.apply_clock(data, cw)?;

        // The fetch prefix just latched the instruction register: decode.
        if self.t_state == 1 {
            self.decode();
        }

        self.t_state += 1;
        if self.t_state >= self.exec.len() {
            self.t_state = 0;
            self.exec = FETCH.to_vec();
            return Ok(true);
        }
        Ok(false)
    }

    /// Executes T-states until the current instruction completes.
    ///
    /// The loop is explicitly bounded by the table's microprogram limit; a
    /// halted machine still runs its HLT microprogram to completion with a
    /// frozen PC, so this always terminates and may be called indefinitely.
    pub fn step_instruction(&mut self) -> Result<(), MachineError> {
        for _ in 0..MAX_MICROPROGRAM_LEN {
            if self.step()? {
                return Ok(());
            }
        }
        Err(MachineError::MicrocodeOverrun(MAX_MICROPROGRAM_LEN))
    }

    /// Samples the bus: polls every component, enforcing the at-most-one
    /// producer invariant.
    fn bus_data(&self, cw: ControlWord) -> Result<Option<u8>, MachineError> {
        let outputs = [
            self.pc.data(cw),
            self.a.data(cw),
            self.b.data(cw),
            self.i.data(cw),
            self.out.data(cw),
            self.alu.data(cw, self.a.value(), self.b.value()),
            self.memory.data(cw),
        ];

        let mut bus = None;
        let mut producers = 0;
        for output in outputs {
            if let Some(value) = output {
                producers += 1;
                bus = Some(value);
            }
        }

        if producers > 1 {
            return Err(MachineError::BusContention {
                producers,
                cw,
            });
        }
        Ok(bus)
    }

    /// Applies one clock edge to every component with the sampled bus value.
    fn apply_clock(&mut self, data: Option<u8>, cw: ControlWord) -> Result<(), MachineError> {
        self.pc.clock(data, cw)?;
        self.a.clock(data, cw)?;
        self.b.clock(data, cw)?;
        self.i.clock(data, cw)?;
        self.out.clock(data, cw)?;
        self.memory.clock(data, cw)?;

        if cw.contains(Signal::Dma) {
            if let Some(hook) = &mut self.dma_hook {
                hook(self.memory.grid());
            }
        }
        Ok(())
    }

    /// Decodes the instruction register against the opcode table and swaps in
    /// the instruction's microprogram.
    ///
    /// An unmapped opcode is not fatal: the sequencer substitutes the bare
    /// fetch prefix (a no-op) and reports the condition, the way real
    /// hardware keeps running through undefined opcodes.
    fn decode(&mut self) {
        let opcode = self.i.value();
        match self.opcodes.get(opcode) {
            Some(entry) => {
                debug!(
                    "decode {:#04X}: {} {}",
                    opcode, entry.mnemonic, entry.addressing_mode
                );
                self.exec = entry.microprogram.clone();
            }
            None => {
                warn!("unmapped opcode {:#04X}, substituting no-op", opcode);
                self.exec = FETCH.to_vec();
            }
        }
    }

    // ========== Inspection ==========

    /// Accumulator contents.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.a.value()
    }

    /// B register contents.
    #[must_use]
    pub fn b(&self) -> u8 {
        self.b.value()
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u8 {
        self.pc.value()
    }

    /// Instruction register contents (the opcode being executed).
    #[must_use]
    pub fn instruction(&self) -> u8 {
        self.i.value()
    }

    /// Output register contents (the last byte written to the display).
    #[must_use]
    pub fn output(&self) -> u8 {
        self.out.value()
    }

    /// True once a HLT instruction has frozen the program counter.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.pc.is_halted()
    }

    /// Read-only view of memory, outside the bus protocol.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The full memory contents as a 16x16 grid.
    #[must_use]
    pub fn memory_grid(&self) -> [[u8; GRID_DIM]; GRID_DIM] {
        self.memory.grid()
    }

    /// The machine's opcode table.
    #[must_use]
    pub fn opcodes(&self) -> &OpcodeTable {
        &self.opcodes
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
