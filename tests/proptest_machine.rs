//! Property-based tests for machine and assembler invariants.

use proptest::prelude::*;
use sap8::{assemble, Machine};

fn run(program: &[u8]) -> Machine {
    let mut machine = Machine::new();
    machine.load_program(program).unwrap();
    for _ in 0..2_000 {
        if machine.is_halted() {
            return machine;
        }
        machine.step_instruction().unwrap();
    }
    panic!("program never halted");
}

proptest! {
    #[test]
    fn prop_lda_immediate_loads_any_byte(value in any::<u8>()) {
        let machine = run(&[0x20, value, 0xFF]);
        prop_assert_eq!(machine.a(), value);
    }

    #[test]
    fn prop_add_is_mod_256(a in any::<u8>(), b in any::<u8>()) {
        let machine = run(&[0x20, a, 0x21, b, 0xFF]);
        prop_assert_eq!(machine.a(), a.wrapping_add(b));
    }

    #[test]
    fn prop_sub_is_mod_256(a in any::<u8>(), b in any::<u8>()) {
        let machine = run(&[0x20, a, 0x22, b, 0xFF]);
        prop_assert_eq!(machine.a(), a.wrapping_sub(b));
    }

    #[test]
    fn prop_store_then_load_roundtrips(value in any::<u8>(), address in 0x20u8..) {
        // LDA #value; STA address; LDA #$00; LDA address; HLT
        // Addresses from 0x20 up stay clear of the 9-byte program.
        let machine = run(&[0x20, value, 0x35, address, 0x20, 0x00, 0x00, address, 0xFF]);
        prop_assert_eq!(machine.a(), value);
        prop_assert_eq!(machine.memory().peek(address), value);
    }

    #[test]
    fn prop_distinct_addresses_are_isolated(
        v1 in any::<u8>(),
        v2 in any::<u8>(),
        a1 in 0x20u8..0x90,
        a2 in 0x90u8..,
    ) {
        // LDA #v1; STA a1; LDA #v2; STA a2; HLT
        let machine = run(&[0x20, v1, 0x35, a1, 0x20, v2, 0x35, a2, 0xFF]);
        prop_assert_eq!(machine.memory().peek(a1), v1);
        prop_assert_eq!(machine.memory().peek(a2), v2);
    }

    #[test]
    fn prop_halt_parks_pc_on_halt_address(nops in 0usize..100) {
        let mut program = vec![0xFE; nops];
        program.push(0xFF);
        let mut machine = run(&program);

        prop_assert_eq!(machine.pc(), nops as u8);

        // Stickiness: further stepping never moves the PC.
        for _ in 0..5 {
            machine.step_instruction().unwrap();
            prop_assert_eq!(machine.pc(), nops as u8);
            prop_assert!(machine.is_halted());
        }
    }

    #[test]
    fn prop_forward_label_offset_tracks_padding(nops in 0usize..40) {
        let mut source = String::from("JMP end\n");
        for _ in 0..nops {
            source.push_str("NOP\n");
        }
        source.push_str("end:\nHLT\n");

        let bytes = assemble(&source).unwrap();
        prop_assert_eq!(bytes[0], 0x34);
        prop_assert_eq!(bytes[1] as usize, 2 + nops);
        prop_assert_eq!(bytes.len(), 3 + nops);
        prop_assert_eq!(*bytes.last().unwrap(), 0xFF);
    }

    #[test]
    fn prop_assembled_immediate_program_runs(value in any::<u8>()) {
        let source = format!("LDA #${:02X}\nOTA\nHLT\n", value);
        let machine = run(&assemble(&source).unwrap());
        prop_assert_eq!(machine.output(), value);
    }
}
