use super::{hash_map, load_immediate_hex, run_test, set_in_state, ExpectedState, ALL_REGISTERS};

#[test]
fn bit_test_random_values() {
    for r in ALL_REGISTERS {
        let n: u8 = rand::random();

        for bit in 0..8 {
            let opcode = 0x40 | (bit << 3) | r.to_opcode_bits();

            // BIT keeps C, sets H, clears N
            let z = u8::from(n & (1 << bit) == 0) << 7;
            let mut expected_state = ExpectedState {
                f: Some(z | 0x20),
                ..ExpectedState::empty()
            };
            set_in_state(&mut expected_state, r, n);
            run_test(
                // LD <r>, n; BIT <bit>, <r>
                &format!("{}CB{opcode:02X}", load_immediate_hex(r, n)),
                &expected_state,
            );
        }
    }

    run_test(
        // SCF; LD E, 0x08; BIT 3, E
        "371E08CB5B",
        &ExpectedState {
            f: Some(0x30),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn bit_test_indirect_hl() {
    run_test(
        // LD HL, 0xC400; LD (HL), 0x40; BIT 6, (HL); LD B, A; BIT 7, (HL)
        "2100C43640CB7647CB7E",
        &ExpectedState {
            f: Some(0xA0),
            memory: hash_map! { 0xC400: 0x40 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn set_and_reset_bits() {
    for r in ALL_REGISTERS {
        let bit: u8 = rand::random::<u8>() % 8;
        let set_opcode = 0xC0 | (bit << 3) | r.to_opcode_bits();
        let reset_opcode = 0x80 | (bit << 3) | r.to_opcode_bits();

        // flags are untouched
        let mut expected_state = ExpectedState {
            f: Some(0x10),
            ..ExpectedState::empty()
        };
        set_in_state(&mut expected_state, r, 1 << bit);
        run_test(
            // SCF; LD <r>, 0x00; SET <bit>, <r>
            &format!("37{}CB{set_opcode:02X}", load_immediate_hex(r, 0x00)),
            &expected_state,
        );

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, !(1 << bit));
        run_test(
            // LD <r>, 0xFF; RES <bit>, <r>
            &format!("{}CB{reset_opcode:02X}", load_immediate_hex(r, 0xFF)),
            &expected_state,
        );
    }
}

#[test]
fn set_and_reset_indirect_hl() {
    run_test(
        // LD HL, 0xC500; LD (HL), 0x0F; SET 7, (HL); RES 0, (HL)
        "2100C5360FCBFECB86",
        &ExpectedState {
            memory: hash_map! { 0xC500: 0x8E },
            ..ExpectedState::empty()
        },
    );
}
