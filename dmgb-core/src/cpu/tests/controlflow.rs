use super::{hash_map, run_test, ExpectedState};
use crate::cpu::instructions::Instruction;
use crate::cpu::{Cpu, CpuRegisters, InterruptType};
use crate::memory::AddressSpace;

#[test]
fn jump() {
    run_test(
        concat!(
            "0611",   // 0x0150: LD B, 0x11
            "C35701", // 0x0152: JP 0x0157
            "0622",   // 0x0155: LD B, 0x22
            "0E33",   // 0x0157: LD C, 0x33
        ),
        &ExpectedState {
            b: Some(0x11),
            c: Some(0x33),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "215801", // 0x0150: LD HL, 0x0158
            "1E01",   // 0x0153: LD E, 0x01
            "E9",     // 0x0155: JP HL
            "1E02",   // 0x0156: LD E, 0x02
            "1601",   // 0x0158: LD D, 0x01
        ),
        &ExpectedState {
            d: Some(0x01),
            e: Some(0x01),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn relative_jump() {
    run_test(
        concat!(
            "1802",   // 0x0150: JR +2
            "3E33",   // 0x0152: LD A, 0x33
            "0677",   // 0x0154: LD B, 0x77
        ),
        &ExpectedState {
            a: Some(0x00),
            b: Some(0x77),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "0605",   // 0x0150: LD B, 0x05
            "AF",     // 0x0152: XOR A
            "C602",   // 0x0153: ADD 0x02
            "05",     // 0x0155: DEC B
            "20FB",   // 0x0156: JR NZ, -5
        ),
        &ExpectedState {
            a: Some(0x0A),
            b: Some(0x00),
            f: Some(0xC0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn conditional_jump() {
    run_test(
        concat!(
            "AF",     // 0x0150: XOR A
            "C25A01", // 0x0151: JP NZ, 0x015A
            "CA5801", // 0x0154: JP Z, 0x0158
            "04",     // 0x0157: INC B
            "0E01",   // 0x0158: LD C, 0x01
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x01),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "37",     // 0x0150: SCF
            "3002",   // 0x0151: JR NC, +2
            "3802",   // 0x0153: JR C, +2
            "0601",   // 0x0155: LD B, 0x01
            "0E01",   // 0x0157: LD C, 0x01
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x01),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn call_and_return() {
    run_test(
        concat!(
            "CD5A01", // 0x0150: CALL 0x015A
            "0622",   // 0x0153: LD B, 0x22
            "C35E01", // 0x0155: JP 0x015E
            "0000",   // 0x0158: NOP; NOP
            "3E11",   // 0x015A: LD A, 0x11
            "C9",     // 0x015C: RET
            "00",     // 0x015D: NOP
        ),
        &ExpectedState {
            a: Some(0x11),
            b: Some(0x22),
            sp: Some(0xFFFE),
            memory: hash_map! { 0xFFFD: 0x01, 0xFFFC: 0x53 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn conditional_call_and_return() {
    run_test(
        concat!(
            "37",     // 0x0150: SCF
            "D45D01", // 0x0151: CALL NC, 0x015D
            "DC5D01", // 0x0154: CALL C, 0x015D
            "C36201", // 0x0157: JP 0x0162
            "000000", // 0x015A: NOP; NOP; NOP
            "D0",     // 0x015D: RET NC
            "3C",     // 0x015E: INC A
            "D8",     // 0x015F: RET C
            "3C",     // 0x0160: INC A
            "00",     // 0x0161: NOP
        ),
        &ExpectedState {
            a: Some(0x01),
            f: Some(0x10),
            sp: Some(0xFFFE),
            memory: hash_map! { 0xFFFD: 0x01, 0xFFFC: 0x57 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn restart_call() {
    let mut address_space = AddressSpace::new();
    let mut registers = CpuRegisters {
        pc: 0xC123,
        sp: 0xDFF0,
        ..CpuRegisters::new()
    };

    Instruction::RestartCall(0x28).execute(&mut address_space, &mut registers);

    assert_eq!(0x0028, registers.pc);
    assert_eq!(0xDFEE, registers.sp);
    assert_eq!(0xC123, address_space.read_address_u16(0xDFEE));
}

const PROGRAM_ADDRESS: u16 = 0xC000;

/// Place `program` in work RAM with IF cleared, and return a CPU about to execute it.
fn cpu_at_program(program: &[u8], ime: bool) -> (Cpu, AddressSpace) {
    let mut address_space = AddressSpace::new();
    for (i, &byte) in program.iter().enumerate() {
        address_space.write_address_u8(PROGRAM_ADDRESS + i as u16, byte);
    }
    address_space.write_address_u8(0xFF0F, 0x00);

    let cpu = Cpu::new(CpuRegisters {
        pc: PROGRAM_ADDRESS,
        sp: 0xDFFE,
        ime,
        ..CpuRegisters::new()
    });

    (cpu, address_space)
}

fn request_interrupt(address_space: &mut AddressSpace, interrupt_type: InterruptType) {
    let flags = address_space.read_address_u8(0xFF0F);
    address_space.write_address_u8(0xFF0F, flags | interrupt_type.bit());
}

#[test]
fn interrupt_dispatch() {
    let (mut cpu, mut address_space) = cpu_at_program(&[0x00], true);
    address_space.write_address_u8(0xFFFF, 0x04);
    request_interrupt(&mut address_space, InterruptType::Timer);

    cpu.cycle(&mut address_space).unwrap();

    assert_eq!(0x0050, cpu.registers().pc);
    assert_eq!(0xDFFC, cpu.registers().sp);
    assert_eq!(PROGRAM_ADDRESS, address_space.read_address_u16(0xDFFC));
    assert!(!cpu.registers().ime);
    assert_eq!(0xE0, address_space.read_address_u8(0xFF0F));

    // 5 M-cycles total
    for _ in 0..4 {
        assert!(!cpu.at_instruction_boundary());
        cpu.cycle(&mut address_space).unwrap();
    }
    assert!(cpu.at_instruction_boundary());
}

#[test]
fn interrupt_priority() {
    let (mut cpu, mut address_space) = cpu_at_program(&[0x00], true);
    address_space.write_address_u8(0xFFFF, 0x1F);
    request_interrupt(&mut address_space, InterruptType::Joypad);
    request_interrupt(&mut address_space, InterruptType::Timer);

    cpu.cycle(&mut address_space).unwrap();

    assert_eq!(InterruptType::Timer.handler_address(), cpu.registers().pc);
    assert_eq!(0xE0 | InterruptType::Joypad.bit(), address_space.read_address_u8(0xFF0F));
}

#[test]
fn interrupt_requires_ime_and_ie() {
    // NOP; NOP
    let (mut cpu, mut address_space) = cpu_at_program(&[0x00, 0x00], false);
    address_space.write_address_u8(0xFFFF, 0x01);
    request_interrupt(&mut address_space, InterruptType::VBlank);

    cpu.cycle(&mut address_space).unwrap();
    assert_eq!(PROGRAM_ADDRESS + 1, cpu.registers().pc);

    let (mut cpu, mut address_space) = cpu_at_program(&[0x00, 0x00], true);
    address_space.write_address_u8(0xFFFF, 0x02);
    request_interrupt(&mut address_space, InterruptType::VBlank);

    cpu.cycle(&mut address_space).unwrap();
    assert_eq!(PROGRAM_ADDRESS + 1, cpu.registers().pc);
}

#[test]
fn halt_wakes_without_ime() {
    // HALT; INC A
    let (mut cpu, mut address_space) = cpu_at_program(&[0x76, 0x3C], false);
    address_space.write_address_u8(0xFFFF, 0x04);

    for _ in 0..10 {
        cpu.cycle(&mut address_space).unwrap();
    }
    assert!(cpu.registers().halted);
    assert_eq!(PROGRAM_ADDRESS + 1, cpu.registers().pc);

    request_interrupt(&mut address_space, InterruptType::Timer);
    cpu.cycle(&mut address_space).unwrap();

    assert!(!cpu.registers().halted);
    assert_eq!(0x01, cpu.registers().accumulator);
    assert_eq!(PROGRAM_ADDRESS + 2, cpu.registers().pc);
    // not serviced
    assert_eq!(0xE4, address_space.read_address_u8(0xFF0F));
}

#[test]
fn halt_then_service_interrupt() {
    // HALT; INC A
    let (mut cpu, mut address_space) = cpu_at_program(&[0x76, 0x3C], true);
    address_space.write_address_u8(0xFFFF, 0x01);

    cpu.cycle(&mut address_space).unwrap();
    cpu.cycle(&mut address_space).unwrap();
    assert!(cpu.registers().halted);

    request_interrupt(&mut address_space, InterruptType::VBlank);
    cpu.cycle(&mut address_space).unwrap();

    assert!(!cpu.registers().halted);
    assert_eq!(0x0040, cpu.registers().pc);
    assert_eq!(PROGRAM_ADDRESS + 1, address_space.read_address_u16(cpu.registers().sp));
    assert_eq!(0x00, cpu.registers().accumulator);
}

#[test]
fn enable_interrupts_is_delayed() {
    // EI; NOP; NOP
    let (mut cpu, mut address_space) = cpu_at_program(&[0xFB, 0x00, 0x00], false);
    address_space.write_address_u8(0xFFFF, 0x04);
    request_interrupt(&mut address_space, InterruptType::Timer);

    cpu.cycle(&mut address_space).unwrap();
    assert!(cpu.registers().ime);
    assert_eq!(PROGRAM_ADDRESS + 1, cpu.registers().pc);

    // the instruction after EI runs before the interrupt is taken
    cpu.cycle(&mut address_space).unwrap();
    assert_eq!(PROGRAM_ADDRESS + 2, cpu.registers().pc);

    cpu.cycle(&mut address_space).unwrap();
    assert_eq!(0x0050, cpu.registers().pc);
    assert_eq!(PROGRAM_ADDRESS + 2, address_space.read_address_u16(cpu.registers().sp));
}

#[test]
fn return_from_interrupt_enables_immediately() {
    // RETI
    let (mut cpu, mut address_space) = cpu_at_program(&[0xD9], false);
    address_space.write_address_u16(0xDFFC, 0xC100);
    cpu.registers_mut().sp = 0xDFFC;

    cpu.cycle(&mut address_space).unwrap();

    let registers = cpu.registers();
    assert_eq!(0xC100, registers.pc);
    assert_eq!(0xDFFE, registers.sp);
    assert!(registers.ime);
    assert!(!registers.interrupt_delay);
}

#[test]
fn disable_interrupts() {
    // DI; NOP
    let (mut cpu, mut address_space) = cpu_at_program(&[0xF3, 0x00], true);
    address_space.write_address_u8(0xFFFF, 0x04);

    cpu.cycle(&mut address_space).unwrap();
    request_interrupt(&mut address_space, InterruptType::Timer);
    cpu.cycle(&mut address_space).unwrap();

    assert!(!cpu.registers().ime);
    assert_eq!(PROGRAM_ADDRESS + 2, cpu.registers().pc);
}
