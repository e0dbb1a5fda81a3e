mod parse;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::memory::AddressSpace;

pub use parse::{parse_next_instruction, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

/// Source operand of an 8-bit load or ALU instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    Accumulator,
    Immediate(u8),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl ReadTarget {
    fn read_value(self, cpu_registers: &mut CpuRegisters, address_space: &mut AddressSpace) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.read_register(register),
            Self::Accumulator => cpu_registers.accumulator,
            Self::Immediate(n) => n,
            Self::IndirectHL => address_space.cpu_read_u8(cpu_registers.hl()),
            Self::IndirectBC => address_space.cpu_read_u8(cpu_registers.bc()),
            Self::IndirectDE => address_space.cpu_read_u8(cpu_registers.de()),
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_add(1));
                address_space.cpu_read_u8(hl)
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_sub(1));
                address_space.cpu_read_u8(hl)
            }
            Self::Direct(nn) => address_space.cpu_read_u8(nn),
            Self::FFDirect(n) => address_space.cpu_read_u8(u16::from_be_bytes([0xFF, n])),
            Self::FFIndirectC => {
                address_space.cpu_read_u8(u16::from_be_bytes([0xFF, cpu_registers.c]))
            }
        }
    }

    // Extra T-cycles on top of the 4 needed to fetch the opcode
    fn extra_cycles(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::Immediate(..)
            | Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// Destination operand of an 8-bit load instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    Accumulator,
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl WriteTarget {
    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
    ) {
        match self {
            Self::Register(register) => cpu_registers.set_register(register, value),
            Self::Accumulator => cpu_registers.accumulator = value,
            Self::IndirectHL => address_space.write_address_u8(cpu_registers.hl(), value),
            Self::IndirectBC => address_space.write_address_u8(cpu_registers.bc(), value),
            Self::IndirectDE => address_space.write_address_u8(cpu_registers.de(), value),
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_add(1));
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_sub(1));
            }
            Self::Direct(nn) => address_space.write_address_u8(nn, value),
            Self::FFDirect(n) => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, n]), value);
            }
            Self::FFIndirectC => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]), value);
            }
        }
    }

    fn extra_cycles(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// Operand of a read-modify-write instruction (INC/DEC, rotates, shifts, SET/RES).
///
/// `Accumulator` is only used by the unprefixed rotate instructions (RLCA etc.), which always
/// clear Z; the prefixed forms targeting A use `Register(CpuRegister::A)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Accumulator,
    Register(CpuRegister),
    IndirectHL,
}

impl ModifyTarget {
    fn read_value(self, cpu_registers: &CpuRegisters, address_space: &mut AddressSpace) -> u8 {
        match self {
            Self::Accumulator => cpu_registers.accumulator,
            Self::Register(register) => cpu_registers.read_register(register),
            Self::IndirectHL => address_space.cpu_read_u8(cpu_registers.hl()),
        }
    }

    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
    ) {
        match self {
            Self::Accumulator => cpu_registers.accumulator = value,
            Self::Register(register) => cpu_registers.set_register(register, value),
            Self::IndirectHL => address_space.write_address_u8(cpu_registers.hl(), value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD <w>, <r>
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LD HL, SP+e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD A, <r>
    Add(ReadTarget),
    // ADC A, <r>
    AddWithCarry(ReadTarget),
    // SUB <r>
    Subtract(ReadTarget),
    // SBC A, <r>
    SubtractWithCarry(ReadTarget),
    // CP <r>
    Compare(ReadTarget),
    // INC <m>
    Increment(ModifyTarget),
    // DEC <m>
    Decrement(ModifyTarget),
    // AND <r>
    And(ReadTarget),
    // OR <r>
    Or(ReadTarget),
    // XOR <r>
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC <m>
    RotateLeft(ModifyTarget),
    // RLA / RL <m>
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC <m>
    RotateRight(ModifyTarget),
    // RRA / RR <m>
    RotateRightThruCarry(ModifyTarget),
    // SLA <m>
    ShiftLeft(ModifyTarget),
    // SRA <m>
    ArithmeticShiftRight(ModifyTarget),
    // SRL <m>
    LogicalShiftRight(ModifyTarget),
    // SWAP <m>
    Swap(ModifyTarget),
    // BIT n, <r>
    TestBit(u8, ReadTarget),
    // SET n, <m>
    SetBit(u8, ModifyTarget),
    // RES n, <m>
    ResetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// Execute this instruction, assuming PC has already been advanced past it.
    pub fn execute(self, address_space: &mut AddressSpace, cpu_registers: &mut CpuRegisters) {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                write_target.write_value(value, cpu_registers, address_space);
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::LoadHLStackPointerOffset(e) => {
                let (sum, h_flag, c_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.set_hl(sum);
                cpu_registers.set_flags(false, false, h_flag, c_flag);
            }
            Self::PushStack(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                push_stack(cpu_registers, address_space, value);
            }
            Self::PopStack(rr) => {
                let value = pop_stack(cpu_registers, address_space);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::Add(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (sum, h_flag, c_flag) = add(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, c_flag);
            }
            Self::AddWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (sum, h_flag, c_flag) =
                    add(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, c_flag);
            }
            Self::Subtract(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, h_flag, c_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, c_flag);
            }
            Self::SubtractWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, h_flag, c_flag) =
                    sub(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, c_flag);
            }
            Self::Compare(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, h_flag, c_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.set_flags(difference == 0, true, h_flag, c_flag);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let sum = value.wrapping_add(1);
                let h_flag = value & 0x0F == 0x0F;
                modify_target.write_value(sum, cpu_registers, address_space);
                cpu_registers.set_some_flags(Some(sum == 0), Some(false), Some(h_flag), None);
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let difference = value.wrapping_sub(1);
                let h_flag = value & 0x0F == 0x00;
                modify_target.write_value(difference, cpu_registers, address_space);
                cpu_registers.set_some_flags(Some(difference == 0), Some(true), Some(h_flag), None);
            }
            Self::And(read_target) => {
                let operand = read_target.read_value(cpu_registers, address_space);
                let value = cpu_registers.accumulator & operand;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::Or(read_target) => {
                let operand = read_target.read_value(cpu_registers, address_space);
                let value = cpu_registers.accumulator | operand;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::Xor(read_target) => {
                let operand = read_target.read_value(cpu_registers, address_space);
                let value = cpu_registers.accumulator ^ operand;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::AddHLRegister(rr) => {
                let hl = cpu_registers.hl();
                let value = cpu_registers.read_register_pair(rr);
                let (sum, c_flag) = hl.overflowing_add(value);
                let h_flag = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
                cpu_registers.set_hl(sum);
                cpu_registers.set_some_flags(None, Some(false), Some(h_flag), Some(c_flag));
            }
            Self::IncRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr).wrapping_add(1);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::DecRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr).wrapping_sub(1);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::AddSPImmediate(e) => {
                let (sum, h_flag, c_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.sp = sum;
                cpu_registers.set_flags(false, false, h_flag, c_flag);
            }
            Self::RotateLeft(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x80 != 0;
                let value = value.rotate_left(1);
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::RotateLeftThruCarry(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x80 != 0;
                let value = (value << 1) | u8::from(cpu_registers.carry_flag());
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::RotateRight(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x01 != 0;
                let value = value.rotate_right(1);
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::RotateRightThruCarry(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x01 != 0;
                let value = (value >> 1) | (u8::from(cpu_registers.carry_flag()) << 7);
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::ShiftLeft(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x80 != 0;
                let value = value << 1;
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::ArithmeticShiftRight(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x01 != 0;
                let value = (value >> 1) | (value & 0x80);
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::LogicalShiftRight(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let c_flag = value & 0x01 != 0;
                let value = value >> 1;
                modify_target.write_value(value, cpu_registers, address_space);
                set_shift_flags(cpu_registers, modify_target, value, c_flag);
            }
            Self::Swap(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let value = value.rotate_left(4);
                modify_target.write_value(value, cpu_registers, address_space);
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::TestBit(n, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let z_flag = value & (1 << n) == 0;
                cpu_registers.set_some_flags(Some(z_flag), Some(false), Some(true), None);
            }
            Self::SetBit(n, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                modify_target.write_value(value | (1 << n), cpu_registers, address_space);
            }
            Self::ResetBit(n, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                modify_target.write_value(value & !(1 << n), cpu_registers, address_space);
            }
            Self::ComplementCarryFlag => {
                let c_flag = !cpu_registers.carry_flag();
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(c_flag));
            }
            Self::SetCarryFlag => {
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(true));
            }
            Self::DecimalAdjustAccumulator => {
                let (value, c_flag) = decimal_adjust(cpu_registers);
                cpu_registers.accumulator = value;
                cpu_registers.set_some_flags(Some(value == 0), None, Some(false), Some(c_flag));
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator = !cpu_registers.accumulator;
                cpu_registers.set_some_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
                }
            }
            Self::Call(nn) => {
                let return_address = cpu_registers.pc;
                push_stack(cpu_registers, address_space, return_address);
                cpu_registers.pc = nn;
            }
            Self::CallCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    let return_address = cpu_registers.pc;
                    push_stack(cpu_registers, address_space, return_address);
                    cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                cpu_registers.pc = pop_stack(cpu_registers, address_space);
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = pop_stack(cpu_registers, address_space);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = pop_stack(cpu_registers, address_space);
                cpu_registers.ime = true;
                cpu_registers.interrupt_delay = false;
            }
            Self::RestartCall(n) => {
                let return_address = cpu_registers.pc;
                push_stack(cpu_registers, address_space, return_address);
                cpu_registers.pc = n.into();
            }
            Self::Halt => {
                log::debug!("HALT at PC={:04X}", cpu_registers.pc.wrapping_sub(1));
                cpu_registers.halted = true;
            }
            Self::Stop => {
                log::debug!("STOP at PC={:04X}, resetting DIV", cpu_registers.pc.wrapping_sub(2));
                address_space.reset_divider();
            }
            Self::DisableInterrupts => {
                cpu_registers.ime = false;
                cpu_registers.interrupt_delay = false;
            }
            Self::EnableInterrupts => {
                // IME takes effect after the next instruction
                if !cpu_registers.ime {
                    cpu_registers.ime = true;
                    cpu_registers.interrupt_delay = true;
                }
            }
            Self::NoOp => {}
        }
    }

    /// Return the number of T-cycles this instruction takes to execute given the current flags.
    /// Conditional control flow takes longer when the branch is taken.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::Load(write_target, read_target) => {
                4 + write_target.extra_cycles() + read_target.extra_cycles()
            }
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::Compare(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target) => 4 + read_target.extra_cycles(),
            Self::Increment(modify_target) | Self::Decrement(modify_target) => {
                match modify_target {
                    ModifyTarget::Accumulator | ModifyTarget::Register(..) => 4,
                    ModifyTarget::IndirectHL => 12,
                }
            }
            Self::RotateLeft(modify_target)
            | Self::RotateLeftThruCarry(modify_target)
            | Self::RotateRight(modify_target)
            | Self::RotateRightThruCarry(modify_target)
            | Self::ShiftLeft(modify_target)
            | Self::ArithmeticShiftRight(modify_target)
            | Self::LogicalShiftRight(modify_target)
            | Self::Swap(modify_target)
            | Self::SetBit(_, modify_target)
            | Self::ResetBit(_, modify_target) => match modify_target {
                ModifyTarget::Accumulator => 4,
                ModifyTarget::Register(..) => 8,
                ModifyTarget::IndirectHL => 16,
            },
            Self::TestBit(_, read_target) => match read_target {
                ReadTarget::IndirectHL => 12,
                _ => 8,
            },
            Self::LoadRegisterPairImmediate(..)
            | Self::LoadHLStackPointerOffset(..)
            | Self::PopStack(..)
            | Self::RelativeJump(..) => 12,
            Self::LoadDirectStackPointer(..) => 20,
            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 8,
            Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 16,
            Self::JumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    12
                } else {
                    8
                }
            }
            Self::Call(..) => 24,
            Self::CallCond(cc, _) => {
                if cc.check(cpu_registers) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    20
                } else {
                    8
                }
            }
            Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::JumpHL
            | Self::Halt
            | Self::Stop
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 4,
        }
    }
}

/// Push a 16-bit value: high byte at SP-1, then low byte at SP-2.
pub(crate) fn push_stack(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
    value: u16,
) {
    let [high, low] = value.to_be_bytes();
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(1);
    address_space.write_address_u8(cpu_registers.sp, high);
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(1);
    address_space.write_address_u8(cpu_registers.sp, low);
}

/// Pop a 16-bit value: low byte first, then high byte.
fn pop_stack(cpu_registers: &mut CpuRegisters, address_space: &mut AddressSpace) -> u16 {
    let low = address_space.cpu_read_u8(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(1);
    let high = address_space.cpu_read_u8(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(1);
    u16::from_be_bytes([high, low])
}

// Returns (sum, H, C)
fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let sum = l_value.wrapping_add(r_value).wrapping_add(carry);
    let h_flag = (l_value & 0x0F) + (r_value & 0x0F) + carry > 0x0F;
    let c_flag = u16::from(l_value) + u16::from(r_value) + u16::from(carry) > 0xFF;
    (sum, h_flag, c_flag)
}

// Returns (difference, H, C)
fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let difference = l_value.wrapping_sub(r_value).wrapping_sub(carry);
    let h_flag = (l_value & 0x0F) < (r_value & 0x0F) + carry;
    let c_flag = u16::from(l_value) < u16::from(r_value) + u16::from(carry);
    (difference, h_flag, c_flag)
}

// H and C come from the unsigned addition of the low byte of SP and the offset
fn add_sp_offset(sp: u16, e: i8) -> (u16, bool, bool) {
    let offset = e as u8;
    let h_flag = (sp & 0x000F) + u16::from(offset & 0x0F) > 0x000F;
    let c_flag = (sp & 0x00FF) + u16::from(offset) > 0x00FF;
    (sp.wrapping_add_signed(e.into()), h_flag, c_flag)
}

fn set_shift_flags(
    cpu_registers: &mut CpuRegisters,
    modify_target: ModifyTarget,
    value: u8,
    c_flag: bool,
) {
    let z_flag = match modify_target {
        ModifyTarget::Accumulator => false,
        ModifyTarget::Register(..) | ModifyTarget::IndirectHL => value == 0,
    };
    cpu_registers.set_flags(z_flag, false, false, c_flag);
}

// Returns (adjusted A, C)
fn decimal_adjust(cpu_registers: &CpuRegisters) -> (u8, bool) {
    let mut value = cpu_registers.accumulator;
    let mut c_flag = cpu_registers.carry_flag();

    if cpu_registers.subtract_flag() {
        if c_flag {
            value = value.wrapping_sub(0x60);
        }
        if cpu_registers.half_carry_flag() {
            value = value.wrapping_sub(0x06);
        }
    } else {
        if c_flag || value > 0x99 {
            value = value.wrapping_add(0x60);
            c_flag = true;
        }
        if cpu_registers.half_carry_flag() || value & 0x0F > 0x09 {
            value = value.wrapping_add(0x06);
        }
    }

    (value, c_flag)
}
