use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use once_cell::sync::Lazy;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid opcode {opcode:02X} at PC={pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}

/// One of the 8 operand slots encoded in 3 opcode bits: B, C, D, E, H, L, (HL), A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Register(CpuRegister),
    IndirectHL,
}

const OPERANDS: [Operand; 8] = [
    Operand::Register(CpuRegister::B),
    Operand::Register(CpuRegister::C),
    Operand::Register(CpuRegister::D),
    Operand::Register(CpuRegister::E),
    Operand::Register(CpuRegister::H),
    Operand::Register(CpuRegister::L),
    Operand::IndirectHL,
    Operand::Register(CpuRegister::A),
];

// Bits 4-5 for LD/INC/DEC/ADD HL
const REGISTER_PAIRS: [CpuRegisterPair; 4] = [
    CpuRegisterPair::BC,
    CpuRegisterPair::DE,
    CpuRegisterPair::HL,
    CpuRegisterPair::SP,
];

// Bits 4-5 for PUSH/POP
const STACK_REGISTER_PAIRS: [CpuRegisterPair; 4] = [
    CpuRegisterPair::BC,
    CpuRegisterPair::DE,
    CpuRegisterPair::HL,
    CpuRegisterPair::AF,
];

// Bits 3-4 for conditional jumps/calls/returns
const JUMP_CONDITIONS: [JumpCondition; 4] =
    [JumpCondition::NZ, JumpCondition::Z, JumpCondition::NC, JumpCondition::C];

fn low_operand(opcode: u8) -> Operand {
    OPERANDS[usize::from(opcode & 0x07)]
}

fn mid_operand(opcode: u8) -> Operand {
    OPERANDS[usize::from((opcode >> 3) & 0x07)]
}

fn register_pair(opcode: u8) -> CpuRegisterPair {
    REGISTER_PAIRS[usize::from((opcode >> 4) & 0x03)]
}

fn stack_register_pair(opcode: u8) -> CpuRegisterPair {
    STACK_REGISTER_PAIRS[usize::from((opcode >> 4) & 0x03)]
}

fn jump_condition(opcode: u8) -> JumpCondition {
    JUMP_CONDITIONS[usize::from((opcode >> 3) & 0x03)]
}

fn bit_index(opcode: u8) -> u8 {
    (opcode >> 3) & 0x07
}

impl From<Operand> for ReadTarget {
    fn from(value: Operand) -> Self {
        match value {
            Operand::Register(register) => Self::Register(register),
            Operand::IndirectHL => Self::IndirectHL,
        }
    }
}

impl From<Operand> for WriteTarget {
    fn from(value: Operand) -> Self {
        match value {
            Operand::Register(register) => Self::Register(register),
            Operand::IndirectHL => Self::IndirectHL,
        }
    }
}

impl From<Operand> for ModifyTarget {
    fn from(value: Operand) -> Self {
        match value {
            Operand::Register(register) => Self::Register(register),
            Operand::IndirectHL => Self::IndirectHL,
        }
    }
}

type DecodeFn = fn(opcode: u8, immediate: u16) -> Instruction;

/// Decode table entry: total instruction length in bytes (opcode included) and the function that
/// builds the instruction from the opcode and its little-endian immediate operand, if any.
#[derive(Clone, Copy)]
struct OpcodeEntry {
    length: u16,
    decode: DecodeFn,
}

impl OpcodeEntry {
    const fn new(length: u16, decode: DecodeFn) -> Self {
        Self { length, decode }
    }
}

fn imm8(immediate: u16) -> u8 {
    immediate as u8
}

fn offset8(immediate: u16) -> i8 {
    immediate as u8 as i8
}

fn base_entry(opcode: u8) -> Option<OpcodeEntry> {
    let entry = match opcode {
        0x00 => OpcodeEntry::new(1, |_, _| Instruction::NoOp),
        0x01 | 0x11 | 0x21 | 0x31 => OpcodeEntry::new(3, |opcode, nn| {
            Instruction::LoadRegisterPairImmediate(register_pair(opcode), nn)
        }),
        0x02 => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::IndirectBC, ReadTarget::Accumulator)
        }),
        0x12 => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::IndirectDE, ReadTarget::Accumulator)
        }),
        0x22 => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::IndirectHLInc, ReadTarget::Accumulator)
        }),
        0x32 => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Accumulator)
        }),
        0x03 | 0x13 | 0x23 | 0x33 => {
            OpcodeEntry::new(1, |opcode, _| Instruction::IncRegisterPair(register_pair(opcode)))
        }
        0x0B | 0x1B | 0x2B | 0x3B => {
            OpcodeEntry::new(1, |opcode, _| Instruction::DecRegisterPair(register_pair(opcode)))
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            OpcodeEntry::new(1, |opcode, _| Instruction::AddHLRegister(register_pair(opcode)))
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            OpcodeEntry::new(1, |opcode, _| Instruction::Increment(mid_operand(opcode).into()))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            OpcodeEntry::new(1, |opcode, _| Instruction::Decrement(mid_operand(opcode).into()))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => OpcodeEntry::new(2, |opcode, n| {
            Instruction::Load(mid_operand(opcode).into(), ReadTarget::Immediate(imm8(n)))
        }),
        0x07 => OpcodeEntry::new(1, |_, _| Instruction::RotateLeft(ModifyTarget::Accumulator)),
        0x0F => OpcodeEntry::new(1, |_, _| Instruction::RotateRight(ModifyTarget::Accumulator)),
        0x17 => OpcodeEntry::new(1, |_, _| {
            Instruction::RotateLeftThruCarry(ModifyTarget::Accumulator)
        }),
        0x1F => OpcodeEntry::new(1, |_, _| {
            Instruction::RotateRightThruCarry(ModifyTarget::Accumulator)
        }),
        0x08 => OpcodeEntry::new(3, |_, nn| Instruction::LoadDirectStackPointer(nn)),
        0x0A => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectBC)
        }),
        0x1A => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectDE)
        }),
        0x2A => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLInc)
        }),
        0x3A => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLDec)
        }),
        // STOP is followed by a padding byte
        0x10 => OpcodeEntry::new(2, |_, _| Instruction::Stop),
        0x18 => OpcodeEntry::new(2, |_, e| Instruction::RelativeJump(offset8(e))),
        0x20 | 0x28 | 0x30 | 0x38 => OpcodeEntry::new(2, |opcode, e| {
            Instruction::RelativeJumpCond(jump_condition(opcode), offset8(e))
        }),
        0x27 => OpcodeEntry::new(1, |_, _| Instruction::DecimalAdjustAccumulator),
        0x2F => OpcodeEntry::new(1, |_, _| Instruction::ComplementAccumulator),
        0x37 => OpcodeEntry::new(1, |_, _| Instruction::SetCarryFlag),
        0x3F => OpcodeEntry::new(1, |_, _| Instruction::ComplementCarryFlag),
        0x76 => OpcodeEntry::new(1, |_, _| Instruction::Halt),
        0x40..=0x7F => OpcodeEntry::new(1, |opcode, _| {
            Instruction::Load(mid_operand(opcode).into(), low_operand(opcode).into())
        }),
        0x80..=0x87 => OpcodeEntry::new(1, |opcode, _| {
            Instruction::Add(low_operand(opcode).into())
        }),
        0x88..=0x8F => OpcodeEntry::new(1, |opcode, _| {
            Instruction::AddWithCarry(low_operand(opcode).into())
        }),
        0x90..=0x97 => OpcodeEntry::new(1, |opcode, _| {
            Instruction::Subtract(low_operand(opcode).into())
        }),
        0x98..=0x9F => OpcodeEntry::new(1, |opcode, _| {
            Instruction::SubtractWithCarry(low_operand(opcode).into())
        }),
        0xA0..=0xA7 => OpcodeEntry::new(1, |opcode, _| {
            Instruction::And(low_operand(opcode).into())
        }),
        0xA8..=0xAF => OpcodeEntry::new(1, |opcode, _| {
            Instruction::Xor(low_operand(opcode).into())
        }),
        0xB0..=0xB7 => OpcodeEntry::new(1, |opcode, _| Instruction::Or(low_operand(opcode).into())),
        0xB8..=0xBF => OpcodeEntry::new(1, |opcode, _| {
            Instruction::Compare(low_operand(opcode).into())
        }),
        0xC6 => OpcodeEntry::new(2, |_, n| Instruction::Add(ReadTarget::Immediate(imm8(n)))),
        0xCE => {
            OpcodeEntry::new(2, |_, n| Instruction::AddWithCarry(ReadTarget::Immediate(imm8(n))))
        }
        0xD6 => OpcodeEntry::new(2, |_, n| Instruction::Subtract(ReadTarget::Immediate(imm8(n)))),
        0xDE => OpcodeEntry::new(2, |_, n| {
            Instruction::SubtractWithCarry(ReadTarget::Immediate(imm8(n)))
        }),
        0xE6 => OpcodeEntry::new(2, |_, n| Instruction::And(ReadTarget::Immediate(imm8(n)))),
        0xEE => OpcodeEntry::new(2, |_, n| Instruction::Xor(ReadTarget::Immediate(imm8(n)))),
        0xF6 => OpcodeEntry::new(2, |_, n| Instruction::Or(ReadTarget::Immediate(imm8(n)))),
        0xFE => OpcodeEntry::new(2, |_, n| Instruction::Compare(ReadTarget::Immediate(imm8(n)))),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            OpcodeEntry::new(1, |opcode, _| Instruction::ReturnCond(jump_condition(opcode)))
        }
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            OpcodeEntry::new(1, |opcode, _| Instruction::PopStack(stack_register_pair(opcode)))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            OpcodeEntry::new(1, |opcode, _| Instruction::PushStack(stack_register_pair(opcode)))
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => OpcodeEntry::new(3, |opcode, nn| {
            Instruction::JumpCond(jump_condition(opcode), nn)
        }),
        0xC3 => OpcodeEntry::new(3, |_, nn| Instruction::Jump(nn)),
        0xC4 | 0xCC | 0xD4 | 0xDC => OpcodeEntry::new(3, |opcode, nn| {
            Instruction::CallCond(jump_condition(opcode), nn)
        }),
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            OpcodeEntry::new(1, |opcode, _| Instruction::RestartCall(opcode & 0x38))
        }
        0xC9 => OpcodeEntry::new(1, |_, _| Instruction::Return),
        0xCD => OpcodeEntry::new(3, |_, nn| Instruction::Call(nn)),
        0xD9 => OpcodeEntry::new(1, |_, _| Instruction::ReturnFromInterruptHandler),
        0xE0 => OpcodeEntry::new(2, |_, n| {
            Instruction::Load(WriteTarget::FFDirect(imm8(n)), ReadTarget::Accumulator)
        }),
        0xF0 => OpcodeEntry::new(2, |_, n| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFDirect(imm8(n)))
        }),
        0xE2 => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Accumulator)
        }),
        0xF2 => OpcodeEntry::new(1, |_, _| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFIndirectC)
        }),
        0xEA => OpcodeEntry::new(3, |_, nn| {
            Instruction::Load(WriteTarget::Direct(nn), ReadTarget::Accumulator)
        }),
        0xFA => OpcodeEntry::new(3, |_, nn| {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::Direct(nn))
        }),
        0xE8 => OpcodeEntry::new(2, |_, e| Instruction::AddSPImmediate(offset8(e))),
        0xF8 => OpcodeEntry::new(2, |_, e| Instruction::LoadHLStackPointerOffset(offset8(e))),
        0xE9 => OpcodeEntry::new(1, |_, _| Instruction::JumpHL),
        0xF9 => OpcodeEntry::new(1, |_, _| Instruction::LoadStackPointerHL),
        0xF3 => OpcodeEntry::new(1, |_, _| Instruction::DisableInterrupts),
        0xFB => OpcodeEntry::new(1, |_, _| Instruction::EnableInterrupts),
        // 0xCB is the prefix byte and is handled separately; the rest are unused on the DMG
        0xCB | 0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            return None;
        }
    };

    Some(entry)
}

// Every CB-prefixed opcode is 2 bytes long and takes its operand from bits 0-2
fn cb_entry(opcode: u8) -> OpcodeEntry {
    let decode: DecodeFn = match opcode {
        0x00..=0x07 => |opcode, _| Instruction::RotateLeft(low_operand(opcode).into()),
        0x08..=0x0F => |opcode, _| Instruction::RotateRight(low_operand(opcode).into()),
        0x10..=0x17 => |opcode, _| Instruction::RotateLeftThruCarry(low_operand(opcode).into()),
        0x18..=0x1F => |opcode, _| Instruction::RotateRightThruCarry(low_operand(opcode).into()),
        0x20..=0x27 => |opcode, _| Instruction::ShiftLeft(low_operand(opcode).into()),
        0x28..=0x2F => |opcode, _| Instruction::ArithmeticShiftRight(low_operand(opcode).into()),
        0x30..=0x37 => |opcode, _| Instruction::Swap(low_operand(opcode).into()),
        0x38..=0x3F => |opcode, _| Instruction::LogicalShiftRight(low_operand(opcode).into()),
        0x40..=0x7F => {
            |opcode, _| Instruction::TestBit(bit_index(opcode), low_operand(opcode).into())
        }
        0x80..=0xBF => {
            |opcode, _| Instruction::ResetBit(bit_index(opcode), low_operand(opcode).into())
        }
        0xC0..=0xFF => {
            |opcode, _| Instruction::SetBit(bit_index(opcode), low_operand(opcode).into())
        }
    };

    OpcodeEntry::new(2, decode)
}

static BASE_OPCODE_TABLE: Lazy<[Option<OpcodeEntry>; 256]> =
    Lazy::new(|| std::array::from_fn(|i| base_entry(i as u8)));

static CB_OPCODE_TABLE: Lazy<[OpcodeEntry; 256]> =
    Lazy::new(|| std::array::from_fn(|i| cb_entry(i as u8)));

/// Decode the instruction at `pc`, returning it along with the address of the following
/// instruction.
///
/// # Errors
///
/// Returns an error if the opcode at `pc` is not a valid DMG opcode.
pub fn parse_next_instruction(
    address_space: &AddressSpace,
    pc: u16,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc);

    if opcode == 0xCB {
        let cb_opcode = address_space.read_address_u8(pc.wrapping_add(1));
        let entry = CB_OPCODE_TABLE[usize::from(cb_opcode)];
        return Ok(((entry.decode)(cb_opcode, 0), pc.wrapping_add(entry.length)));
    }

    let entry = BASE_OPCODE_TABLE[usize::from(opcode)]
        .ok_or(ParseError::InvalidOpcode { opcode, pc })?;

    let immediate = match entry.length {
        2 => address_space.read_address_u8(pc.wrapping_add(1)).into(),
        3 => address_space.read_address_u16(pc.wrapping_add(1)),
        _ => 0,
    };

    Ok(((entry.decode)(opcode, immediate), pc.wrapping_add(entry.length)))
}
