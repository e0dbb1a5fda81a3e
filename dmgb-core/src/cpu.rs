pub(crate) mod instructions;
mod registers;

#[cfg(test)]
mod tests;

use crate::memory::AddressSpace;
use instructions::{Instruction, ParseError};
pub use registers::{CpuFlags, CpuRegister, CpuRegisterPair, CpuRegisters};

pub const ISR_CYCLES_REQUIRED: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    /// All interrupt types from highest to lowest priority.
    pub const PRIORITY_ORDER: [Self; 5] =
        [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad];

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

pub fn interrupt_triggered(cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> bool {
    cpu_registers.ime && !cpu_registers.interrupt_delay && address_space.pending_interrupts() != 0
}

/// Push PC, clear IME and the serviced IF bit, and jump to the highest priority pending
/// interrupt's handler.
///
/// # Panics
///
/// This function will panic if no enabled interrupt is pending. Callers should check
/// [`interrupt_triggered`] first.
pub fn execute_interrupt_service_routine(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
) {
    let ie_value = address_space.ie_register();
    let interrupt_type = address_space
        .io_registers_mut()
        .interrupt_flags()
        .highest_priority_interrupt(ie_value)
        .expect("execute_interrupt_service_routine should only be called when an interrupt has triggered");

    log::trace!(
        "Interrupt type {interrupt_type:?} triggered, replacing previous PC of {:04X} with {:04X}",
        cpu_registers.pc,
        interrupt_type.handler_address()
    );

    let return_address = cpu_registers.pc;
    instructions::push_stack(cpu_registers, address_space, return_address);
    cpu_registers.pc = interrupt_type.handler_address();

    address_space
        .io_registers_mut()
        .interrupt_flags()
        .clear(interrupt_type);
    cpu_registers.ime = false;
}

/// The CPU as seen by the scheduler: stepped once per M-cycle.
///
/// An instruction's effects are applied on the first M-cycle it occupies; the CPU then stalls for
/// the rest of the instruction's documented duration.
#[derive(Debug, Clone)]
pub struct Cpu {
    registers: CpuRegisters,
    stall_m_cycles: u32,
}

impl Cpu {
    pub fn new(registers: CpuRegisters) -> Self {
        Self {
            registers,
            stall_m_cycles: 0,
        }
    }

    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut CpuRegisters {
        &mut self.registers
    }

    /// Whether the next call to [`Cpu::cycle`] will start a new instruction (or interrupt
    /// dispatch) rather than continue the current one.
    pub fn at_instruction_boundary(&self) -> bool {
        self.stall_m_cycles == 0
    }

    /// Advance the CPU by one M-cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the CPU fetches an invalid opcode. PC is left pointing at the opcode.
    pub fn cycle(&mut self, address_space: &mut AddressSpace) -> Result<(), ParseError> {
        if self.stall_m_cycles > 0 {
            self.stall_m_cycles -= 1;
            return Ok(());
        }

        if self.registers.halted {
            if address_space.pending_interrupts() == 0 {
                return Ok(());
            }

            log::debug!("Exiting HALT at PC={:04X}", self.registers.pc);
            self.registers.halted = false;
        }

        if interrupt_triggered(&self.registers, address_space) {
            execute_interrupt_service_routine(&mut self.registers, address_space);
            self.stall_m_cycles = ISR_CYCLES_REQUIRED / 4 - 1;
            return Ok(());
        }

        let (instruction, pc) =
            instructions::parse_next_instruction(address_space, self.registers.pc)?;
        self.execute(instruction, pc, address_space);

        Ok(())
    }

    fn execute(&mut self, instruction: Instruction, pc: u16, address_space: &mut AddressSpace) {
        let cycles_required = instruction.cycles_required(&self.registers);

        log::trace!(
            "Executing instruction {instruction:02X?} at PC={:04X}, will take {cycles_required} cycles",
            self.registers.pc
        );

        self.registers.pc = pc;

        // EI's delay covers exactly one following instruction
        let interrupt_delay = self.registers.interrupt_delay;
        instruction.execute(address_space, &mut self.registers);
        if interrupt_delay {
            self.registers.interrupt_delay = false;
        }

        self.stall_m_cycles = cycles_required / 4 - 1;
    }
}
