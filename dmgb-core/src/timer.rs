use crate::cpu::InterruptType;
use crate::memory::ioregisters::{InterruptFlags, IoRegister};

/// Divider and programmable timer.
///
/// The 16-bit divider counter advances once per T-cycle and DIV exposes its upper byte. TIMA
/// advances whenever the counter crosses a multiple of the period selected by TAC, so writing
/// DIV also restarts the current TIMA period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    divider_counter: u16,
    tima: u8,
    tma: u8,
    tac: u8,
}

// log2 of the TIMA period in T-cycles for each TAC clock select value
const TIMA_PERIOD_BITS: [u32; 4] = [
    10, // 1024
    4,  // 16
    6,  // 64
    8,  // 256
];

impl Timer {
    pub fn new() -> Self {
        Self {
            divider_counter: 0,
            tima: 0,
            tma: 0,
            tac: 0,
        }
    }

    pub fn divider_counter(&self) -> u16 {
        self.divider_counter
    }

    /// The DIV register: bits 8-15 of the divider counter.
    pub fn div(&self) -> u8 {
        (self.divider_counter >> 8) as u8
    }

    pub fn enabled(&self) -> bool {
        self.tac & 0x04 != 0
    }

    /// Number of T-cycles between TIMA increments under the current TAC clock select.
    pub fn tima_period(&self) -> u32 {
        1 << TIMA_PERIOD_BITS[usize::from(self.tac & 0x03)]
    }

    /// Advance by one T-cycle, requesting a timer interrupt if TIMA overflows.
    pub fn tick(&mut self, interrupt_flags: &mut InterruptFlags<'_>) {
        let old_counter = self.divider_counter;
        let new_counter = old_counter.wrapping_add(1);
        self.divider_counter = new_counter;

        if !self.enabled() {
            return;
        }

        let period_bits = TIMA_PERIOD_BITS[usize::from(self.tac & 0x03)];
        if old_counter >> period_bits == new_counter >> period_bits {
            return;
        }

        match self.tima.overflowing_add(1) {
            (new_tima, false) => {
                self.tima = new_tima;
            }
            (_, true) => {
                log::trace!("TIMA overflow, reloading from TMA={:02X}", self.tma);
                self.tima = self.tma;
                interrupt_flags.set(InterruptType::Timer);
            }
        }
    }

    /// Reset the divider counter to 0, as any CPU write to DIV or a STOP instruction does.
    pub fn reset_divider(&mut self) {
        self.divider_counter = 0;
    }

    /// Read a timer register as the CPU sees it.
    ///
    /// # Panics
    ///
    /// This method will panic if passed a register that is not a timer register.
    pub fn read_register(&self, register: IoRegister) -> u8 {
        match register {
            IoRegister::DIV => self.div(),
            IoRegister::TIMA => self.tima,
            IoRegister::TMA => self.tma,
            IoRegister::TAC => self.tac | 0xF8,
            _ => panic!("not a timer register: {register:?}"),
        }
    }

    /// Write a timer register as the CPU would.
    ///
    /// # Panics
    ///
    /// This method will panic if passed a register that is not a timer register.
    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        match register {
            IoRegister::DIV => self.reset_divider(),
            IoRegister::TIMA => self.tima = value,
            IoRegister::TMA => self.tma = value,
            IoRegister::TAC => self.tac = value & 0x07,
            _ => panic!("not a timer register: {register:?}"),
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
