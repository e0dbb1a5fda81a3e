mod lcdc;

use crate::cpu::InterruptType;
use crate::memory::address;
pub use lcdc::{Lcdc, TileDataAddressing};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoRegister {
    JOYP,
    SB,
    SC,
    DIV,
    TIMA,
    TMA,
    TAC,
    IF,
    LCDC,
    STAT,
    SCY,
    SCX,
    LY,
    LYC,
    DMA,
    BGP,
    OBP0,
    OBP1,
    WY,
    WX,
    BOOT,
}

impl IoRegister {
    /// Return the hardware register corresponding to the given address.
    pub fn from_address(address: u16) -> Option<Self> {
        let register = match address {
            0xFF00 => Self::JOYP,
            0xFF01 => Self::SB,
            0xFF02 => Self::SC,
            0xFF04 => Self::DIV,
            0xFF05 => Self::TIMA,
            0xFF06 => Self::TMA,
            0xFF07 => Self::TAC,
            0xFF0F => Self::IF,
            0xFF40 => Self::LCDC,
            0xFF41 => Self::STAT,
            0xFF42 => Self::SCY,
            0xFF43 => Self::SCX,
            0xFF44 => Self::LY,
            0xFF45 => Self::LYC,
            0xFF46 => Self::DMA,
            0xFF47 => Self::BGP,
            0xFF48 => Self::OBP0,
            0xFF49 => Self::OBP1,
            0xFF4A => Self::WY,
            0xFF4B => Self::WX,
            0xFF50 => Self::BOOT,
            _ => return None,
        };

        Some(register)
    }

    /// Return the address for this hardware register.
    pub fn to_address(self) -> u16 {
        match self {
            Self::JOYP => 0xFF00,
            Self::SB => 0xFF01,
            Self::SC => 0xFF02,
            Self::DIV => 0xFF04,
            Self::TIMA => 0xFF05,
            Self::TMA => 0xFF06,
            Self::TAC => 0xFF07,
            Self::IF => 0xFF0F,
            Self::LCDC => 0xFF40,
            Self::STAT => 0xFF41,
            Self::SCY => 0xFF42,
            Self::SCX => 0xFF43,
            Self::LY => 0xFF44,
            Self::LYC => 0xFF45,
            Self::DMA => 0xFF46,
            Self::BGP => 0xFF47,
            Self::OBP0 => 0xFF48,
            Self::OBP1 => 0xFF49,
            Self::WY => 0xFF4A,
            Self::WX => 0xFF4B,
            Self::BOOT => 0xFF50,
        }
    }

    /// Return whether this register is backed by the timer rather than the I/O register file.
    pub fn is_timer_register(self) -> bool {
        matches!(self, Self::DIV | Self::TIMA | Self::TMA | Self::TAC)
    }

    /// Return whether or not the CPU is allowed to write to this hardware register.
    pub fn is_cpu_writable(self) -> bool {
        !matches!(self, Self::LY)
    }
}

/// A convenience view around the IF register.
pub struct InterruptFlags<'a>(&'a mut u8);

impl<'a> InterruptFlags<'a> {
    /// Returns the highest priority requested + enabled interrupt, or None if no enabled interrupts
    /// have been requested.
    pub fn highest_priority_interrupt(&self, ie_value: u8) -> Option<InterruptType> {
        let masked_if = *self.0 & ie_value;
        InterruptType::PRIORITY_ORDER
            .into_iter()
            .find(|interrupt_type| masked_if & interrupt_type.bit() != 0)
    }

    pub fn get(&self, interrupt_type: InterruptType) -> bool {
        *self.0 & interrupt_type.bit() != 0
    }

    /// Sets the bit for the given interrupt type.
    pub fn set(&mut self, interrupt_type: InterruptType) {
        *self.0 |= interrupt_type.bit();
    }

    /// Clears the bit for the given interrupt type.
    pub fn clear(&mut self, interrupt_type: InterruptType) {
        *self.0 &= !interrupt_type.bit();
    }
}

/// The $FF00-$FF7F register file, minus the timer registers which live in [`crate::timer::Timer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRegisters {
    contents: [u8; address::IO_REGISTERS_SIZE],
}

impl IoRegisters {
    const JOYP_RELATIVE_ADDR: usize = 0x00;
    const IF_RELATIVE_ADDR: usize = 0x0F;
    const LCDC_RELATIVE_ADDR: usize = 0x40;
    const STAT_RELATIVE_ADDR: usize = 0x41;
    const LY_RELATIVE_ADDR: usize = 0x44;
    const BOOT_RELATIVE_ADDR: usize = 0x50;

    /// Create a register file with every register zeroed, the state at power-on before the boot
    /// ROM runs.
    pub fn new() -> Self {
        Self {
            contents: [0; address::IO_REGISTERS_SIZE],
        }
    }

    /// Create a register file holding the values the DMG boot ROM leaves behind when it hands
    /// control to the cartridge.
    pub fn new_post_boot() -> Self {
        let mut contents = [0; address::IO_REGISTERS_SIZE];

        // JOYP
        contents[0x00] = 0xCF;

        // IF, reads back as 0xE1
        contents[0x0F] = 0x01;

        // LCDC
        contents[0x40] = 0x91;

        // STAT, reads back as 0x81
        contents[0x41] = 0x01;

        // DMA
        contents[0x46] = 0xFF;

        // BGP
        contents[0x47] = 0xFC;

        // Boot ROM already unmapped
        contents[0x50] = 0x01;

        Self { contents }
    }

    fn relative(address: u16) -> usize {
        (address - address::IO_REGISTERS_START) as usize
    }

    /// Read the value from the I/O register at the given address, applying the bit masks that the
    /// hardware applies to CPU reads. Addresses without a named register read back as plain bytes.
    pub fn read_address(&self, address: u16) -> u8 {
        let byte = self.contents[Self::relative(address)];

        match IoRegister::from_address(address) {
            Some(IoRegister::JOYP) => (byte & 0x3F) | 0xC0,
            Some(IoRegister::IF) => byte | 0xE0,
            Some(IoRegister::STAT) => byte | 0x80,
            _ => byte,
        }
    }

    /// Assign a value to the I/O register at the given address as the CPU would. Writes to
    /// read-only registers and read-only bits are dropped.
    pub fn write_address(&mut self, address: u16, value: u8) {
        let relative_addr = Self::relative(address);

        match IoRegister::from_address(address) {
            Some(register) if !register.is_cpu_writable() => {}
            Some(IoRegister::JOYP) => {
                // Only the select bits are writable
                let existing_value = self.contents[relative_addr];
                self.contents[relative_addr] = (existing_value & 0xCF) | (value & 0x30);
            }
            Some(IoRegister::STAT) => {
                // Mode and LYC coincidence bits belong to the PPU
                let existing_value = self.contents[relative_addr];
                self.contents[relative_addr] = (existing_value & 0x07) | (value & 0x78);
            }
            Some(IoRegister::IF) => {
                self.contents[relative_addr] = value & 0x1F;
            }
            Some(IoRegister::BOOT) => {
                // Once set, the boot ROM stays unmapped until power-off
                self.contents[relative_addr] |= u8::from(value != 0);
            }
            _ => {
                self.contents[relative_addr] = value;
            }
        }
    }

    /// Read the value from the given hardware register.
    pub fn read_register(&self, register: IoRegister) -> u8 {
        self.read_address(register.to_address())
    }

    /// Assign a value to the given hardware register as the CPU would.
    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        self.write_address(register.to_address(), value);
    }

    /// Return the JOYP select bits (4-5). A cleared bit selects that button group.
    pub fn joyp_select_bits(&self) -> u8 {
        self.contents[Self::JOYP_RELATIVE_ADDR] & 0x30
    }

    /// Assign a value to the STAT register (LCD status), including bits that the CPU cannot write.
    /// Should only be used by the PPU.
    pub fn privileged_set_stat(&mut self, value: u8) {
        self.contents[Self::STAT_RELATIVE_ADDR] = value & 0x7F;
    }

    /// Read the raw STAT byte without the always-set bit 7.
    pub fn privileged_read_stat(&self) -> u8 {
        self.contents[Self::STAT_RELATIVE_ADDR]
    }

    /// Assign a value to the LY register (current scanline), which the CPU cannot normally write
    /// to. Should only be used by the PPU.
    pub fn privileged_set_ly(&mut self, value: u8) {
        self.contents[Self::LY_RELATIVE_ADDR] = value;
    }

    /// Whether the boot ROM has been unmapped through a write to $FF50.
    pub fn boot_rom_disabled(&self) -> bool {
        self.contents[Self::BOOT_RELATIVE_ADDR] != 0
    }

    /// Obtain a read-only view around the LCDC register (LCD control).
    pub fn lcdc(&self) -> Lcdc {
        Lcdc(self.contents[Self::LCDC_RELATIVE_ADDR])
    }

    /// Obtain a read/write view around the IF register (interrupt request flags).
    pub fn interrupt_flags(&mut self) -> InterruptFlags<'_> {
        InterruptFlags(&mut self.contents[Self::IF_RELATIVE_ADDR])
    }

    /// The raw IF bits (0-4) without the always-set upper bits.
    pub fn interrupt_flags_value(&self) -> u8 {
        self.contents[Self::IF_RELATIVE_ADDR] & 0x1F
    }
}

impl Default for IoRegisters {
    fn default() -> Self {
        Self::new()
    }
}
