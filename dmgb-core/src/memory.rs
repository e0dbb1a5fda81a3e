pub mod address;
pub mod ioregisters;

use crate::cpu::InterruptType;
use crate::input::JoypadState;
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use crate::timer::Timer;
use dmgb_proc_macros::{EnumDisplay, EnumFromStr};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// A region of the address space that file contents can be loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay, EnumFromStr)]
pub enum MemoryRegion {
    BootRom,
    FixedRom,
    BankedRom,
    Vram,
    ExternalRam,
    FixedWorkingRam,
    BankedWorkingRam,
    Oam,
    Hram,
}

impl MemoryRegion {
    pub fn capacity(self) -> usize {
        match self {
            Self::BootRom => address::BOOT_ROM_SIZE,
            Self::FixedRom | Self::BankedRom => address::ROM_BANK_SIZE,
            Self::Vram => address::VRAM_SIZE,
            Self::ExternalRam => address::EXTERNAL_RAM_SIZE,
            Self::FixedWorkingRam | Self::BankedWorkingRam => address::WORKING_RAM_BANK_SIZE,
            Self::Oam => address::OAM_SIZE,
            Self::Hram => address::HRAM_SIZE,
        }
    }

    /// Parse a region name, ignoring case and `_`/`-` separators.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidRegion`] if the name does not match any region.
    pub fn parse_name(name: &str) -> Result<Self, LoadError> {
        name.parse().map_err(|_| LoadError::InvalidRegion { name: name.into() })
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("error reading file {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("file {path} is {len} bytes, too short to read from offset {file_offset}")]
    FileTooShort {
        path: String,
        file_offset: usize,
        len: usize,
    },
    #[error("cannot load {size} bytes into {region}, which holds {capacity} bytes")]
    RegionOverflow {
        region: MemoryRegion,
        size: usize,
        capacity: usize,
    },
    #[error("invalid memory region: '{name}'")]
    InvalidRegion { name: String },
}

/// The 16-bit address space as seen by the CPU and PPU.
///
/// Every address maps to exactly one backing region except for the boot ROM overlay and echo RAM.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    boot_rom: [u8; address::BOOT_ROM_SIZE],
    boot_rom_enabled: bool,
    fixed_rom: Vec<u8>,
    banked_rom: Vec<u8>,
    vram: Vec<u8>,
    external_ram: Vec<u8>,
    fixed_working_ram: Vec<u8>,
    banked_working_ram: Vec<u8>,
    oam: [u8; address::OAM_SIZE],
    unusable: [u8; address::UNUSABLE_SIZE],
    io_registers: IoRegisters,
    hram: [u8; address::HRAM_SIZE],
    ie_register: u8,
    timer: Timer,
    joypad_state: JoypadState,
}

impl AddressSpace {
    /// Create an address space with empty ROM and the I/O registers in their post-boot state.
    pub fn new() -> Self {
        Self {
            boot_rom: [0; address::BOOT_ROM_SIZE],
            boot_rom_enabled: false,
            fixed_rom: vec![0; address::ROM_BANK_SIZE],
            banked_rom: vec![0; address::ROM_BANK_SIZE],
            vram: vec![0; address::VRAM_SIZE],
            external_ram: vec![0; address::EXTERNAL_RAM_SIZE],
            fixed_working_ram: vec![0; address::WORKING_RAM_BANK_SIZE],
            banked_working_ram: vec![0; address::WORKING_RAM_BANK_SIZE],
            oam: [0; address::OAM_SIZE],
            unusable: [0; address::UNUSABLE_SIZE],
            io_registers: IoRegisters::new_post_boot(),
            hram: [0; address::HRAM_SIZE],
            ie_register: 0,
            timer: Timer::new(),
            joypad_state: JoypadState::new(),
        }
    }

    /// Create a post-boot address space with the given ROM image mapped at $0000-$7FFF.
    pub fn from_rom_bytes(rom: &[u8]) -> Self {
        let mut address_space = Self::new();
        address_space.load_rom_bytes(rom);
        address_space
    }

    /// Map the boot ROM over $0000-$00FF and reset the I/O registers to their power-on state.
    /// The overlay stays active until the program writes a non-zero value to $FF50.
    pub fn enable_boot_rom(&mut self) {
        self.boot_rom_enabled = true;
        self.io_registers = IoRegisters::new();
    }

    pub fn boot_rom_mapped(&self) -> bool {
        self.boot_rom_enabled && !self.io_registers.boot_rom_disabled()
    }

    /// Place a cartridge image: the first 16KB in fixed ROM and the next 16KB in banked ROM.
    /// Anything past 32KB would need a memory bank controller and is not mapped.
    pub fn load_rom_bytes(&mut self, rom: &[u8]) {
        let (fixed, rest) = rom.split_at(rom.len().min(address::ROM_BANK_SIZE));
        let banked = &rest[..rest.len().min(address::ROM_BANK_SIZE)];

        self.fixed_rom[..fixed.len()].copy_from_slice(fixed);
        self.banked_rom[..banked.len()].copy_from_slice(banked);

        if rom.len() > 2 * address::ROM_BANK_SIZE {
            log::warn!(
                "ROM is {} bytes but only the first {} are mapped; bank switching is not supported",
                rom.len(),
                2 * address::ROM_BANK_SIZE
            );
        }
    }

    fn region_mut(&mut self, region: MemoryRegion) -> &mut [u8] {
        match region {
            MemoryRegion::BootRom => &mut self.boot_rom,
            MemoryRegion::FixedRom => &mut self.fixed_rom,
            MemoryRegion::BankedRom => &mut self.banked_rom,
            MemoryRegion::Vram => &mut self.vram,
            MemoryRegion::ExternalRam => &mut self.external_ram,
            MemoryRegion::FixedWorkingRam => &mut self.fixed_working_ram,
            MemoryRegion::BankedWorkingRam => &mut self.banked_working_ram,
            MemoryRegion::Oam => &mut self.oam,
            MemoryRegion::Hram => &mut self.hram,
        }
    }

    /// Copy bytes to the start of the given region.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is larger than the region.
    pub fn load_bytes(&mut self, region: MemoryRegion, bytes: &[u8]) -> Result<(), LoadError> {
        let capacity = region.capacity();
        if bytes.len() > capacity {
            return Err(LoadError::RegionOverflow {
                region,
                size: bytes.len(),
                capacity,
            });
        }

        self.region_mut(region)[..bytes.len()].copy_from_slice(bytes);

        Ok(())
    }

    /// Load `size` bytes starting at `file_offset` in the given file into the start of a region.
    /// If `size` is `None`, loads as many bytes as the file and region both allow.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if it is too short, or if the requested size
    /// does not fit in the region.
    pub fn load_from_file<P: AsRef<Path>>(
        &mut self,
        region: MemoryRegion,
        path: P,
        file_offset: usize,
        size: Option<usize>,
    ) -> Result<(), LoadError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let contents = fs::read(path).map_err(|source| LoadError::FileOpen {
            path: path_str.clone(),
            source,
        })?;

        let available = contents.len().checked_sub(file_offset).ok_or_else(|| {
            LoadError::FileTooShort {
                path: path_str.clone(),
                file_offset,
                len: contents.len(),
            }
        })?;

        let size = size.unwrap_or_else(|| available.min(region.capacity()));
        if size > available {
            return Err(LoadError::FileTooShort {
                path: path_str,
                file_offset,
                len: contents.len(),
            });
        }

        self.load_bytes(region, &contents[file_offset..file_offset + size])?;

        log::info!("Loaded {size} bytes from {path_str} (offset {file_offset}) into {region}");

        Ok(())
    }

    /// Read the byte at the given address without side effects.
    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            address::BOOT_ROM_START..=address::BOOT_ROM_END if self.boot_rom_mapped() => {
                self.boot_rom[usize::from(address - address::BOOT_ROM_START)]
            }
            address::FIXED_ROM_START..=address::FIXED_ROM_END => {
                self.fixed_rom[usize::from(address - address::FIXED_ROM_START)]
            }
            address::BANKED_ROM_START..=address::BANKED_ROM_END => {
                self.banked_rom[usize::from(address - address::BANKED_ROM_START)]
            }
            address::VRAM_START..=address::VRAM_END => {
                self.vram[usize::from(address - address::VRAM_START)]
            }
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.external_ram[usize::from(address - address::EXTERNAL_RAM_START)]
            }
            address::FIXED_WORKING_RAM_START..=address::FIXED_WORKING_RAM_END => {
                self.fixed_working_ram[usize::from(address - address::FIXED_WORKING_RAM_START)]
            }
            address::BANKED_WORKING_RAM_START..=address::BANKED_WORKING_RAM_END => {
                self.banked_working_ram[usize::from(address - address::BANKED_WORKING_RAM_START)]
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.read_address_u8(address - address::ECHO_RAM_OFFSET)
            }
            address::OAM_START..=address::OAM_END => {
                self.oam[usize::from(address - address::OAM_START)]
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.read_io_register(address)
            }
            address::HRAM_START..=address::HRAM_END => {
                self.hram[usize::from(address - address::HRAM_START)]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// Read the byte at the given address as the CPU does.
    ///
    /// A CPU read of the unusable region ($FEA0-$FEFF) returns 0xFF and also overwrites the
    /// backing byte with 0xFF, so a later write followed by a read never observes the written
    /// value. Every other address behaves like [`AddressSpace::read_address_u8`].
    pub fn cpu_read_u8(&mut self, address: u16) -> u8 {
        if (address::UNUSABLE_START..=address::UNUSABLE_END).contains(&address) {
            self.unusable[usize::from(address - address::UNUSABLE_START)] = 0xFF;
            return 0xFF;
        }

        self.read_address_u8(address)
    }

    /// Read a little-endian 16-bit value.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match address {
            address::FIXED_ROM_START..=address::BANKED_ROM_END => {
                log::trace!("Ignoring write to ROM address {address:04X}: {value:02X}");
            }
            address::VRAM_START..=address::VRAM_END => {
                self.vram[usize::from(address - address::VRAM_START)] = value;
            }
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.external_ram[usize::from(address - address::EXTERNAL_RAM_START)] = value;
            }
            address::FIXED_WORKING_RAM_START..=address::FIXED_WORKING_RAM_END => {
                self.fixed_working_ram[usize::from(address - address::FIXED_WORKING_RAM_START)] =
                    value;
            }
            address::BANKED_WORKING_RAM_START..=address::BANKED_WORKING_RAM_END => {
                self.banked_working_ram
                    [usize::from(address - address::BANKED_WORKING_RAM_START)] = value;
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.write_address_u8(address - address::ECHO_RAM_OFFSET, value);
            }
            address::OAM_START..=address::OAM_END => {
                self.oam[usize::from(address - address::OAM_START)] = value;
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => {
                self.unusable[usize::from(address - address::UNUSABLE_START)] = value;
            }
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.write_io_register(address, value);
            }
            address::HRAM_START..=address::HRAM_END => {
                self.hram[usize::from(address - address::HRAM_START)] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Write a little-endian 16-bit value.
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    fn read_io_register(&self, address: u16) -> u8 {
        match IoRegister::from_address(address) {
            Some(IoRegister::JOYP) => {
                let select_bits = self.io_registers.joyp_select_bits();
                0xC0 | select_bits | self.joypad_state.input_lines(select_bits)
            }
            Some(register) if register.is_timer_register() => self.timer.read_register(register),
            _ => self.io_registers.read_address(address),
        }
    }

    fn write_io_register(&mut self, address: u16, value: u8) {
        match IoRegister::from_address(address) {
            Some(IoRegister::JOYP) => {
                let previous_lines = self.joypad_input_lines();
                self.io_registers.write_address(address, value);
                self.check_joypad_interrupt(previous_lines);
            }
            Some(register) if register.is_timer_register() => {
                self.timer.write_register(register, value);
            }
            Some(IoRegister::DMA) => {
                self.io_registers.write_address(address, value);
                self.oam_dma_transfer(value);
            }
            Some(IoRegister::BOOT) => {
                let was_mapped = self.boot_rom_mapped();
                self.io_registers.write_address(address, value);
                if was_mapped && !self.boot_rom_mapped() {
                    log::debug!("Boot ROM disabled");
                }
            }
            _ => {
                self.io_registers.write_address(address, value);
            }
        }
    }

    fn oam_dma_transfer(&mut self, source_high_byte: u8) {
        let source_address = u16::from(source_high_byte) << 8;
        log::debug!("OAM DMA transfer from {source_address:04X}");

        for i in 0..address::OAM_SIZE as u16 {
            let byte = self.read_address_u8(source_address.wrapping_add(i));
            self.oam[usize::from(i)] = byte;
        }
    }

    fn joypad_input_lines(&self) -> u8 {
        self.joypad_state
            .input_lines(self.io_registers.joyp_select_bits())
    }

    // Any input line that went from 1 to 0 requests a joypad interrupt
    fn check_joypad_interrupt(&mut self, previous_lines: u8) {
        let current_lines = self.joypad_input_lines();
        if previous_lines & !current_lines & 0x0F != 0 {
            self.io_registers
                .interrupt_flags()
                .set(InterruptType::Joypad);
        }
    }

    pub fn joypad_state(&self) -> JoypadState {
        self.joypad_state
    }

    pub fn update_joypad_state(&mut self, joypad_state: JoypadState) {
        let previous_lines = self.joypad_input_lines();
        self.joypad_state = joypad_state;
        self.check_joypad_interrupt(previous_lines);
    }

    /// Advance the timer by one T-cycle.
    pub fn tick_timer(&mut self) {
        self.timer.tick(&mut self.io_registers.interrupt_flags());
    }

    pub fn reset_divider(&mut self) {
        self.timer.reset_divider();
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    pub fn ie_register(&self) -> u8 {
        self.ie_register
    }

    /// Interrupts that are both requested (IF) and enabled (IE).
    pub fn pending_interrupts(&self) -> u8 {
        self.ie_register & self.io_registers.interrupt_flags_value()
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
