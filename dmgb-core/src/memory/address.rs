//
// Cartridge header addresses
//

pub const ENTRY_POINT: u16 = 0x0100;

//
// Address space boundaries
//

pub const BOOT_ROM_START: u16 = 0x0000;
pub const BOOT_ROM_END: u16 = 0x00FF;

pub const FIXED_ROM_START: u16 = 0x0000;
pub const FIXED_ROM_END: u16 = 0x3FFF;

pub const BANKED_ROM_START: u16 = 0x4000;
pub const BANKED_ROM_END: u16 = 0x7FFF;

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;

pub const EXTERNAL_RAM_START: u16 = 0xA000;
pub const EXTERNAL_RAM_END: u16 = 0xBFFF;

pub const FIXED_WORKING_RAM_START: u16 = 0xC000;
pub const FIXED_WORKING_RAM_END: u16 = 0xCFFF;

pub const BANKED_WORKING_RAM_START: u16 = 0xD000;
pub const BANKED_WORKING_RAM_END: u16 = 0xDFFF;

pub const ECHO_RAM_START: u16 = 0xE000;
pub const ECHO_RAM_END: u16 = 0xFDFF;

// Echo RAM reads/writes land at (address - ECHO_RAM_OFFSET)
pub const ECHO_RAM_OFFSET: u16 = 0x2000;

pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;

pub const UNUSABLE_START: u16 = 0xFEA0;
pub const UNUSABLE_END: u16 = 0xFEFF;

pub const IO_REGISTERS_START: u16 = 0xFF00;
pub const IO_REGISTERS_END: u16 = 0xFF7F;

pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;

pub const IE_REGISTER: u16 = 0xFFFF;

//
// Region sizes
//

pub const BOOT_ROM_SIZE: usize = 256;
pub const ROM_BANK_SIZE: usize = 16 * 1024;
pub const VRAM_SIZE: usize = 8 * 1024;
pub const EXTERNAL_RAM_SIZE: usize = 8 * 1024;
pub const WORKING_RAM_BANK_SIZE: usize = 4 * 1024;
pub const OAM_SIZE: usize = 160;
pub const UNUSABLE_SIZE: usize = 96;
pub const IO_REGISTERS_SIZE: usize = 128;
pub const HRAM_SIZE: usize = 127;

//
// VRAM layout used by the PPU
//

pub const TILE_DATA_UNSIGNED_BASE: u16 = 0x8000;
pub const TILE_DATA_SIGNED_BASE: u16 = 0x9000;

pub const TILE_MAP_0: u16 = 0x9800;
pub const TILE_MAP_1: u16 = 0x9C00;
