//! Game Boy (DMG) emulation core: CPU, memory bus, PPU, timer and interrupts, driven by a single
//! master clock.

mod config;
mod cpu;
mod eventloop;
mod frontend;
mod input;
mod memory;
mod ppu;
mod startup;
mod timer;

pub use config::{InputConfig, RegionLoad, RegionLoadParseError, RunConfig};
pub use cpu::instructions::ParseError;
pub use cpu::{CpuFlags, CpuRegister, CpuRegisterPair, CpuRegisters, InterruptType};
pub use eventloop::{EmulationError, Emulator, M_CYCLES_PER_FRAME, T_CYCLES_PER_M_CYCLE};
pub use frontend::{shade_to_gray, Frontend, FrontendAction};
pub use input::{Button, JoypadState};
pub use memory::ioregisters::IoRegister;
pub use memory::{address, AddressSpace, LoadError, MemoryRegion};
pub use ppu::{FrameBuffer, Mode as PpuMode, PpuState, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use startup::StartupError;

pub(crate) struct EmulationState {
    address_space: AddressSpace,
    cpu: cpu::Cpu,
    ppu_state: PpuState,
}
