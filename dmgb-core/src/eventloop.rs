use crate::config::RunConfig;
use crate::cpu::instructions::{self, ParseError};
use crate::cpu::{Cpu, CpuFlags, CpuRegisters};
use crate::frontend::{Frontend, FrontendAction};
use crate::memory::AddressSpace;
use crate::ppu::{FrameBuffer, PpuState, DOTS_PER_FRAME};
use crate::startup::{self, StartupError};
use crate::EmulationState;
use thiserror::Error;

pub const T_CYCLES_PER_M_CYCLE: u32 = 4;
pub const M_CYCLES_PER_FRAME: u32 = DOTS_PER_FRAME / T_CYCLES_PER_M_CYCLE;

#[derive(Error, Debug)]
pub enum EmulationError {
    #[error("error parsing CPU instruction: {source}")]
    InstructionParse {
        #[from]
        source: ParseError,
    },
    #[error("frontend error: {msg}")]
    Frontend { msg: String },
    #[error("emulator has been stopped")]
    Stopped,
}

/// A complete DMG: CPU, PPU and address space, advanced by a single master clock.
#[derive(Debug, Clone)]
pub struct Emulator {
    address_space: AddressSpace,
    cpu: Cpu,
    ppu_state: PpuState,
    running: bool,
    m_cycles: u64,
}

impl Emulator {
    /// Load the ROM (and boot ROM, if enabled) named in the config.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured file cannot be loaded.
    pub fn new(run_config: &RunConfig) -> Result<Self, StartupError> {
        startup::init_emulation_state(run_config).map(Self::from_state)
    }

    /// Create an emulator in the post-boot state with the given ROM image.
    pub fn from_rom_bytes(rom: &[u8]) -> Self {
        Self::from_state(EmulationState {
            address_space: AddressSpace::from_rom_bytes(rom),
            cpu: Cpu::new(CpuRegisters::new_post_boot()),
            ppu_state: PpuState::new(),
        })
    }

    fn from_state(emulation_state: EmulationState) -> Self {
        let EmulationState {
            address_space,
            cpu,
            ppu_state,
        } = emulation_state;

        Self {
            address_space,
            cpu,
            ppu_state,
            running: true,
            m_cycles: 0,
        }
    }

    /// Advance the whole system by one M-cycle: four PPU/timer T-cycles, then one CPU step.
    ///
    /// # Errors
    ///
    /// Returns an error if the emulator was stopped or if the CPU fetches an invalid opcode, in
    /// which case the emulator stops with PC pointing at the opcode.
    pub fn run_m_cycle(&mut self) -> Result<(), EmulationError> {
        if !self.running {
            return Err(EmulationError::Stopped);
        }

        for _ in 0..T_CYCLES_PER_M_CYCLE {
            self.ppu_state.tick_dot(&mut self.address_space);
            self.address_space.tick_timer();
        }

        if let Err(err) = self.cpu.cycle(&mut self.address_space) {
            log::error!("Halting emulation: {err}");
            self.running = false;
            return Err(err.into());
        }

        self.m_cycles += 1;

        Ok(())
    }

    /// Run the given number of M-cycles.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Emulator::run_m_cycle`].
    pub fn run_cycles(&mut self, m_cycles: u64) -> Result<(), EmulationError> {
        for _ in 0..m_cycles {
            self.run_m_cycle()?;
        }

        Ok(())
    }

    /// Run until the CPU is about to start the instruction at `address`, for at most
    /// `max_m_cycles` M-cycles. At least one M-cycle always runs. Returns whether the address was
    /// reached.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Emulator::run_m_cycle`].
    pub fn run_until_pc(
        &mut self,
        address: u16,
        max_m_cycles: u64,
    ) -> Result<bool, EmulationError> {
        for _ in 0..max_m_cycles {
            self.run_m_cycle()?;

            let registers = self.cpu.registers();
            if self.cpu.at_instruction_boundary() && !registers.halted && registers.pc == address {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Run until the PPU enters VBlank, or for one frame's worth of M-cycles if the LCD is off.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Emulator::run_m_cycle`].
    pub fn run_frame(&mut self) -> Result<(), EmulationError> {
        let start_frame = self.ppu_state.frames_completed();

        for _ in 0..M_CYCLES_PER_FRAME {
            self.run_m_cycle()?;
            if self.ppu_state.frames_completed() != start_frame {
                break;
            }
        }

        Ok(())
    }

    /// Run frames until the frontend asks to quit, feeding it input and completed frames.
    ///
    /// # Errors
    ///
    /// Returns an error if emulation fails or if the frontend fails to render. Either stops the
    /// emulator.
    pub fn free_run<F: Frontend>(&mut self, frontend: &mut F) -> Result<(), EmulationError> {
        let mut joypad_state = self.address_space.joypad_state();

        loop {
            if frontend.poll_events(&mut joypad_state) == FrontendAction::Quit {
                log::info!("Frontend requested quit after {} M-cycles", self.m_cycles);
                return Ok(());
            }
            self.address_space.update_joypad_state(joypad_state);

            self.run_frame()?;

            if let Err(err) = frontend.render_frame(self.ppu_state.frame_buffer()) {
                log::error!("Halting emulation: frontend error: {err}");
                self.running = false;
                return Err(EmulationError::Frontend {
                    msg: err.to_string(),
                });
            }
        }
    }

    pub fn registers(&self) -> &CpuRegisters {
        self.cpu.registers()
    }

    pub fn flags(&self) -> CpuFlags {
        self.cpu.registers().cpu_flags()
    }

    /// Read a byte without side effects.
    pub fn peek(&self, address: u16) -> u8 {
        self.address_space.read_address_u8(address)
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.ppu_state.frame_buffer()
    }

    pub fn ppu_state(&self) -> &PpuState {
        &self.ppu_state
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn address_space_mut(&mut self) -> &mut AddressSpace {
        &mut self.address_space
    }

    /// Total M-cycles run since startup.
    pub fn m_cycles(&self) -> u64 {
        self.m_cycles
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Decode the instruction at the given address, returning its text and its length in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the address holds an invalid opcode.
    pub fn disassemble(&self, address: u16) -> Result<(String, u16), ParseError> {
        let (instruction, next_pc) =
            instructions::parse_next_instruction(&self.address_space, address)?;
        Ok((format!("{instruction:02X?}"), next_pc.wrapping_sub(address)))
    }
}
