use crate::config::RunConfig;
use crate::cpu::{Cpu, CpuRegisters};
use crate::memory::{AddressSpace, LoadError, MemoryRegion};
use crate::ppu::PpuState;
use crate::EmulationState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("error loading {file_path}: {source}")]
    FileLoad {
        file_path: String,
        #[source]
        source: LoadError,
    },
    #[error("boot ROM is enabled but no boot ROM path was provided")]
    MissingBootRom,
}

fn load_file(
    address_space: &mut AddressSpace,
    region: MemoryRegion,
    file_path: &str,
    file_offset: usize,
    size: Option<usize>,
) -> Result<(), StartupError> {
    address_space
        .load_from_file(region, file_path, file_offset, size)
        .map_err(|source| StartupError::FileLoad {
            file_path: file_path.into(),
            source,
        })
}

fn load_rom(address_space: &mut AddressSpace, rom_path: &str) -> Result<(), StartupError> {
    let rom = std::fs::read(rom_path).map_err(|source| StartupError::FileLoad {
        file_path: rom_path.into(),
        source: LoadError::FileOpen {
            path: rom_path.into(),
            source,
        },
    })?;

    address_space.load_rom_bytes(&rom);
    log::info!("Loaded {} byte ROM from {rom_path}", rom.len());

    Ok(())
}

pub(crate) fn init_emulation_state(run_config: &RunConfig) -> Result<EmulationState, StartupError> {
    log::info!("Initializing emulator with config:\n{run_config}");

    let mut address_space = AddressSpace::new();
    load_rom(&mut address_space, &run_config.rom_path)?;

    let cpu_registers = if run_config.boot_rom_enabled {
        let boot_rom_path = run_config
            .boot_rom_path
            .as_deref()
            .ok_or(StartupError::MissingBootRom)?;
        load_file(&mut address_space, MemoryRegion::BootRom, boot_rom_path, 0, None)?;
        address_space.enable_boot_rom();

        CpuRegisters::new()
    } else {
        CpuRegisters::new_post_boot()
    };

    for region_load in &run_config.region_loads {
        load_file(
            &mut address_space,
            region_load.region,
            &region_load.path,
            region_load.file_offset,
            region_load.size,
        )?;
    }

    Ok(EmulationState {
        address_space,
        cpu: Cpu::new(cpu_registers),
        ppu_state: PpuState::new(),
    })
}
