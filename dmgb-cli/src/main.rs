mod config;
mod headless;
mod shell;
#[cfg(feature = "sdl")]
mod sdl;

use anyhow::Context;
use clap::Parser;
use config::AppConfig;
use dmgb_core::{Emulator, RegionLoad};
use env_logger::Env;
use headless::HeadlessFrontend;
use std::io;
use std::path::{Path, PathBuf};

// Frames run by `f` in the debug shell when no window is available
#[cfg(not(feature = "sdl"))]
const SHELL_HEADLESS_FRAMES: u64 = 60;

#[derive(Parser)]
#[command(version, about = "Game Boy (DMG) emulator")]
struct Cli {
    /// ROM file to run; overrides emulator.rom_path from the config file
    rom_path: Option<String>,

    /// TOML config file
    #[arg(short = 'c', long = "config")]
    config_path: Option<PathBuf>,

    /// Boot ROM file to map over $0000-$00FF
    #[arg(long = "boot-rom")]
    boot_rom_path: Option<String>,

    /// Start from the boot ROM instead of the post-boot register state
    #[arg(long)]
    boot_rom_enabled: bool,

    /// Copy part of a file into a memory region before starting
    #[arg(short = 'l', long = "load", value_name = "REGION:PATH:OFFSET:SIZE")]
    region_loads: Vec<RegionLoad>,

    /// Run without a window for this many frames, then exit
    #[arg(long)]
    headless_frames: Option<u64>,

    /// Start the interactive debug shell instead of running freely
    #[arg(short = 's', long)]
    shell: bool,

    /// Log filter in env_logger syntax; RUST_LOG takes precedence
    #[arg(long)]
    log_filter: Option<String>,

    /// Window scale factor
    #[arg(long)]
    scale: Option<u32>,
}

fn load_app_config(cli: &Cli) -> Result<AppConfig, anyhow::Error> {
    let mut app_config = match &cli.config_path {
        Some(config_path) => AppConfig::from_toml_file(config_path)?,
        None => AppConfig::default(),
    };

    if let Some(boot_rom_path) = &cli.boot_rom_path {
        app_config.emulator.boot_rom_path = Some(boot_rom_path.clone());
    }
    if cli.boot_rom_enabled {
        app_config.emulator.boot_rom_enabled = true;
    }
    if cli.headless_frames.is_some() {
        app_config.headless_frames = cli.headless_frames;
    }
    if let Some(log_filter) = &cli.log_filter {
        app_config.logging.filter = log_filter.clone();
    }
    if let Some(scale) = cli.scale {
        app_config.video.scale = scale;
    }

    Ok(app_config)
}

fn window_title(rom_path: &str) -> String {
    match Path::new(rom_path).file_name().and_then(|name| name.to_str()) {
        Some(file_name) => format!("dmgb - {file_name}"),
        None => "dmgb".into(),
    }
}

#[cfg(feature = "sdl")]
fn run_windowed(
    emulator: &mut Emulator,
    app_config: &AppConfig,
    title: &str,
    shell: bool,
) -> Result<(), anyhow::Error> {
    let mut sdl_context =
        sdl::SdlContext::new(title, app_config.video.scale, app_config.video.vsync)
            .context("error initializing SDL2")?;
    let mut frontend = sdl_context.frontend(&app_config.input)?;

    if shell {
        shell::run(emulator, &mut frontend, io::stdin().lock(), &mut io::stdout())?;
    } else {
        emulator.free_run(&mut frontend)?;
    }

    Ok(())
}

#[cfg(not(feature = "sdl"))]
fn run_windowed(
    emulator: &mut Emulator,
    _app_config: &AppConfig,
    _title: &str,
    shell: bool,
) -> Result<(), anyhow::Error> {
    if !shell {
        anyhow::bail!("no display: rebuild with the 'sdl' feature or pass --headless-frames");
    }

    let mut frontend = HeadlessFrontend::new(SHELL_HEADLESS_FRAMES);
    shell::run(emulator, &mut frontend, io::stdin().lock(), &mut io::stdout())?;

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let app_config = load_app_config(&cli)?;

    env_logger::Builder::from_env(Env::default().default_filter_or(&app_config.logging.filter))
        .init();

    let mut run_config = app_config.to_run_config(cli.rom_path.as_deref())?;
    run_config.region_loads.extend(cli.region_loads.iter().cloned());

    let mut emulator = Emulator::new(&run_config)
        .with_context(|| format!("error starting emulator for '{}'", run_config.rom_path))?;

    match app_config.headless_frames {
        Some(frames) => {
            let mut frontend = HeadlessFrontend::new(frames);
            if cli.shell {
                shell::run(&mut emulator, &mut frontend, io::stdin().lock(), &mut io::stdout())?;
            } else {
                emulator.free_run(&mut frontend)?;
                log::info!(
                    "Ran {} headless frames, final frame checksum {}",
                    frontend.frames_rendered(),
                    frontend.last_frame_checksum()
                );
            }
        }
        None => {
            let title = window_title(&run_config.rom_path);
            run_windowed(&mut emulator, &app_config, &title, cli.shell)?;
        }
    }

    log::info!(
        "Exiting after {} M-cycles, PC={:04X}",
        emulator.m_cycles(),
        emulator.registers().pc
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides() {
        let cli = Cli::parse_from([
            "dmgb",
            "game.gb",
            "--boot-rom",
            "boot.bin",
            "--boot-rom-enabled",
            "--load",
            "hram:hram.bin:0:max",
            "--headless-frames",
            "10",
            "--log-filter",
            "debug",
        ]);

        let app_config = load_app_config(&cli).unwrap();
        assert_eq!(Some("boot.bin".into()), app_config.emulator.boot_rom_path);
        assert!(app_config.emulator.boot_rom_enabled);
        assert_eq!(Some(10), app_config.headless_frames);
        assert_eq!("debug", app_config.logging.filter);

        assert_eq!(1, cli.region_loads.len());
        assert_eq!(None, cli.region_loads[0].size);
        assert_eq!(Some("game.gb"), cli.rom_path.as_deref());
    }

    #[test]
    fn invalid_region_load_argument() {
        assert!(Cli::try_parse_from(["dmgb", "--load", "vram:file.bin"]).is_err());
    }

    #[test]
    fn titles() {
        assert_eq!("dmgb - tetris.gb", window_title("roms/tetris.gb"));
        assert_eq!("dmgb", window_title(""));
    }
}
