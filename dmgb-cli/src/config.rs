use anyhow::Context;
use dmgb_core::{InputConfig, RegionLoad, RunConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmulatorConfig {
    pub rom_path: Option<String>,

    pub boot_rom_path: Option<String>,

    #[serde(default)]
    pub boot_rom_enabled: bool,

    /// Extra file loads in `REGION:PATH:OFFSET:SIZE` form.
    #[serde(default)]
    pub region_loads: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_scale")]
    pub scale: u32,

    #[serde(default = "default_vsync_enabled")]
    pub vsync: bool,
}

fn default_scale() -> u32 {
    4
}

fn default_vsync_enabled() -> bool {
    true
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            vsync: default_vsync_enabled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run without a window for this many frames, then exit.
    pub headless_frames: Option<u64>,

    #[serde(default)]
    pub emulator: EmulatorConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub input: InputConfig,
}

impl AppConfig {
    pub fn from_toml_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading TOML config file from '{path:?}'"))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("error parsing app config from TOML file at '{path:?}'"))?;

        Ok(config)
    }

    /// Build the emulator run config. A ROM path given on the command line takes precedence over
    /// the one in the config file.
    pub fn to_run_config(
        &self,
        rom_path_override: Option<&str>,
    ) -> Result<RunConfig, anyhow::Error> {
        let rom_path = rom_path_override
            .or(self.emulator.rom_path.as_deref())
            .context("no ROM path given on the command line or in the config file")?;

        let region_loads = self
            .emulator
            .region_loads
            .iter()
            .map(|s| {
                s.parse::<RegionLoad>()
                    .with_context(|| format!("invalid region load in config file: '{s}'"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RunConfig {
            rom_path: rom_path.into(),
            boot_rom_path: self.emulator.boot_rom_path.clone(),
            boot_rom_enabled: self.emulator.boot_rom_enabled,
            region_loads,
            input_config: self.input.clone(),
        })
    }
}
