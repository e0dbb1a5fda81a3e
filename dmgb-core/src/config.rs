use crate::input::Button;
use crate::memory::{LoadError, MemoryRegion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Formatter;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Key bindings for the joypad, stored as frontend key names. Buttons without an explicit
/// binding use the default key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputConfig(BTreeMap<Button, String>);

impl InputConfig {
    pub fn default_key_name(button: Button) -> &'static str {
        match button {
            Button::Up => "Up",
            Button::Down => "Down",
            Button::Left => "Left",
            Button::Right => "Right",
            Button::A => "Z",
            Button::B => "X",
            Button::Start => "Return",
            Button::Select => "Right Shift",
        }
    }

    pub fn key_name(&self, button: Button) -> &str {
        self.0
            .get(&button)
            .map_or_else(|| Self::default_key_name(button), String::as_str)
    }

    pub fn set_key_name(&mut self, button: Button, key_name: impl Into<String>) {
        self.0.insert(button, key_name.into());
    }

    /// Find the button bound to the given key name, if any. Key names compare case-insensitively.
    pub fn button_for_key(&self, key_name: &str) -> Option<Button> {
        Button::ALL
            .into_iter()
            .find(|&button| self.key_name(button).eq_ignore_ascii_case(key_name))
    }
}

impl std::fmt::Display for InputConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, button) in Button::ALL.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{button}={}", self.key_name(button))?;
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum RegionLoadParseError {
    #[error("expected REGION:PATH:OFFSET:SIZE, got '{value}'")]
    Format { value: String },
    #[error("invalid number '{value}': {source}")]
    Number {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("{source}")]
    Region {
        #[from]
        source: LoadError,
    },
}

/// A request to copy part of a file into a memory region before emulation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLoad {
    pub region: MemoryRegion,
    pub path: String,
    pub file_offset: usize,
    /// `None` loads as many bytes as fit.
    pub size: Option<usize>,
}

fn parse_number(value: &str) -> Result<usize, RegionLoadParseError> {
    let result = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };

    result.map_err(|source| RegionLoadParseError::Number {
        value: value.into(),
        source,
    })
}

impl FromStr for RegionLoad {
    type Err = RegionLoadParseError;

    /// Parse `REGION:PATH:OFFSET:SIZE`. OFFSET and SIZE accept decimal or `0x` hex, and SIZE may be
    /// `max`. PATH may itself contain `:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || RegionLoadParseError::Format { value: s.into() };

        let (region, rest) = s.split_once(':').ok_or_else(format_err)?;
        let mut tail = rest.rsplitn(3, ':');
        let size = tail.next().ok_or_else(format_err)?;
        let file_offset = tail.next().ok_or_else(format_err)?;
        let path = tail.next().ok_or_else(format_err)?;

        if path.is_empty() {
            return Err(format_err());
        }

        let size = if size.eq_ignore_ascii_case("max") {
            None
        } else {
            Some(parse_number(size)?)
        };

        Ok(Self {
            region: MemoryRegion::parse_name(region)?,
            path: path.into(),
            file_offset: parse_number(file_offset)?,
            size,
        })
    }
}

impl std::fmt::Display for RegionLoad {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}:", self.region, self.path, self.file_offset)?;
        match self.size {
            Some(size) => write!(f, "{size}"),
            None => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub rom_path: String,
    pub boot_rom_path: Option<String>,
    pub boot_rom_enabled: bool,
    pub region_loads: Vec<RegionLoad>,
    pub input_config: InputConfig,
}

impl RunConfig {
    pub fn new(rom_path: impl Into<String>) -> Self {
        Self {
            rom_path: rom_path.into(),
            boot_rom_path: None,
            boot_rom_enabled: false,
            region_loads: Vec::new(),
            input_config: InputConfig::default(),
        }
    }
}

fn fmt_option<T: std::fmt::Display>(option: Option<&T>) -> String {
    match option {
        Some(value) => format!("{value}"),
        None => "<None>".into(),
    }
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rom_path: {}", self.rom_path)?;
        writeln!(f, "boot_rom_path: {}", fmt_option(self.boot_rom_path.as_ref()))?;
        writeln!(f, "boot_rom_enabled: {}", self.boot_rom_enabled)?;
        for region_load in &self.region_loads {
            writeln!(f, "region_load: {region_load}")?;
        }
        writeln!(f, "input_config: {}", self.input_config)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_config_defaults_and_overrides() {
        let mut input_config = InputConfig::default();
        assert_eq!("Z", input_config.key_name(Button::A));

        input_config.set_key_name(Button::A, "J");
        assert_eq!("J", input_config.key_name(Button::A));
        assert_eq!(Some(Button::A), input_config.button_for_key("j"));
        assert_eq!(None, input_config.button_for_key("Z"));
        assert_eq!(Some(Button::Start), input_config.button_for_key("Return"));
    }

    #[test]
    fn input_config_display() {
        let input_config = InputConfig::default();
        assert_eq!(
            "Up=Up, Down=Down, Left=Left, Right=Right, A=Z, B=X, Start=Return, Select=Right Shift",
            input_config.to_string()
        );
    }

    #[test]
    fn parse_region_load() {
        let region_load: RegionLoad = "vram:tiles.bin:0x10:0x1800".parse().unwrap();
        assert_eq!(
            RegionLoad {
                region: MemoryRegion::Vram,
                path: "tiles.bin".into(),
                file_offset: 16,
                size: Some(0x1800),
            },
            region_load
        );

        let region_load: RegionLoad = "boot_rom:C:\\roms\\dmg.bin:0:max".parse().unwrap();
        assert_eq!(MemoryRegion::BootRom, region_load.region);
        assert_eq!("C:\\roms\\dmg.bin", region_load.path);
        assert_eq!(None, region_load.size);
    }

    #[test]
    fn parse_region_load_errors() {
        assert!(matches!(
            "cartridge:a.bin:0:16".parse::<RegionLoad>(),
            Err(RegionLoadParseError::Region {
                source: LoadError::InvalidRegion { .. }
            })
        ));
        assert!(matches!(
            "vram:a.bin:zero:16".parse::<RegionLoad>(),
            Err(RegionLoadParseError::Number { .. })
        ));
        assert!(matches!(
            "vram:a.bin".parse::<RegionLoad>(),
            Err(RegionLoadParseError::Format { .. })
        ));
    }
}
