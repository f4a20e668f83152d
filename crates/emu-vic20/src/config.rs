//! VIC-20 configuration: video standard, RAM fitted and ROM images.

use std::fs;
use std::io;
use std::path::Path;

pub use mos_vic_6561::MachineType;

/// BASIC ROM size ($C000-$DFFF).
pub const BASIC_ROM_SIZE: usize = 8192;
/// KERNAL ROM size ($E000-$FFFF).
pub const KERNAL_ROM_SIZE: usize = 8192;
/// Character ROM size ($8000-$8FFF).
pub const CHAR_ROM_SIZE: usize = 4096;

/// Which optional RAM blocks are fitted.
///
/// | Bit  | Block       |
/// |------|-------------|
/// | 0x01 | $0400-$07FF |
/// | 0x02 | $0800-$0BFF |
/// | 0x04 | $0C00-$0FFF |
/// | 0x08 | $2000-$3FFF |
/// | 0x10 | $4000-$5FFF |
/// | 0x20 | $6000-$7FFF |
/// | 0x40 | $A000-$BFFF |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RamExpansion(u8);

impl RamExpansion {
    pub const UNEXPANDED: Self = Self(0x00);
    pub const K3: Self = Self(0x07);
    pub const K8: Self = Self(0x08);
    pub const K16: Self = Self(0x18);
    pub const K24: Self = Self(0x38);
    pub const K32: Self = Self(0x78);
    pub const K35: Self = Self(0x7F);

    /// Optional blocks as `(bit, start, end)`.
    pub const BLOCKS: [(u8, u16, u16); 7] = [
        (0x01, 0x0400, 0x07FF),
        (0x02, 0x0800, 0x0BFF),
        (0x04, 0x0C00, 0x0FFF),
        (0x08, 0x2000, 0x3FFF),
        (0x10, 0x4000, 0x5FFF),
        (0x20, 0x6000, 0x7FFF),
        (0x40, 0xA000, 0xBFFF),
    ];

    /// Build from a raw bitmask. Bit 7 does not correspond to a block and
    /// is dropped.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7F)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if the block selected by `bit` is fitted.
    #[must_use]
    pub const fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    /// Kilobytes added over the stock 5K.
    #[must_use]
    pub fn kilobytes(self) -> u32 {
        Self::BLOCKS
            .iter()
            .filter(|(bit, _, _)| self.has(*bit))
            .map(|(_, start, end)| (u32::from(*end) - u32::from(*start) + 1) / 1024)
            .sum()
    }

    /// Parse a preset name as accepted on the command line: `0`, `3k`,
    /// `8k`, `16k`, `24k`, `32k` or `35k`.
    #[must_use]
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().trim_end_matches('k') {
            "0" | "none" | "unexpanded" => Some(Self::UNEXPANDED),
            "3" => Some(Self::K3),
            "8" => Some(Self::K8),
            "16" => Some(Self::K16),
            "24" => Some(Self::K24),
            "32" => Some(Self::K32),
            "35" => Some(Self::K35),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} ROM is {actual} bytes, expected {expected}")]
    RomSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("failed to read ROM: {0}")]
    Io(#[from] io::Error),
}

/// Configuration for constructing a VIC-20 instance.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vic20Config {
    pub machine: MachineType,
    pub ram: RamExpansion,
    /// BASIC ROM (8,192 bytes).
    pub basic_rom: Vec<u8>,
    /// KERNAL ROM (8,192 bytes).
    pub kernal_rom: Vec<u8>,
    /// Character ROM (4,096 bytes).
    pub char_rom: Vec<u8>,
}

impl Vic20Config {
    /// Build a configuration, checking each ROM image is the right size.
    pub fn new(
        machine: MachineType,
        ram: RamExpansion,
        basic_rom: Vec<u8>,
        kernal_rom: Vec<u8>,
        char_rom: Vec<u8>,
    ) -> Result<Self, ConfigError> {
        check_size("BASIC", &basic_rom, BASIC_ROM_SIZE)?;
        check_size("KERNAL", &kernal_rom, KERNAL_ROM_SIZE)?;
        check_size("character", &char_rom, CHAR_ROM_SIZE)?;
        Ok(Self {
            machine,
            ram,
            basic_rom,
            kernal_rom,
            char_rom,
        })
    }

    /// Read `basic.rom`, `kernal.rom` and `char.rom` from `dir`.
    pub fn from_rom_dir(
        dir: &Path,
        machine: MachineType,
        ram: RamExpansion,
    ) -> Result<Self, ConfigError> {
        let basic = fs::read(dir.join("basic.rom"))?;
        let kernal = fs::read(dir.join("kernal.rom"))?;
        let chars = fs::read(dir.join("char.rom"))?;
        Self::new(machine, ram, basic, kernal, chars)
    }

    /// Same configuration with a different RAM fit.
    #[must_use]
    pub fn with_ram(&self, ram: RamExpansion) -> Self {
        Self { ram, ..self.clone() }
    }
}

fn check_size(name: &'static str, rom: &[u8], expected: usize) -> Result<(), ConfigError> {
    if rom.len() == expected {
        Ok(())
    } else {
        Err(ConfigError::RomSize {
            name,
            expected,
            actual: rom.len(),
        })
    }
}
