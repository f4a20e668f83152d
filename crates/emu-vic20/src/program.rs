//! Program loading: BASIC PRG files, cartridge images and raw RAM images.
//!
//! A PRG file is a 2-byte little-endian load address followed by the data
//! bytes. After copying, the BASIC start/end pointers in zero page are set
//! so that `RUN` and `SAVE` see the program.
//!
//! A cartridge image of up to 8K is mapped from $A000 upward, so its
//! autostart header lands at $A004. A 16K image is split: the first half
//! goes to $6000 and the second to $A000. Cartridge space is read-only.

use emu_core::Bus;
use log::info;

use crate::bus::{Handler, Vic20Bus};
use crate::config::RamExpansion;

/// A split cartridge: the $6000 and $A000 blocks.
pub const SPLIT_CARTRIDGE_SIZE: usize = 0x4000;
const CARTRIDGE_BLOCK_SIZE: usize = 0x2000;

/// BASIC pointers set to the program start.
const START_POINTERS: [u16; 2] = [0x002B, 0x00AC];
/// BASIC pointers set to one past the program end: start of variables,
/// start of arrays, end of arrays, end of load.
const END_POINTERS: [u16; 4] = [0x002D, 0x002F, 0x0031, 0x00AE];

/// How to interpret a program image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// Cartridge ROM, up to 8K or exactly 16K.
    Cartridge,
    /// BASIC program with a 2-byte load address header.
    Prg,
    /// RAM contents from $0000 on.
    Raw,
}

/// Program loading errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("PRG file too short ({0} bytes, need at least 3)")]
    PrgTooShort(usize),
    #[error("cartridge image is empty")]
    EmptyCartridge,
    #[error("cartridge image is {0} bytes, expected at most 8192 or exactly 16384")]
    CartridgeSize(usize),
    #[error("PRG at ${start:04X} with {len} bytes runs past $FFFF")]
    PrgTooLarge { start: u16, len: usize },
    #[error("raw image is {0} bytes, at most 65536 fit")]
    RawTooLarge(usize),
}

/// Check an image before anything is written.
pub fn validate(kind: ProgramKind, data: &[u8]) -> Result<(), LoadError> {
    match kind {
        ProgramKind::Prg if data.len() < 3 => Err(LoadError::PrgTooShort(data.len())),
        ProgramKind::Prg => {
            let start = u16::from_le_bytes([data[0], data[1]]);
            let len = data.len() - 2;
            if len > 0x10000 - usize::from(start) {
                Err(LoadError::PrgTooLarge { start, len })
            } else {
                Ok(())
            }
        }
        ProgramKind::Cartridge if data.is_empty() => Err(LoadError::EmptyCartridge),
        ProgramKind::Cartridge
            if data.len() > CARTRIDGE_BLOCK_SIZE && data.len() != SPLIT_CARTRIDGE_SIZE =>
        {
            Err(LoadError::CartridgeSize(data.len()))
        }
        ProgramKind::Raw if data.len() > 0x10000 => Err(LoadError::RawTooLarge(data.len())),
        _ => Ok(()),
    }
}

/// Load address of a PRG image.
#[must_use]
pub fn prg_load_address(data: &[u8]) -> Option<u16> {
    match data {
        [lo, hi, _, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// The RAM fit a program needs, judged the way BASIC relocates: a PRG's
/// load address tells which memory map it was saved on.
///
/// | Load address | Fit |
/// |--------------|-----|
/// | $1201 | 24K (covers 8K/16K/24K programs) |
/// | $0401 | 3K |
/// | anything else | unexpanded |
///
/// Cartridges always run unexpanded. Raw images carry no hint.
#[must_use]
pub fn detect_ram(kind: ProgramKind, data: &[u8]) -> Option<RamExpansion> {
    match kind {
        ProgramKind::Prg => prg_load_address(data).map(|start| match start {
            0x1201 => RamExpansion::K24,
            0x0401 => RamExpansion::K3,
            _ => RamExpansion::UNEXPANDED,
        }),
        ProgramKind::Cartridge => Some(RamExpansion::UNEXPANDED),
        ProgramKind::Raw => None,
    }
}

/// Load `data` into the machine's memory. Returns the address the first
/// byte landed at.
///
/// # Errors
///
/// Rejects the image, leaving memory untouched, if [`validate`] fails.
pub fn load(bus: &mut Vic20Bus, kind: ProgramKind, data: &[u8]) -> Result<u16, LoadError> {
    validate(kind, data)?;
    match kind {
        ProgramKind::Prg => Ok(load_prg(bus, data)),
        ProgramKind::Cartridge => Ok(load_cartridge(bus, data)),
        ProgramKind::Raw => {
            let stored = bus.load_ram(0x0000, data);
            info!("raw image: {stored} of {} bytes landed in RAM", data.len());
            Ok(0x0000)
        }
    }
}

fn load_prg(bus: &mut Vic20Bus, data: &[u8]) -> u16 {
    let start = u16::from_le_bytes([data[0], data[1]]);
    let body = &data[2..];
    bus.load_ram(start, body);

    let end = start.wrapping_add(body.len() as u16);
    let [start_lo, start_hi] = start.to_le_bytes();
    let [end_lo, end_hi] = end.to_le_bytes();
    for pointer in START_POINTERS {
        bus.write(pointer, start_lo);
        bus.write(pointer + 1, start_hi);
    }
    for pointer in END_POINTERS {
        bus.write(pointer, end_lo);
        bus.write(pointer + 1, end_hi);
    }

    info!("PRG loaded at ${start:04X}-${end:04X}");
    start
}

fn load_cartridge(bus: &mut Vic20Bus, data: &[u8]) -> u16 {
    let start = if data.len() == SPLIT_CARTRIDGE_SIZE {
        let (low, high) = data.split_at(CARTRIDGE_BLOCK_SIZE);
        bus.map(Handler::Rom, 0x6000, 0x7FFF, 0, Some(low));
        bus.map(Handler::Rom, 0xA000, 0xBFFF, 0, Some(high));
        0x6000
    } else {
        let end = 0xA000 + (data.len() - 1) as u16;
        bus.map(Handler::Rom, 0xA000, end, 0, Some(data));
        0xA000
    };

    info!("cartridge mapped at ${start:04X} ({} bytes)", data.len());
    start
}
