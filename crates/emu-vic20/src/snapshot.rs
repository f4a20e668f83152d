//! Flat machine state for save and resume.
//!
//! A snapshot is plain data: a 64K memory image with the VIC registers at
//! $9000-$900F, the CPU registers, both VIA register sets and the beam
//! position. No file format is parsed here; front-ends serialize the
//! struct however they like (it derives `serde` traits behind the `serde`
//! feature).
//!
//! Cartridge mapping is not captured. A cartridge image in $6000-$7FFF or $A000-$BFFF is
//! restored only if the expansion mask makes that block RAM.

use mos_via_6522::ViaState;
use mos_vic_6561::MachineType;

use crate::config::RamExpansion;

/// Size of the memory image.
pub const MEMORY_SIZE: usize = 0x10000;

/// Saved machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub memory: Vec<u8>,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: u8,
    pub pc: u16,
    pub raster_line: u16,
    pub raster_cycle: u16,
    pub via1: ViaState,
    pub via2: ViaState,
    pub ram_expansion: RamExpansion,
}

/// Why a snapshot cannot be restored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("memory image is {0} bytes, expected 65536")]
    MemorySize(usize),
    #[error("raster position line {line}, cycle {cycle} is outside the {machine:?} frame")]
    RasterOutOfRange {
        line: u16,
        cycle: u16,
        machine: MachineType,
    },
}

impl Snapshot {
    /// Check the snapshot fits a `machine` before anything is restored.
    ///
    /// # Errors
    ///
    /// Fails if the memory image is not exactly 64K or the beam position
    /// is off the raster.
    pub fn validate(&self, machine: MachineType) -> Result<(), SnapshotError> {
        if self.memory.len() != MEMORY_SIZE {
            return Err(SnapshotError::MemorySize(self.memory.len()));
        }
        if self.raster_line >= machine.total_height()
            || self.raster_cycle >= machine.cycles_per_line()
        {
            return Err(SnapshotError::RasterOutOfRange {
                line: self.raster_line,
                cycle: self.raster_cycle,
                machine,
            });
        }
        Ok(())
    }

    /// The sixteen VIC register bytes in the image.
    #[must_use]
    pub fn vic_registers(&self) -> [u8; 16] {
        let mut regs = [0; 16];
        if let Some(bytes) = self.memory.get(0x9000..0x9010) {
            regs.copy_from_slice(bytes);
        }
        regs
    }
}
