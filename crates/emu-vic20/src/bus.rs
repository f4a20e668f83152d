//! VIC-20 bus: memory, chip registers and partial address decoding.
//!
//! Implements `emu_core::Bus` for the VIC-20. Every address resolves to one
//! [`Handler`] through a 64K table filled in once at construction. Storage
//! for RAM, ROM and colour RAM is a flat 64K array; chip registers live in
//! the chips.
//!
//! The I/O block at $9000-$93FF is not fully decoded. Within each $40-byte
//! stretch the VIC answers at +$00, VIA1 at +$10 and VIA2 at +$20, but in
//! the $9000-$90FF page the VIC's select overlaps the VIAs', so several
//! chips respond to one access. Those addresses get a
//! [`Handler::Composite`]: reads OR together what each chip drives, writes
//! reach all of them.

use emu_core::Bus;
use mos_via_6522::{Via6522, ViaState};
use mos_vic_6561::Vic6561;

use crate::config::{RamExpansion, Vic20Config};
use crate::wiring::{Peripherals, Wiring};

/// Value read from an address nothing answers at.
pub const UNCONNECTED: u8 = 0xFF;

/// A chip with registers on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipId {
    Vic,
    Via1,
    Via2,
}

const VIC_VIA1: &[ChipId] = &[ChipId::Vic, ChipId::Via1];
const VIC_VIA2: &[ChipId] = &[ChipId::Vic, ChipId::Via2];
const VIC_VIA1_VIA2: &[ChipId] = &[ChipId::Vic, ChipId::Via1, ChipId::Via2];
const VIA1_VIA2: &[ChipId] = &[ChipId::Via1, ChipId::Via2];

/// What answers at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Ram,
    /// Reads from memory, ignores writes.
    Rom,
    /// Four bits wide; the upper nibble reads as zero.
    ColourRam,
    Unconnected,
    Chip(ChipId),
    /// Several chips selected by one address.
    Composite(&'static [ChipId]),
}

/// The VIC-20 bus, implementing `emu_core::Bus`.
///
/// Owns memory and every chip except the CPU.
pub struct Vic20Bus {
    memory: Box<[u8; 0x10000]>,
    handlers: Vec<Handler>,
    pub vic: Vic6561,
    pub via1: Via6522,
    pub via2: Via6522,
    pub peripherals: Peripherals,
}

impl Vic20Bus {
    /// Build the memory map for `config`.
    #[must_use]
    pub fn new(config: &Vic20Config) -> Self {
        let mut bus = Self {
            memory: Box::new([0; 0x10000]),
            handlers: vec![Handler::Unconnected; 0x10000],
            vic: Vic6561::new(config.machine),
            via1: Via6522::new(),
            via2: Via6522::new(),
            peripherals: Peripherals::default(),
        };

        bus.map(Handler::Ram, 0x0000, 0x03FF, 0, None);
        bus.map(Handler::Ram, 0x1000, 0x1FFF, 0, None);
        bus.set_ram_expansion(config.ram);

        bus.map(Handler::Rom, 0x8000, 0x8FFF, 0, Some(&config.char_rom));
        bus.map_io();
        bus.map(Handler::ColourRam, 0x9400, 0x97FF, 0, None);
        // VIC register image repeated over the I/O expansion area.
        bus.map(Handler::Chip(ChipId::Vic), 0x9800, 0x980F, 0x07F0, None);

        bus.map(Handler::Rom, 0xC000, 0xDFFF, 0, Some(&config.basic_rom));
        bus.map(Handler::Rom, 0xE000, 0xFFFF, 0, Some(&config.kernal_rom));
        bus
    }

    /// Install `handler` over `start..=end`, and again at every base formed
    /// from a subset of the bits in `mirror_mask`. `data`, if given, seeds
    /// the backing store of every copy.
    pub fn map(
        &mut self,
        handler: Handler,
        start: u16,
        end: u16,
        mirror_mask: u16,
        data: Option<&[u8]>,
    ) {
        let mut mirror = mirror_mask;
        loop {
            for address in start..=end {
                let target = usize::from(address | mirror);
                self.handlers[target] = handler;
                if let Some(byte) = data.and_then(|d| d.get(usize::from(address - start))) {
                    self.memory[target] = *byte;
                }
            }
            if mirror == 0 {
                break;
            }
            mirror = (mirror - 1) & mirror_mask;
        }
    }

    /// Enable or disable the optional RAM blocks. Disabled blocks float.
    pub fn set_ram_expansion(&mut self, ram: RamExpansion) {
        for (bit, start, end) in RamExpansion::BLOCKS {
            let handler = if ram.has(bit) {
                Handler::Ram
            } else {
                Handler::Unconnected
            };
            self.map(handler, start, end, 0, None);
        }
    }

    fn map_io(&mut self) {
        for address in 0x9000..=0x93FF_u16 {
            let low_page = address < 0x9100;
            let handler = match (address & 0x30, low_page) {
                (0x00, _) => Handler::Chip(ChipId::Vic),
                (0x10, true) => Handler::Composite(VIC_VIA1),
                (0x20, true) => Handler::Composite(VIC_VIA2),
                (0x30, true) => Handler::Composite(VIC_VIA1_VIA2),
                (0x10, false) => Handler::Chip(ChipId::Via1),
                (0x20, false) => Handler::Chip(ChipId::Via2),
                _ => Handler::Composite(VIA1_VIA2),
            };
            self.handlers[usize::from(address)] = handler;
        }
    }

    /// Handler at `address`.
    #[must_use]
    pub fn handler(&self, address: u16) -> Handler {
        self.handlers[usize::from(address)]
    }

    /// Read without side effects. VIC addresses show its register file;
    /// VIA addresses show the backing store, since reading a VIA can clear
    /// its flags.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        match self.handler(address) {
            Handler::Unconnected => UNCONNECTED,
            Handler::Chip(ChipId::Vic) => self.vic.read(address),
            _ => self.memory[usize::from(address)],
        }
    }

    /// Raw 64K backing store.
    #[must_use]
    pub fn memory(&self) -> &[u8; 0x10000] {
        &self.memory
    }

    /// Copy `data` into RAM-backed addresses from `start` on, skipping
    /// ROM, chips and unconnected space. Returns the number of bytes that
    /// landed.
    pub fn load_ram(&mut self, start: u16, data: &[u8]) -> usize {
        let mut stored = 0;
        for (i, &byte) in data.iter().enumerate() {
            let Ok(offset) = u16::try_from(i) else {
                break;
            };
            let address = start.wrapping_add(offset);
            match self.handler(address) {
                Handler::Ram => self.memory[usize::from(address)] = byte,
                Handler::ColourRam => self.memory[usize::from(address)] = byte & 0x0F,
                _ => continue,
            }
            stored += 1;
        }
        stored
    }

    /// Advance the VIC one cycle. It fetches straight from the backing
    /// store, which is how it sees ROM and colour RAM.
    pub fn tick_vic(&mut self) {
        let memory = &self.memory;
        self.vic.tick(|address| memory[usize::from(address)]);
    }

    fn chip_read(&mut self, chip: ChipId, address: u16) -> u8 {
        let reg = (address & 0x0F) as u8;
        match chip {
            ChipId::Vic => self.vic.read(address),
            ChipId::Via1 => self
                .via1
                .read(reg, &mut Wiring::UserPort(&mut self.peripherals)),
            ChipId::Via2 => self
                .via2
                .read(reg, &mut Wiring::Keyboard(&mut self.peripherals)),
        }
    }

    fn chip_write(&mut self, chip: ChipId, address: u16, value: u8) {
        let reg = (address & 0x0F) as u8;
        match chip {
            ChipId::Vic => self.vic.write(address, value),
            ChipId::Via1 => {
                self.via1
                    .write(reg, value, &mut Wiring::UserPort(&mut self.peripherals));
            }
            ChipId::Via2 => {
                self.via2
                    .write(reg, value, &mut Wiring::Keyboard(&mut self.peripherals));
            }
        }
    }

    /// Drive VIA1 CA1 (RESTORE key).
    pub fn set_via1_ca1(&mut self, level: bool) {
        self.via1
            .set_ca1(level, &mut Wiring::UserPort(&mut self.peripherals));
    }

    /// Drive VIA2 CA1 (tape read).
    pub fn set_via2_ca1(&mut self, level: bool) {
        self.via2
            .set_ca1(level, &mut Wiring::Keyboard(&mut self.peripherals));
    }

    /// Restore both VIAs from saved state, re-driving their outputs.
    pub fn restore_vias(&mut self, via1: &ViaState, via2: &ViaState) {
        self.via1
            .restore(via1, &mut Wiring::UserPort(&mut self.peripherals));
        self.via2
            .restore(via2, &mut Wiring::Keyboard(&mut self.peripherals));
    }
}

impl Bus for Vic20Bus {
    fn read(&mut self, address: u16) -> u8 {
        match self.handler(address) {
            Handler::Ram | Handler::Rom => self.memory[usize::from(address)],
            Handler::ColourRam => self.memory[usize::from(address)] & 0x0F,
            Handler::Unconnected => UNCONNECTED,
            Handler::Chip(chip) => self.chip_read(chip, address),
            Handler::Composite(chips) => chips
                .iter()
                .fold(0, |value, &chip| value | self.chip_read(chip, address)),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match self.handler(address) {
            Handler::Ram => self.memory[usize::from(address)] = value,
            Handler::ColourRam => self.memory[usize::from(address)] = value & 0x0F,
            Handler::Rom | Handler::Unconnected => {}
            Handler::Chip(chip) => self.chip_write(chip, address, value),
            Handler::Composite(chips) => {
                for &chip in chips {
                    self.chip_write(chip, address, value);
                }
            }
        }
    }

    fn force_write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}
