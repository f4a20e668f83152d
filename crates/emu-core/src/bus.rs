//! Memory bus interface.

/// A 16-bit address bus.
///
/// Every address is valid. Whatever sits behind an address (RAM, ROM, a
/// chip register or nothing at all) is the implementor's business.
pub trait Bus {
    /// Read a byte, with any side effects the owning device has.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte through the owning device.
    fn write(&mut self, address: u16, value: u8);

    /// Patch the backing store directly, bypassing device dispatch and
    /// ROM protection.
    fn force_write(&mut self, address: u16, value: u8) {
        self.write(address, value);
    }
}

/// Flat 64K RAM with no devices. Used by CPU tests.
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(i as u16))] = byte;
        }
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}
