//! 6502 processor status register (P).
//!
//! Six bits are real latches. B (bit 4) does not exist inside the CPU: it
//! only appears in the byte pushed to the stack, set for BRK/PHP and
//! clear for IRQ/NMI. Bit 5 always reads as 1.

/// Carry.
pub const C: u8 = 0x01;

/// Zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ is ignored.
pub const I: u8 = 0x04;

/// Decimal mode for ADC/SBC.
pub const D: u8 = 0x08;

/// Break - only meaningful in a pushed status byte.
pub const B: u8 = 0x10;

/// Unused - always 1 when read.
pub const U: u8 = 0x20;

/// Overflow.
pub const V: u8 = 0x40;

/// Negative.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Status with only the unused bit set.
    #[must_use]
    pub const fn new() -> Self {
        Self(U)
    }

    /// Status from a pulled or restored byte. B is dropped.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// The packed register as seen by a snapshot: U set, B clear.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Byte pushed by BRK and PHP (B set) or IRQ/NMI (B clear).
    #[must_use]
    pub const fn to_pushed(self, brk: bool) -> u8 {
        if brk { self.0 | U | B } else { (self.0 | U) & !B }
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from a result.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}
