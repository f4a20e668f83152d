//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// Unlike other `Tickable` components, a CPU takes the bus in its tick
/// method: it performs exactly one bus transaction per cycle and the
/// bus is shared with the other chips.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one clock cycle.
    fn tick<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a copy of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Assert or release the maskable interrupt line.
    fn set_irq(&mut self, level: bool);

    /// Pulse the non-maskable interrupt line.
    fn nmi(&mut self);

    /// Reset the CPU, loading PC from the reset vector.
    fn reset<B: Bus>(&mut self, bus: &mut B);
}
