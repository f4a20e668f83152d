//! Micro-op stepped MOS 6502 CPU.
//!
//! Every opcode decodes to a fixed list of one-cycle bus actions. Each
//! `tick()` runs exactly one of them, so instruction timing, dummy reads
//! and dummy writes fall out of the table rather than being counted
//! separately.
//!
//! Interrupt inputs are an [`InterruptLines`] handle that the chips
//! driving IRQ and NMI hold a clone of.

mod cpu;
pub mod decode;
pub mod flags;
mod registers;

pub use cpu::{InterruptLines, Mos6502, TrapHandler};
pub use decode::TRAP_OPCODE;
pub use flags::Status;
pub use registers::Registers;
