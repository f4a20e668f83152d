//! Shared traits for the cycle-stepped chips.
//!
//! One emulated clock cycle is the unit of synchronisation. Every chip
//! advances by exactly one cycle per call, and the machine decides the
//! order.

mod bus;
mod cpu;
mod observable;
mod tickable;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
pub use tickable::Tickable;
