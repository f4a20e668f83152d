//! Cycle-accurate Commodore VIC-20 emulator.
//!
//! The VIC-20 master clock ticks at CPU cycle rate (1,108,405 Hz PAL). The
//! 6561 VIC draws four pixels per cycle, and the two 6522 VIAs count their
//! timers every cycle. One PAL frame is 312 raster lines x 71 cycles =
//! 22,152 CPU cycles (~50 Hz).

mod bus;
#[cfg(feature = "native")]
pub mod capture;
pub mod config;
pub mod iec;
pub mod joystick;
pub mod keyboard;
pub mod program;
pub mod snapshot;
mod vic20;
mod wiring;

pub use bus::{ChipId, Handler, UNCONNECTED, Vic20Bus};
pub use config::{ConfigError, MachineType, RamExpansion, Vic20Config};
pub use iec::SerialBus;
pub use joystick::JoystickState;
pub use keyboard::{KeyboardMatrix, Vic20Key};
pub use program::{LoadError, ProgramKind};
pub use snapshot::{Snapshot, SnapshotError};
pub use vic20::Vic20;
pub use wiring::Peripherals;
