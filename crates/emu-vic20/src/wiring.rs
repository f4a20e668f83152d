//! What the two VIAs are soldered to.
//!
//! VIA1 ($9110) faces the user port: serial bus inputs, the joystick, the
//! tape sense switch and serial ATN out. Its IRQ output drives the CPU's
//! NMI, and CA1 is the RESTORE key.
//!
//! VIA2 ($9120) scans the keyboard on its two ports, reads joystick right
//! on PB7, and drives serial CLK and DATA out through CA2 and CB2. Its IRQ
//! output drives the CPU's IRQ, and CA1 is the tape read line.

use mos_via_6522::{PortPins, PortWiring};

use crate::iec::SerialBus;
use crate::joystick::JoystickState;
use crate::keyboard::KeyboardMatrix;

/// Everything outside the chips that the ports can see.
#[derive(Default)]
pub struct Peripherals {
    pub keyboard: KeyboardMatrix,
    pub joystick: JoystickState,
    pub serial: SerialBus,
    /// Datasette PLAY pressed.
    pub tape_sense: bool,
}

/// Port wiring for one of the two VIAs, borrowing the peripherals for the
/// duration of a register access.
pub enum Wiring<'a> {
    UserPort(&'a mut Peripherals),
    Keyboard(&'a mut Peripherals),
}

impl PortWiring for Wiring<'_> {
    fn port_a_pins(&mut self, driven: PortPins) -> u8 {
        match self {
            Self::UserPort(p) => {
                // PA6: tape sense, low while PLAY is down.
                let tape = if p.tape_sense { !0x40 } else { 0xFF };
                driven.a & p.serial.via1_port_a() & p.joystick.via1_port_a() & tape
            }
            Self::Keyboard(p) => driven.a & p.keyboard.scan_rows(driven.b),
        }
    }

    fn port_b_pins(&mut self, driven: PortPins) -> u8 {
        match self {
            Self::UserPort(_) => driven.b,
            Self::Keyboard(p) => {
                driven.b & p.keyboard.scan_columns(driven.a) & p.joystick.via2_port_b()
            }
        }
    }

    fn pins_changed(&mut self, driven: PortPins, ca2: bool, cb2: bool) {
        match self {
            Self::UserPort(p) => p.serial.set_computer_atn(driven.a & 0x80 != 0),
            Self::Keyboard(p) => {
                p.serial.set_computer_clk(ca2);
                p.serial.set_computer_data(cb2);
            }
        }
    }
}
