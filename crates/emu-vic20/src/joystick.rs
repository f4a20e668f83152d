//! Control-port joystick.
//!
//! The VIC-20 splits its one joystick across both VIAs: up, down, left and
//! fire sit on VIA1 port A bits 2-5, and right sits on VIA2 port B bit 7.
//! All switches are active low.

/// Switch positions of a digital joystick. `true` = closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoystickState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl JoystickState {
    /// VIA1 port A bits contributed by the joystick (PA2-PA5), active low.
    /// Other bits are returned high.
    #[must_use]
    pub fn via1_port_a(self) -> u8 {
        let mut pins = 0xFF;
        if self.up {
            pins &= !0x04;
        }
        if self.down {
            pins &= !0x08;
        }
        if self.left {
            pins &= !0x10;
        }
        if self.fire {
            pins &= !0x20;
        }
        pins
    }

    /// VIA2 port B bit 7, active low. Other bits are returned high.
    #[must_use]
    pub fn via2_port_b(self) -> u8 {
        if self.right { 0x7F } else { 0xFF }
    }
}
