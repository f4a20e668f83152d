//! Serial bus between the VIC-20 and its disk drives and printers.
//!
//! Three open-collector lines: ATN, CLK, DATA. Each participant (the
//! computer and whatever device is plugged in) can independently pull a
//! line low. A line reads high only when nobody pulls it low.
//!
//! Signal routing on the computer side:
//!   ATN out:  VIA1 PA7 (high = pull low, through an inverter)
//!   CLK out:  VIA2 CA2 (high = pull low)
//!   DATA out: VIA2 CB2 (high = pull low)
//!   CLK in:   VIA1 PA0 (line level, no inverter)
//!   DATA in:  VIA1 PA1 (line level)

/// Serial bus with two participants: the computer and a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerialBus {
    /// ATN pull-down: [computer, device]. true = pulling low.
    atn_pulls: [bool; 2],
    /// CLK pull-down: [computer, device].
    clk_pulls: [bool; 2],
    /// DATA pull-down: [computer, device].
    data_pulls: [bool; 2],
}

impl SerialBus {
    /// Create a serial bus with all lines released (high).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Computer side ---

    pub fn set_computer_atn(&mut self, pull_low: bool) {
        self.atn_pulls[0] = pull_low;
    }

    pub fn set_computer_clk(&mut self, pull_low: bool) {
        self.clk_pulls[0] = pull_low;
    }

    pub fn set_computer_data(&mut self, pull_low: bool) {
        self.data_pulls[0] = pull_low;
    }

    // --- Device side ---

    /// Set whether the device pulls CLK low.
    pub fn set_device_clk(&mut self, pull_low: bool) {
        self.clk_pulls[1] = pull_low;
    }

    /// Set whether the device pulls DATA low.
    pub fn set_device_data(&mut self, pull_low: bool) {
        self.data_pulls[1] = pull_low;
    }

    // --- Line state (true = high, false = low) ---

    #[must_use]
    pub fn atn(&self) -> bool {
        !self.atn_pulls[0] && !self.atn_pulls[1]
    }

    #[must_use]
    pub fn clk(&self) -> bool {
        !self.clk_pulls[0] && !self.clk_pulls[1]
    }

    #[must_use]
    pub fn data(&self) -> bool {
        !self.data_pulls[0] && !self.data_pulls[1]
    }

    /// VIA1 port A bits 0-1 as the computer reads them. Other bits high.
    #[must_use]
    pub fn via1_port_a(&self) -> u8 {
        let mut pins = 0xFF;
        if !self.clk() {
            pins &= !0x01;
        }
        if !self.data() {
            pins &= !0x02;
        }
        pins
    }
}
