//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports, two 16-bit timers, a shift
//! register, and an interrupt controller. The VIC-20 carries two of them:
//! VIA1 sits behind the user port, joystick and RESTORE key and drives
//! NMI; VIA2 scans the keyboard and drives IRQ.
//!
//! The chip knows nothing about what is soldered to its pins. Register
//! accesses take a [`PortWiring`] that reports the pin levels the outside
//! world presents and hears about every change to what the chip drives.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                              |
//! |-----|------|------------------------------------------|
//! | $0  | ORB  | Port B data (handshake on access)        |
//! | $1  | ORA  | Port A data (handshake on access)        |
//! | $2  | DDRB | Port B data direction (1 = output)       |
//! | $3  | DDRA | Port A data direction (1 = output)       |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1)   |
//! | $6  | T1LL | Timer 1 latch low                        |
//! | $7  | T1LH | Timer 1 latch high (write clears T1 IRQ) |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2)   |
//! | $A  | SR   | Shift register                           |
//! | $B  | ACR  | Auxiliary control register               |
//! | $C  | PCR  | Peripheral control register              |
//! | $D  | IFR  | Interrupt flag register                  |
//! | $E  | IER  | Interrupt enable register                |
//! | $F  | ORA  | Port A data (no handshake)               |

use std::fmt;

use emu_core::{Observable, Tickable, Value};

// IFR/IER bit masks
const IFR_CA2: u8 = 0x01;
const IFR_CA1: u8 = 0x02;
const IFR_SR: u8 = 0x04;
const IFR_CB2: u8 = 0x08;
const IFR_CB1: u8 = 0x10;
const IFR_T2: u8 = 0x20;
const IFR_T1: u8 = 0x40;
const IFR_IRQ: u8 = 0x80;

// ACR bits
const ACR_PA_LATCH: u8 = 0x01;
const ACR_PB_LATCH: u8 = 0x02;
const ACR_T2_PULSES: u8 = 0x20;
const ACR_T1_FREE_RUN: u8 = 0x40;
const ACR_T1_PB7: u8 = 0x80;

/// Levels the chip drives onto its two ports: output bits from the
/// output register, input bits pulled high.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortPins {
    pub a: u8,
    pub b: u8,
}

/// What the ports are connected to.
///
/// The default methods model a chip with nothing attached: every pin
/// reads back what the chip drives and changes go unheard.
pub trait PortWiring {
    /// Port A pin levels as seen from outside.
    fn port_a_pins(&mut self, driven: PortPins) -> u8 {
        driven.a
    }

    /// Port B pin levels as seen from outside.
    fn port_b_pins(&mut self, driven: PortPins) -> u8 {
        driven.b
    }

    /// Called whenever an output register, a DDR or the PCR is written.
    /// `ca2` and `cb2` are the control-line output levels.
    fn pins_changed(&mut self, _driven: PortPins, _ca2: bool, _cb2: bool) {}
}

/// A VIA with nothing on its ports.
impl PortWiring for () {}

/// Register contents for save/restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViaState {
    pub ora: u8,
    pub orb: u8,
    pub ira: u8,
    pub irb: u8,
    pub ddra: u8,
    pub ddrb: u8,
    pub t1_counter: u16,
    pub t1_latch: u16,
    pub t2_counter: u16,
    pub t2_latch_lo: u8,
    pub sr: u8,
    pub acr: u8,
    pub pcr: u8,
    pub ifr: u8,
    pub ier: u8,
    /// Timer 1 flags on its next underflow (one-shot mode).
    pub t1_armed: bool,
    /// Timer 2 flags on its next underflow.
    pub t2_armed: bool,
}

/// Receives the chip's IRQ output level after every change that can
/// affect it.
pub type IrqHandler = Box<dyn FnMut(bool)>;

/// MOS 6522 Versatile Interface Adapter.
pub struct Via6522 {
    /// Port A output register.
    ora: u8,
    /// Port B output register.
    orb: u8,
    /// Port A input latch, loaded on the CA1 active edge.
    ira: u8,
    /// Port B input latch, loaded on the CB1 active edge.
    irb: u8,
    /// Port A data direction register (1 = output).
    ddra: u8,
    /// Port B data direction register (1 = output).
    ddrb: u8,

    t1_counter: u16,
    t1_latch: u16,
    /// Cleared by the first underflow after a reload. The counter keeps
    /// running but the flag stays quiet until the next T1C-H write.
    t1_armed: bool,

    t2_counter: u16,
    /// Only the low byte of the timer 2 latch exists.
    t2_latch_lo: u8,
    t2_armed: bool,

    /// Shift register. Held, never shifted.
    sr: u8,

    /// Auxiliary control register (ACR).
    /// Bits 7-6: T1 control (x0 = one-shot, x1 = free-run, 1x = PB7 out)
    /// Bit 5: T2 control (0 = timed, 1 = count PB6 pulses)
    /// Bits 4-2: Shift register control
    /// Bit 1: PB latching enable
    /// Bit 0: PA latching enable
    acr: u8,

    /// Peripheral control register (PCR).
    /// Bits 7-5: CB2 control
    /// Bit 4: CB1 edge (0 = negative, 1 = positive)
    /// Bits 3-1: CA2 control
    /// Bit 0: CA1 edge (0 = negative, 1 = positive)
    pcr: u8,

    /// Interrupt flag register. Bit 7 mirrors `ifr & ier & 0x7F != 0`.
    ifr: u8,
    /// Interrupt enable register (7 bits).
    ier: u8,

    /// Last CA1/CB1 input levels, for edge detection.
    ca1: bool,
    cb1: bool,

    /// PB7 output toggled by timer 1 in free-run mode.
    pb7: bool,

    irq_handler: Option<IrqHandler>,
}

impl fmt::Debug for Via6522 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Via6522")
            .field("state", &self.state())
            .field("ca1", &self.ca1)
            .field("cb1", &self.cb1)
            .field("pb7", &self.pb7)
            .finish_non_exhaustive()
    }
}

impl Via6522 {
    /// Create a new VIA with all registers in their reset state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ora: 0,
            orb: 0,
            ira: 0,
            irb: 0,
            ddra: 0,
            ddrb: 0,
            t1_counter: 0xFFFF,
            t1_latch: 0xFFFF,
            t1_armed: false,
            t2_counter: 0xFFFF,
            t2_latch_lo: 0xFF,
            t2_armed: false,
            sr: 0,
            acr: 0,
            pcr: 0,
            ifr: 0,
            ier: 0,
            ca1: true,
            cb1: true,
            pb7: false,
            irq_handler: None,
        }
    }

    /// Connect the chip's IRQ output. The handler is called straight away
    /// with the current level.
    pub fn connect_irq(&mut self, handler: IrqHandler) {
        self.irq_handler = Some(handler);
        self.update_irq();
    }

    /// True while an enabled interrupt flag is set.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        (self.ifr & self.ier & 0x7F) != 0
    }

    /// Levels the chip is currently driving onto ports A and B.
    #[must_use]
    pub fn driven(&self) -> PortPins {
        let mut b = (self.orb & self.ddrb) | !self.ddrb;
        if self.acr & ACR_T1_PB7 != 0 {
            b = (b & 0x7F) | if self.pb7 { 0x80 } else { 0 };
        }
        PortPins {
            a: (self.ora & self.ddra) | !self.ddra,
            b,
        }
    }

    /// CA2 output level. Input and handshake modes leave the line high.
    #[must_use]
    pub fn ca2(&self) -> bool {
        control_line((self.pcr >> 1) & 0x07)
    }

    /// CB2 output level.
    #[must_use]
    pub fn cb2(&self) -> bool {
        control_line((self.pcr >> 5) & 0x07)
    }

    /// Read a VIA register.
    pub fn read(&mut self, reg: u8, wiring: &mut impl PortWiring) -> u8 {
        match reg & 0x0F {
            0x00 => {
                // IRB: input bits from the pins (or latch), output bits from ORB
                let input = if self.acr & ACR_PB_LATCH != 0 {
                    self.irb
                } else {
                    wiring.port_b_pins(self.driven())
                };
                let mut value = (input & !self.ddrb) | (self.orb & self.ddrb);
                if self.acr & ACR_T1_PB7 != 0 {
                    value = (value & 0x7F) | if self.pb7 { 0x80 } else { 0 };
                }
                self.clear_flags(IFR_CB1 | IFR_CB2);
                value
            }
            0x01 => {
                let value = self.read_port_a(wiring);
                self.clear_flags(IFR_CA1 | IFR_CA2);
                value
            }
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => {
                self.clear_flags(IFR_T1);
                self.t1_counter as u8
            }
            0x05 => (self.t1_counter >> 8) as u8,
            0x06 => self.t1_latch as u8,
            0x07 => (self.t1_latch >> 8) as u8,
            0x08 => {
                self.clear_flags(IFR_T2);
                self.t2_counter as u8
            }
            0x09 => (self.t2_counter >> 8) as u8,
            0x0A => {
                self.clear_flags(IFR_SR);
                self.sr
            }
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.ifr,
            0x0E => self.ier | 0x80,
            _ => self.read_port_a(wiring),
        }
    }

    /// Write a VIA register.
    pub fn write(&mut self, reg: u8, value: u8, wiring: &mut impl PortWiring) {
        match reg & 0x0F {
            0x00 => {
                self.orb = value;
                self.clear_flags(IFR_CB1 | IFR_CB2);
                self.notify(wiring);
            }
            0x01 => {
                self.ora = value;
                self.clear_flags(IFR_CA1 | IFR_CA2);
                self.notify(wiring);
            }
            0x02 => {
                self.ddrb = value;
                self.notify(wiring);
            }
            0x03 => {
                self.ddra = value;
                self.notify(wiring);
            }
            0x04 | 0x06 => {
                self.t1_latch = (self.t1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                // Latch high, then load the counter and re-arm the one-shot
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.t1_counter = self.t1_latch;
                self.t1_armed = true;
                self.pb7 = false;
                self.clear_flags(IFR_T1);
                self.notify(wiring);
            }
            0x07 => {
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.clear_flags(IFR_T1);
            }
            0x08 => self.t2_latch_lo = value,
            0x09 => {
                self.t2_counter = u16::from(self.t2_latch_lo) | (u16::from(value) << 8);
                self.t2_armed = true;
                self.clear_flags(IFR_T2);
            }
            0x0A => {
                self.sr = value;
                self.clear_flags(IFR_SR);
            }
            0x0B => {
                // Bit 7 hands PB7 to timer 1
                self.acr = value;
                self.notify(wiring);
            }
            0x0C => {
                self.pcr = value;
                self.notify(wiring);
            }
            0x0D => {
                // Bit 7 is not directly clearable
                self.clear_flags(value & 0x7F);
            }
            0x0E => {
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !(value & 0x7F);
                }
                self.update_irq();
            }
            _ => {
                self.ora = value;
                self.notify(wiring);
            }
        }
    }

    /// Drive the CA1 input. The PCR selects which edge sets the flag;
    /// with port A latching enabled the same edge captures IRA.
    pub fn set_ca1(&mut self, level: bool, wiring: &mut impl PortWiring) {
        let rising = self.pcr & 0x01 != 0;
        if active_edge(self.ca1, level, rising) {
            if self.acr & ACR_PA_LATCH != 0 {
                self.ira = wiring.port_a_pins(self.driven());
            }
            self.set_flags(IFR_CA1);
        }
        self.ca1 = level;
    }

    /// Drive the CB1 input. The PCR selects the active edge; with port B
    /// latching enabled the same edge captures IRB.
    pub fn set_cb1(&mut self, level: bool, wiring: &mut impl PortWiring) {
        let rising = self.pcr & 0x10 != 0;
        if active_edge(self.cb1, level, rising) {
            if self.acr & ACR_PB_LATCH != 0 {
                self.irb = wiring.port_b_pins(self.driven());
            }
            self.set_flags(IFR_CB1);
        }
        self.cb1 = level;
    }

    /// Register contents for a snapshot.
    #[must_use]
    pub fn state(&self) -> ViaState {
        ViaState {
            ora: self.ora,
            orb: self.orb,
            ira: self.ira,
            irb: self.irb,
            ddra: self.ddra,
            ddrb: self.ddrb,
            t1_counter: self.t1_counter,
            t1_latch: self.t1_latch,
            t2_counter: self.t2_counter,
            t2_latch_lo: self.t2_latch_lo,
            sr: self.sr,
            acr: self.acr,
            pcr: self.pcr,
            ifr: self.ifr,
            ier: self.ier,
            t1_armed: self.t1_armed,
            t2_armed: self.t2_armed,
        }
    }

    /// Load register contents from a snapshot, then re-drive the pins and
    /// the IRQ output.
    pub fn restore(&mut self, state: &ViaState, wiring: &mut impl PortWiring) {
        self.ora = state.ora;
        self.orb = state.orb;
        self.ira = state.ira;
        self.irb = state.irb;
        self.ddra = state.ddra;
        self.ddrb = state.ddrb;
        self.t1_counter = state.t1_counter;
        self.t1_latch = state.t1_latch;
        self.t2_counter = state.t2_counter;
        self.t2_latch_lo = state.t2_latch_lo;
        self.sr = state.sr;
        self.acr = state.acr;
        self.pcr = state.pcr;
        self.ifr = state.ifr & 0x7F;
        self.ier = state.ier & 0x7F;
        self.t1_armed = state.t1_armed;
        self.t2_armed = state.t2_armed;
        self.notify(wiring);
        self.update_irq();
    }

    fn read_port_a(&mut self, wiring: &mut impl PortWiring) -> u8 {
        // Port A reads the pins regardless of direction
        if self.acr & ACR_PA_LATCH != 0 {
            self.ira
        } else {
            wiring.port_a_pins(self.driven())
        }
    }

    fn notify(&self, wiring: &mut impl PortWiring) {
        wiring.pins_changed(self.driven(), self.ca2(), self.cb2());
    }

    fn set_flags(&mut self, bits: u8) {
        self.ifr |= bits;
        self.update_irq();
    }

    fn clear_flags(&mut self, bits: u8) {
        self.ifr &= !bits;
        self.update_irq();
    }

    /// Recompute IFR bit 7 and report the IRQ output level.
    fn update_irq(&mut self) {
        let active = self.irq_active();
        if active {
            self.ifr |= IFR_IRQ;
        } else {
            self.ifr &= !IFR_IRQ;
        }
        if let Some(handler) = self.irq_handler.as_mut() {
            handler(active);
        }
    }

    fn tick_timer1(&mut self) {
        let (next, underflow) = self.t1_counter.overflowing_sub(1);
        if !underflow {
            self.t1_counter = next;
            return;
        }

        if self.acr & ACR_T1_FREE_RUN != 0 {
            self.t1_counter = self.t1_latch;
            self.t1_armed = false;
            if self.acr & ACR_T1_PB7 != 0 {
                self.pb7 = !self.pb7;
            }
            self.set_flags(IFR_T1);
        } else {
            // One-shot keeps counting down from $FFFF
            self.t1_counter = 0xFFFF;
            if self.t1_armed {
                self.t1_armed = false;
                self.set_flags(IFR_T1);
            }
        }
    }

    fn tick_timer2(&mut self) {
        // Pulse counting on PB6 is not driven by the clock
        if self.acr & ACR_T2_PULSES != 0 {
            return;
        }

        let (next, underflow) = self.t2_counter.overflowing_sub(1);
        self.t2_counter = next;
        if underflow && self.t2_armed {
            self.t2_armed = false;
            self.set_flags(IFR_T2);
        }
    }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for Via6522 {
    /// Count both timers down by one cycle.
    fn tick(&mut self) {
        self.tick_timer1();
        self.tick_timer2();
    }
}

impl Observable for Via6522 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "timer1" => Some(self.t1_counter.into()),
            "timer2" => Some(self.t2_counter.into()),
            "ifr" => Some(self.ifr.into()),
            "ier" => Some(self.ier.into()),
            "acr" => Some(self.acr.into()),
            "pcr" => Some(self.pcr.into()),
            "port_a" => Some(self.ora.into()),
            "port_b" => Some(self.orb.into()),
            "ddr_a" => Some(self.ddra.into()),
            "ddr_b" => Some(self.ddrb.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "timer1", "timer2", "ifr", "ier", "acr", "pcr", "port_a", "port_b", "ddr_a", "ddr_b",
        ]
    }
}

fn active_edge(previous: bool, level: bool, rising: bool) -> bool {
    if rising {
        !previous && level
    } else {
        previous && !level
    }
}

/// Output level for a CA2/CB2 control field; `110` drives low, `111`
/// drives high.
fn control_line(mode: u8) -> bool {
    mode != 0b110
}
