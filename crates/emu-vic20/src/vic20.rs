//! Top-level VIC-20 system.
//!
//! The master clock ticks at CPU cycle rate (1,108,405 Hz PAL, 1,022,727 Hz
//! NTSC). One frame is a full raster of 4-pixel cycles: 312 × 71 = 22,152
//! cycles on PAL, 263 × 65 = 17,095 on NTSC.
//!
//! # Tick loop
//!
//! Each tick:
//! 1. VIC: fetch or draw four pixels, advance the beam
//! 2. CPU: one bus transaction
//! 3. VIA1: count timers (IRQ output drives the CPU's NMI)
//! 4. VIA2: count timers (IRQ output drives the CPU's IRQ)
//!
//! The VIAs report their IRQ outputs through handlers installed at
//! construction, so the CPU sees a level change in the same cycle it
//! happens.

use emu_core::{Cpu, Observable, Tickable, Value, parse_address};
use log::info;
use mos_6502::{Mos6502, Status, TrapHandler};

use crate::bus::Vic20Bus;
use crate::config::{RamExpansion, Vic20Config};
use crate::iec::SerialBus;
use crate::joystick::JoystickState;
use crate::keyboard::Vic20Key;
use crate::program::{self, LoadError, ProgramKind};
use crate::snapshot::{Snapshot, SnapshotError};

/// VIC-20 system.
pub struct Vic20 {
    cpu: Mos6502,
    bus: Vic20Bus,
    ram: RamExpansion,
    /// Master clock: counts CPU cycles.
    master_clock: u64,
    /// Completed frame counter.
    frame_count: u64,
    /// A frame completed since the framebuffer was last taken.
    frame_ready: bool,
}

impl Vic20 {
    /// Build the machine and reset the CPU from the KERNAL's vector.
    #[must_use]
    pub fn new(config: &Vic20Config) -> Self {
        let mut bus = Vic20Bus::new(config);
        let mut cpu = Mos6502::new();

        let nmi = cpu.interrupt_lines();
        bus.via1
            .connect_irq(Box::new(move |level| nmi.set_nmi(level)));
        let irq = cpu.interrupt_lines();
        bus.via2
            .connect_irq(Box::new(move |level| irq.set_irq(level)));

        cpu.reset(&mut bus);
        info!(
            "VIC-20 {:?}, {}K expansion, reset to ${:04X}",
            config.machine,
            config.ram.kilobytes(),
            cpu.pc()
        );

        Self {
            cpu,
            bus,
            ram: config.ram,
            master_clock: 0,
            frame_count: 0,
            frame_ready: false,
        }
    }

    /// One master clock tick. Returns true if the VIC finished a frame.
    fn step(&mut self) -> bool {
        self.master_clock += 1;
        self.bus.tick_vic();
        self.cpu.tick(&mut self.bus);
        self.bus.via1.tick();
        self.bus.via2.tick();

        let frame = self.bus.vic.take_frame_complete();
        if frame {
            self.frame_count += 1;
            self.frame_ready = true;
        }
        frame
    }

    /// Run for `elapsed_seconds` of emulated time, rounded to the nearest
    /// cycle. Returns true if at least one frame completed.
    pub fn update(&mut self, elapsed_seconds: f64) -> bool {
        let rate = f64::from(self.bus.vic.machine().cycles_per_second());
        let cycles = (elapsed_seconds * rate).round().max(0.0) as u64;
        let mut frame = false;
        for _ in 0..cycles {
            frame |= self.step();
        }
        frame
    }

    /// Run one complete frame (until the VIC signals frame complete).
    ///
    /// Returns the number of CPU cycles executed during the frame.
    pub fn run_frame(&mut self) -> u64 {
        let start_clock = self.master_clock;
        while !self.step() {}
        self.master_clock - start_clock
    }

    /// Tick until the CPU is between instructions, so that a snapshot
    /// taken next resumes cleanly. Returns true if a frame completed on
    /// the way.
    pub fn finish_instruction(&mut self) -> bool {
        let mut frame = false;
        while !self.cpu.at_instruction_boundary() {
            frame |= self.step();
        }
        frame
    }

    /// Reference to the framebuffer (ARGB32, full raster including
    /// blanking).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.vic.framebuffer()
    }

    /// Framebuffer width in pixels.
    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        self.bus.vic.framebuffer_width()
    }

    /// Framebuffer height in pixels.
    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        self.bus.vic.framebuffer_height()
    }

    /// The framebuffer, if a frame has completed since the last call.
    /// Clears the frame-ready state.
    pub fn take_frame(&mut self) -> Option<&[u32]> {
        if std::mem::take(&mut self.frame_ready) {
            Some(self.bus.vic.framebuffer())
        } else {
            None
        }
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &Vic20Bus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut Vic20Bus {
        &mut self.bus
    }

    /// Master clock tick count (CPU cycles).
    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// RAM expansion fitted.
    #[must_use]
    pub fn ram_expansion(&self) -> RamExpansion {
        self.ram
    }

    /// Press a key immediately.
    pub fn press_key(&mut self, key: Vic20Key) {
        let (row, col) = key.matrix();
        self.bus.peripherals.keyboard.set_key(row, col, true);
    }

    /// Release a key.
    pub fn release_key(&mut self, key: Vic20Key) {
        let (row, col) = key.matrix();
        self.bus.peripherals.keyboard.set_key(row, col, false);
    }

    /// Release all keys.
    pub fn release_all_keys(&mut self) {
        self.bus.peripherals.keyboard.release_all();
    }

    pub fn set_joystick(&mut self, state: JoystickState) {
        self.bus.peripherals.joystick = state;
    }

    /// RESTORE is wired to VIA1 CA1 and pulls it low while held. With the
    /// KERNAL's interrupt setup the falling edge raises an NMI.
    pub fn set_restore_key(&mut self, pressed: bool) {
        self.bus.set_via1_ca1(!pressed);
    }

    /// Datasette PLAY switch, read on VIA1 PA6.
    pub fn set_tape_sense(&mut self, pressed: bool) {
        self.bus.peripherals.tape_sense = pressed;
    }

    /// One pulse from the tape read head on VIA2 CA1.
    pub fn tape_pulse(&mut self) {
        self.bus.set_via2_ca1(false);
        self.bus.set_via2_ca1(true);
    }

    /// Serial bus line state.
    #[must_use]
    pub fn serial_bus(&self) -> &SerialBus {
        &self.bus.peripherals.serial
    }

    /// The serial bus, for a device model to pull lines.
    pub fn serial_bus_mut(&mut self) -> &mut SerialBus {
        &mut self.bus.peripherals.serial
    }

    /// Run `handler` whenever execution reaches `address`. See
    /// [`TrapHandler`] for what it may do.
    pub fn register_trap(&mut self, address: u16, handler: TrapHandler) {
        self.cpu.register_trap(&mut self.bus, address, handler);
    }

    /// Remove a trap. Returns false if none was installed at `address`.
    pub fn remove_trap(&mut self, address: u16) -> bool {
        self.cpu.remove_trap(&mut self.bus, address)
    }

    /// Load a program image. A cartridge resets the CPU afterwards; a PRG
    /// or raw image leaves it running.
    ///
    /// Returns the address the first byte landed at.
    ///
    /// # Errors
    ///
    /// Malformed images are rejected before memory is touched.
    pub fn load_program(&mut self, kind: ProgramKind, data: &[u8]) -> Result<u16, LoadError> {
        let start = program::load(&mut self.bus, kind, data).inspect_err(|e| {
            log::warn!("{kind:?} image rejected: {e}");
        })?;
        if kind == ProgramKind::Cartridge {
            self.cpu.reset(&mut self.bus);
        }
        Ok(start)
    }

    /// Capture the machine state.
    ///
    /// Taken mid-instruction, the saved PC is wherever the CPU had got to
    /// inside it; call [`finish_instruction`](Self::finish_instruction)
    /// first for a snapshot that resumes exactly.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut memory = self.bus.memory().to_vec();
        for address in self.cpu.trap_addresses() {
            if let Some(byte) = self.cpu.trapped_byte(address) {
                memory[usize::from(address)] = byte;
            }
        }
        memory[0x9000..0x9010].copy_from_slice(&self.bus.vic.registers());

        let r = &self.cpu.regs;
        Snapshot {
            memory,
            a: r.a,
            x: r.x,
            y: r.y,
            s: r.s,
            p: r.p.to_byte(),
            pc: r.pc,
            raster_line: self.bus.vic.raster_line(),
            raster_cycle: self.bus.vic.raster_cycle(),
            via1: self.bus.via1.state(),
            via2: self.bus.via2.state(),
            ram_expansion: self.ram,
        }
    }

    /// Build a machine from `config`'s ROMs and resume from `snapshot`
    /// instead of reset. The snapshot's expansion mask replaces the
    /// config's.
    ///
    /// # Errors
    ///
    /// The snapshot is checked in full before a machine is built.
    pub fn from_snapshot(config: &Vic20Config, snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        snapshot.validate(config.machine).inspect_err(|e| {
            log::warn!("snapshot rejected: {e}");
        })?;

        let mut machine = Self::new(&config.with_ram(snapshot.ram_expansion));
        machine.bus.load_ram(0x0000, &snapshot.memory);
        machine.bus.vic.load_registers(&snapshot.vic_registers());
        machine
            .bus
            .vic
            .set_raster(snapshot.raster_line, snapshot.raster_cycle);

        let r = &mut machine.cpu.regs;
        r.a = snapshot.a;
        r.x = snapshot.x;
        r.y = snapshot.y;
        r.s = snapshot.s;
        r.p = Status::from_byte(snapshot.p);
        machine.cpu.force_pc(snapshot.pc);

        machine.bus.restore_vias(&snapshot.via1, &snapshot.via2);

        info!(
            "snapshot restored at ${:04X}, raster {}:{}",
            snapshot.pc, snapshot.raster_line, snapshot.raster_cycle
        );
        Ok(machine)
    }
}

impl Tickable for Vic20 {
    fn tick(&mut self) {
        self.step();
    }
}

impl Observable for Vic20 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("vic.") {
            self.bus.vic.query(rest)
        } else if let Some(rest) = path.strip_prefix("via1.") {
            self.bus.via1.query(rest)
        } else if let Some(rest) = path.strip_prefix("via2.") {
            self.bus.via2.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|address| self.bus.peek(address).into())
        } else {
            match path {
                "master_clock" => Some(self.master_clock.into()),
                "frame_count" => Some(self.frame_count.into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502 path>",
            "vic.<vic path>",
            "via1.<via path>",
            "via2.<via path>",
            "memory.<address>",
            "master_clock",
            "frame_count",
        ]
    }
}
