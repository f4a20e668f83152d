//! 6502 micro-op stepper.
//!
//! Each `tick()` performs exactly one bus transaction: either the next
//! micro-op of the current instruction, or an opcode fetch at an
//! instruction boundary. Interrupts are sampled only at those boundaries.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use emu_core::{Bus, Cpu, Observable, Value};

use crate::decode::{INSTRUCTIONS, IRQ, Instruction, MicroOp, NMI, Op, TRAP_INDEX, TRAP_OPCODE};
use crate::flags::{C, D, I, N, V, Z};
use crate::{Registers, Status};

const IRQ_LEVEL: u8 = 0x01;
const NMI_LEVEL: u8 = 0x02;
const NMI_EDGE: u8 = 0x04;

/// The CPU's two interrupt inputs, shared with the chips that drive them.
///
/// IRQ is a level: it stays asserted until its driver releases it. NMI
/// is edge-triggered: a low-to-high transition latches a request that is
/// cleared when the CPU services it, whatever the line does afterwards.
#[derive(Debug, Clone, Default)]
pub struct InterruptLines(Rc<Cell<u8>>);

impl InterruptLines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_irq(&self, level: bool) {
        let bits = self.0.get();
        self.0
            .set(if level { bits | IRQ_LEVEL } else { bits & !IRQ_LEVEL });
    }

    pub fn set_nmi(&self, level: bool) {
        let bits = self.0.get();
        let bits = match (level, bits & NMI_LEVEL != 0) {
            (true, false) => bits | NMI_LEVEL | NMI_EDGE,
            (true, true) => bits,
            (false, _) => bits & !NMI_LEVEL,
        };
        self.0.set(bits);
    }

    #[must_use]
    pub fn irq(&self) -> bool {
        self.0.get() & IRQ_LEVEL != 0
    }

    #[must_use]
    pub fn nmi(&self) -> bool {
        self.0.get() & NMI_LEVEL != 0
    }

    /// True while an NMI edge is waiting to be serviced.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.0.get() & NMI_EDGE != 0
    }

    fn acknowledge_nmi(&self) {
        self.0.set(self.0.get() & !NMI_EDGE);
    }
}

/// Callback run when execution reaches a trapped address.
///
/// It sees the bus and a copy of the registers. Returning `Some(pc)`
/// resumes there; `None` falls through to the instruction the trap
/// displaced.
pub type TrapHandler = Box<dyn FnMut(&mut dyn Bus, &Registers) -> Option<u16>>;

struct Trap {
    original: u8,
    handler: TrapHandler,
}

/// The MOS 6502 CPU.
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,

    /// Instruction being executed.
    current: Instruction,
    /// Index of the next micro-op in `current.steps`.
    step: usize,
    /// Opcode byte of `current`, for diagnostics.
    opcode: u8,

    /// Effective address.
    ea: u16,
    /// Base address for indexed modes.
    base: u16,
    /// Indirect pointer.
    ia: u16,
    /// Operand and pulled-byte latches.
    adl: u8,
    data: u8,

    /// Set by a taken branch; cleared if the branch crosses a page.
    delay_interrupt: bool,
    lines: InterruptLines,

    traps: HashMap<u16, Trap>,

    cycles: u64,
    illegal_opcodes: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mos6502 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mos6502")
            .field("regs", &self.regs)
            .field("op", &self.current.op)
            .field("step", &self.step)
            .field("cycles", &self.cycles)
            .field("traps", &self.traps.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Mos6502 {
    /// A CPU at an instruction boundary with reset-state registers. Call
    /// `reset()` to load PC from the vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            current: INSTRUCTIONS[0xEA],
            step: usize::MAX,
            opcode: 0xEA,
            ea: 0,
            base: 0,
            ia: 0,
            adl: 0,
            data: 0,
            delay_interrupt: false,
            lines: InterruptLines::new(),
            traps: HashMap::new(),
            cycles: 0,
            illegal_opcodes: 0,
        }
    }

    /// A handle onto the interrupt inputs for the chips that drive them.
    #[must_use]
    pub fn interrupt_lines(&self) -> InterruptLines {
        self.lines.clone()
    }

    /// True when the next tick fetches an opcode (or starts an interrupt
    /// sequence) rather than continuing the current instruction.
    #[must_use]
    pub fn at_instruction_boundary(&self) -> bool {
        match self.current.steps.get(self.step) {
            None => true,
            Some(micro) => *micro == MicroOp::ExecuteLast,
        }
    }

    /// Cycles executed since construction.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of unknown opcodes executed as no-ops.
    #[must_use]
    pub fn illegal_opcodes(&self) -> u64 {
        self.illegal_opcodes
    }

    /// Jump to `pc` at an instruction boundary, abandoning the current
    /// instruction.
    pub fn force_pc(&mut self, pc: u16) {
        self.regs.pc = pc;
        self.step = usize::MAX;
    }

    /// Install a trap at `address`, saving the byte it displaces.
    pub fn register_trap(&mut self, bus: &mut impl Bus, address: u16, handler: TrapHandler) {
        let original = match self.traps.remove(&address) {
            Some(existing) => existing.original,
            None => bus.read(address),
        };
        bus.force_write(address, TRAP_OPCODE);
        self.traps.insert(address, Trap { original, handler });
    }

    /// Remove the trap at `address` and restore the displaced byte.
    /// Returns false if no trap was installed there.
    pub fn remove_trap(&mut self, bus: &mut impl Bus, address: u16) -> bool {
        match self.traps.remove(&address) {
            Some(trap) => {
                bus.force_write(address, trap.original);
                true
            }
            None => false,
        }
    }

    /// Addresses with a trap installed.
    pub fn trap_addresses(&self) -> impl Iterator<Item = u16> + '_ {
        self.traps.keys().copied()
    }

    /// The byte a trap displaced, if `address` is trapped.
    #[must_use]
    pub fn trapped_byte(&self, address: u16) -> Option<u8> {
        self.traps.get(&address).map(|t| t.original)
    }

    fn cycle<B: Bus>(&mut self, bus: &mut B) {
        self.cycles += 1;
        match self.current.steps.get(self.step).copied() {
            Some(micro) => {
                self.step += 1;
                self.run_micro_op(micro, bus);
            }
            None => self.next_instruction(bus),
        }
    }

    /// Instruction boundary: service an interrupt or fetch an opcode.
    fn next_instruction<B: Bus>(&mut self, bus: &mut B) {
        let nmi = self.lines.nmi_pending();
        let irq = self.lines.irq() && !self.regs.p.is_set(I);

        if self.delay_interrupt || !(nmi || irq) {
            self.delay_interrupt = false;
            let opcode = bus.read(self.regs.pc);
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.decode(opcode);
            return;
        }

        // The displaced opcode fetch still reads PC.
        let _ = bus.read(self.regs.pc);
        if nmi {
            self.lines.acknowledge_nmi();
            self.current = NMI;
        } else {
            self.current = IRQ;
        }
        self.step = 0;
    }

    fn decode(&mut self, opcode: u8) {
        let address = self.regs.pc.wrapping_sub(1);
        let index = if opcode == TRAP_OPCODE && self.traps.contains_key(&address) {
            TRAP_INDEX
        } else {
            usize::from(opcode)
        };
        self.opcode = opcode;
        self.current = INSTRUCTIONS[index];
        self.step = 0;
    }

    /// BRK and IRQ share $FFFE.
    fn vector(&self) -> u16 {
        if self.current.op == Op::Nmi {
            0xFFFA
        } else {
            0xFFFE
        }
    }

    fn stack_read<B: Bus>(&mut self, bus: &mut B) -> u8 {
        bus.read(self.regs.stack_addr())
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let addr = self.regs.push();
        bus.write(addr, value);
    }

    fn run_micro_op<B: Bus>(&mut self, micro: MicroOp, bus: &mut B) {
        let pc = self.regs.pc;
        match micro {
            MicroOp::ExecuteBranch => {
                self.data = bus.read(pc);
                self.regs.pc = pc.wrapping_add(1);
                if self.branch_taken() {
                    self.delay_interrupt = true;
                } else {
                    self.step += 2;
                }
            }
            MicroOp::BranchDisNext => {
                let _ = bus.read(pc);
                let target = pc.wrapping_add(self.data as i8 as u16);
                if target & 0xFF00 == pc & 0xFF00 {
                    self.regs.pc = target;
                    self.step += 1;
                } else {
                    self.delay_interrupt = false;
                    self.ea = target;
                }
            }
            MicroOp::BranchDisOffset => {
                let _ = bus.read((pc & 0xFF00) | (self.ea & 0x00FF));
                self.regs.pc = self.ea;
            }

            MicroOp::ExecuteDis => {
                let _ = bus.read(pc);
                self.execute(self.current.op, bus);
            }
            MicroOp::ExecuteLast => {
                self.execute(self.current.op, bus);
                self.next_instruction(bus);
            }
            MicroOp::ExecuteMidEa => {
                bus.write(self.ea, self.data);
                self.data = self.modify(self.current.op, self.data);
            }
            MicroOp::ExecuteStoreEa => {
                let value = self.store_value(self.current.op);
                bus.write(self.ea, value);
            }
            MicroOp::ExecuteStoreSp => {
                let value = self.store_value(self.current.op);
                self.push(bus, value);
            }

            MicroOp::FetchAdlPc => {
                self.adl = bus.read(pc);
                self.ea = u16::from(self.adl);
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchAdhPc => {
                let adh = bus.read(pc);
                self.ea = u16::from(self.adl) | (u16::from(adh) << 8);
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchAdlIa => {
                self.adl = bus.read(self.ia);
            }
            MicroOp::FetchAdhIa => {
                let adh = bus.read(wrap_in_page(self.ia));
                self.ea = u16::from(self.adl) | (u16::from(adh) << 8);
            }
            MicroOp::FetchAdlVector => {
                self.adl = bus.read(self.vector());
            }
            MicroOp::FetchAdhVector => {
                let adh = bus.read(self.vector().wrapping_add(1));
                self.ea = u16::from(self.adl) | (u16::from(adh) << 8);
            }
            MicroOp::FetchBalPc => {
                self.base = u16::from(bus.read(pc));
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchBahPc => {
                self.base |= u16::from(bus.read(pc)) << 8;
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchBalIa => {
                self.base = u16::from(bus.read(self.ia));
            }
            MicroOp::FetchBahIa => {
                self.base |= u16::from(bus.read(wrap_in_page(self.ia))) << 8;
            }
            MicroOp::FetchIalPc => {
                self.ia = u16::from(bus.read(pc));
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchIahPc => {
                self.ia |= u16::from(bus.read(pc)) << 8;
                self.regs.pc = pc.wrapping_add(1);
            }

            MicroOp::FetchDataPc => {
                self.data = bus.read(pc);
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchDataEa => {
                self.data = bus.read(self.ea);
            }
            MicroOp::FetchDataSp => {
                self.data = self.stack_read(bus);
            }
            MicroOp::FetchDataBaX | MicroOp::FetchDataBaY => {
                let index = if micro == MicroOp::FetchDataBaX {
                    self.regs.x
                } else {
                    self.regs.y
                };
                self.ea = self.base.wrapping_add(u16::from(index));
                if self.ea & 0xFF00 == self.base & 0xFF00 {
                    self.data = bus.read(self.ea);
                    self.step += 1;
                } else {
                    let _ = bus.read((self.base & 0xFF00) | (self.ea & 0x00FF));
                }
            }

            MicroOp::FetchDisPc => {
                let _ = bus.read(pc);
            }
            MicroOp::FetchDisSp => {
                let _ = self.stack_read(bus);
            }
            MicroOp::FetchDisBalX | MicroOp::FetchDisBalY => {
                let _ = bus.read(self.base);
                let index = if micro == MicroOp::FetchDisBalX {
                    self.regs.x
                } else {
                    self.regs.y
                };
                self.ea = (self.base + u16::from(index)) & 0x00FF;
                self.ia = self.ea;
            }
            MicroOp::FetchDisBaX | MicroOp::FetchDisBaY => {
                let index = if micro == MicroOp::FetchDisBaX {
                    self.regs.x
                } else {
                    self.regs.y
                };
                self.ea = self.base.wrapping_add(u16::from(index));
                let _ = bus.read((self.base & 0xFF00) | (self.ea & 0x00FF));
            }
            MicroOp::FetchIncPc => {
                let _ = bus.read(pc);
                self.regs.pc = pc.wrapping_add(1);
            }
            MicroOp::FetchIncSp => {
                let _ = self.stack_read(bus);
                self.regs.s = self.regs.s.wrapping_add(1);
            }
            MicroOp::FetchPSp => {
                let value = self.stack_read(bus);
                self.regs.p = Status::from_byte(value);
                self.regs.s = self.regs.s.wrapping_add(1);
            }
            MicroOp::FetchPclSp => {
                self.adl = self.stack_read(bus);
                self.regs.s = self.regs.s.wrapping_add(1);
            }
            MicroOp::FetchPchSp => {
                let pch = self.stack_read(bus);
                self.regs.pc = u16::from(self.adl) | (u16::from(pch) << 8);
            }

            MicroOp::StoreDataEa => {
                bus.write(self.ea, self.data);
            }
            MicroOp::StorePSp => {
                let value = self.regs.p.to_pushed(self.current.op == Op::Brk);
                self.push(bus, value);
            }
            MicroOp::StorePchSp => {
                self.push(bus, (pc >> 8) as u8);
            }
            MicroOp::StorePclSp => {
                self.push(bus, pc as u8);
            }
        }
    }

    fn branch_taken(&self) -> bool {
        let p = self.regs.p;
        match self.current.op {
            Op::Bpl => !p.is_set(N),
            Op::Bmi => p.is_set(N),
            Op::Bvc => !p.is_set(V),
            Op::Bvs => p.is_set(V),
            Op::Bcc => !p.is_set(C),
            Op::Bcs => p.is_set(C),
            Op::Bne => !p.is_set(Z),
            Op::Beq => p.is_set(Z),
            _ => false,
        }
    }

    /// Semantic action of read, implied and control-flow instructions.
    fn execute<B: Bus>(&mut self, op: Op, bus: &mut B) {
        let m = self.data;
        let r = &mut self.regs;
        match op {
            Op::Lda => {
                r.a = m;
                r.p.update_nz(m);
            }
            Op::Ldx => {
                r.x = m;
                r.p.update_nz(m);
            }
            Op::Ldy => {
                r.y = m;
                r.p.update_nz(m);
            }
            Op::Lax => {
                r.a = m;
                r.x = m;
                r.p.update_nz(m);
            }
            Op::Ora => {
                r.a |= m;
                r.p.update_nz(r.a);
            }
            Op::And => {
                r.a &= m;
                r.p.update_nz(r.a);
            }
            Op::Eor => {
                r.a ^= m;
                r.p.update_nz(r.a);
            }
            Op::Anc => {
                r.a &= m;
                r.p.update_nz(r.a);
                r.p.set_if(C, r.a & 0x80 != 0);
            }
            Op::Arr => {
                r.a &= m;
                r.a = ror(&mut r.p, r.a);
            }
            Op::Adc => self.adc(m),
            Op::Sbc => self.sbc(m),
            Op::Cmp => compare(&mut r.p, r.a, m),
            Op::Cpx => compare(&mut r.p, r.x, m),
            Op::Cpy => compare(&mut r.p, r.y, m),
            Op::Bit => {
                r.p.set_if(Z, r.a & m == 0);
                r.p.set_if(N, m & 0x80 != 0);
                r.p.set_if(V, m & 0x40 != 0);
            }

            Op::AslA => r.a = asl(&mut r.p, r.a),
            Op::LsrA => r.a = lsr(&mut r.p, r.a),
            Op::RolA => r.a = rol(&mut r.p, r.a),
            Op::RorA => r.a = ror(&mut r.p, r.a),

            Op::Clc => r.p.clear(C),
            Op::Sec => r.p.set(C),
            Op::Cli => r.p.clear(I),
            Op::Sei => r.p.set(I),
            Op::Clv => r.p.clear(V),
            Op::Cld => r.p.clear(D),
            Op::Sed => r.p.set(D),

            Op::Dex => {
                r.x = r.x.wrapping_sub(1);
                r.p.update_nz(r.x);
            }
            Op::Dey => {
                r.y = r.y.wrapping_sub(1);
                r.p.update_nz(r.y);
            }
            Op::Inx => {
                r.x = r.x.wrapping_add(1);
                r.p.update_nz(r.x);
            }
            Op::Iny => {
                r.y = r.y.wrapping_add(1);
                r.p.update_nz(r.y);
            }
            Op::Tax => {
                r.x = r.a;
                r.p.update_nz(r.x);
            }
            Op::Tay => {
                r.y = r.a;
                r.p.update_nz(r.y);
            }
            Op::Txa => {
                r.a = r.x;
                r.p.update_nz(r.a);
            }
            Op::Tya => {
                r.a = r.y;
                r.p.update_nz(r.a);
            }
            Op::Tsx => {
                r.x = r.s;
                r.p.update_nz(r.x);
            }
            Op::Txs => r.s = r.x,

            Op::Pla => {
                r.a = m;
                r.p.update_nz(m);
            }
            Op::Plp => r.p = Status::from_byte(m),

            Op::Jmp | Op::Jsr => r.pc = self.ea,
            Op::Brk | Op::Irq | Op::Nmi => {
                r.pc = self.ea;
                r.p.set(I);
            }

            Op::Trap => self.run_trap(bus),
            Op::Unknown => {
                self.illegal_opcodes += 1;
                log::debug!(
                    "unknown opcode ${:02X} at ${:04X} executed as NOP",
                    self.opcode,
                    self.regs.pc.wrapping_sub(1)
                );
            }

            // Branches, stack pushes, stores and RMW operations act in
            // their own micro-ops.
            _ => {}
        }
    }

    fn run_trap<B: Bus>(&mut self, bus: &mut B) {
        let address = self.regs.pc.wrapping_sub(1);
        let regs = self.regs;
        let Some(trap) = self.traps.get_mut(&address) else {
            // Trap removed after its opcode was fetched.
            self.illegal_opcodes += 1;
            return;
        };
        log::debug!("trap at ${address:04X}");
        match (trap.handler)(bus, &regs) {
            Some(pc) => self.regs.pc = pc,
            None => {
                // This cycle stands in for the displaced opcode's fetch.
                self.opcode = trap.original;
                self.current = INSTRUCTIONS[usize::from(trap.original)];
                self.step = 0;
            }
        }
    }

    /// Read-modify-write operations. Returns the byte to write back.
    fn modify(&mut self, op: Op, m: u8) -> u8 {
        let p = &mut self.regs.p;
        match op {
            Op::Asl => asl(p, m),
            Op::Lsr => lsr(p, m),
            Op::Rol => rol(p, m),
            Op::Ror => ror(p, m),
            Op::Inc => {
                let value = m.wrapping_add(1);
                p.update_nz(value);
                value
            }
            Op::Dec => {
                let value = m.wrapping_sub(1);
                p.update_nz(value);
                value
            }
            Op::Slo => {
                let value = asl(p, m);
                self.regs.a |= value;
                self.regs.p.update_nz(self.regs.a);
                value
            }
            Op::Rra => {
                let value = ror(p, m);
                self.adc(value);
                value
            }
            Op::Isc => {
                let value = m.wrapping_add(1);
                self.sbc(value);
                value
            }
            _ => m,
        }
    }

    fn store_value(&self, op: Op) -> u8 {
        let r = &self.regs;
        match op {
            Op::Sta | Op::Pha => r.a,
            Op::Stx => r.x,
            Op::Sty => r.y,
            Op::Sax => r.a & r.x,
            Op::Php => r.p.to_pushed(true),
            _ => 0,
        }
    }

    fn adc(&mut self, m: u8) {
        let r = &mut self.regs;
        let a = r.a;
        let carry = u8::from(r.p.is_set(C));
        if r.p.is_set(D) {
            // BCD results never set V or N on this part.
            let mut lo = (a & 0x0F) + (m & 0x0F) + carry;
            if lo > 9 {
                lo += 6;
            }
            let mut hi = u16::from(a >> 4) + u16::from(m >> 4) + u16::from(lo > 15);
            if hi > 9 {
                hi += 6;
            }
            r.a = (((hi << 4) as u8) & 0xF0) | (lo & 0x0F);
            r.p.set_if(C, hi > 15);
            r.p.set_if(Z, r.a == 0);
            r.p.clear(V);
            r.p.clear(N);
        } else {
            let sum = u16::from(a) + u16::from(m) + u16::from(carry);
            let result = sum as u8;
            r.p.set_if(C, sum > 0xFF);
            r.p.set_if(V, (a ^ result) & !(a ^ m) & 0x80 != 0);
            r.a = result;
            r.p.update_nz(result);
        }
    }

    fn sbc(&mut self, m: u8) {
        let r = &mut self.regs;
        let a = r.a;
        let borrow = i16::from(!r.p.is_set(C));
        if r.p.is_set(D) {
            let mut lo = i16::from(a & 0x0F) - i16::from(m & 0x0F) - borrow;
            if lo & 0x10 != 0 {
                lo -= 6;
            }
            let mut hi = i16::from(a >> 4) - i16::from(m >> 4) - i16::from(lo & 0x10 != 0);
            if hi & 0x10 != 0 {
                hi -= 6;
            }
            r.a = (((hi << 4) & 0xF0) | (lo & 0x0F)) as u8;
            r.p.set_if(C, (hi & 0xFF) < 15);
            r.p.set_if(Z, r.a == 0);
            r.p.clear(V);
            r.p.clear(N);
        } else {
            let diff = i16::from(a) - i16::from(m) - borrow;
            let result = diff as u8;
            r.p.set_if(C, diff >= 0);
            r.p.set_if(V, (a ^ m) & (a ^ result) & 0x80 != 0);
            r.a = result;
            r.p.update_nz(result);
        }
    }
}

/// Second byte of a pointer; the high byte never carries.
fn wrap_in_page(addr: u16) -> u16 {
    (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF)
}

fn compare(p: &mut Status, register: u8, m: u8) {
    let result = register.wrapping_sub(m);
    p.set_if(C, register >= m);
    p.update_nz(result);
}

fn asl(p: &mut Status, m: u8) -> u8 {
    let value = m << 1;
    p.set_if(C, m & 0x80 != 0);
    p.update_nz(value);
    value
}

fn lsr(p: &mut Status, m: u8) -> u8 {
    let value = m >> 1;
    p.set_if(C, m & 0x01 != 0);
    p.update_nz(value);
    value
}

fn rol(p: &mut Status, m: u8) -> u8 {
    let value = (m << 1) | u8::from(p.is_set(C));
    p.set_if(C, m & 0x80 != 0);
    p.update_nz(value);
    value
}

fn ror(p: &mut Status, m: u8) -> u8 {
    let value = (m >> 1) | if p.is_set(C) { 0x80 } else { 0 };
    p.set_if(C, m & 0x01 != 0);
    p.update_nz(value);
    value
}

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B) {
        self.cycle(bus);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn set_irq(&mut self, level: bool) {
        self.lines.set_irq(level);
    }

    fn nmi(&mut self) {
        self.lines.set_nmi(true);
        self.lines.set_nmi(false);
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) {
        let lo = bus.read(0xFFFC);
        let hi = bus.read(0xFFFD);
        self.regs = Registers::new();
        self.regs.pc = u16::from(lo) | (u16::from(hi) << 8);
        self.delay_interrupt = false;
        self.step = usize::MAX;
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        match path {
            "pc" => Some(r.pc.into()),
            "a" => Some(r.a.into()),
            "x" => Some(r.x.into()),
            "y" => Some(r.y.into()),
            "s" => Some(r.s.into()),
            "p" => Some(r.p.to_byte().into()),
            "flags.c" => Some(r.p.is_set(C).into()),
            "flags.z" => Some(r.p.is_set(Z).into()),
            "flags.i" => Some(r.p.is_set(I).into()),
            "flags.d" => Some(r.p.is_set(D).into()),
            "flags.v" => Some(r.p.is_set(V).into()),
            "flags.n" => Some(r.p.is_set(N).into()),
            "cycles" => Some(self.cycles.into()),
            "illegal_opcodes" => Some(self.illegal_opcodes.into()),
            "irq" => Some(self.lines.irq().into()),
            "nmi" => Some(self.lines.nmi().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "s",
            "p",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.v",
            "flags.n",
            "cycles",
            "illegal_opcodes",
            "irq",
            "nmi",
        ]
    }
}
