//! Static decode table: opcode to micro-op program.
//!
//! Every instruction is an operation plus the ordered list of bus actions
//! that follow its opcode fetch. Each micro-op is exactly one cycle and
//! one bus transaction. Two tags end an instruction:
//!
//! - `ExecuteLast` runs the operation and fetches the next opcode in the
//!   same cycle, overlapping the two instructions as the real chip does.
//! - Running off the end of the list fetches the next opcode on its own.
//!
//! Either way the interrupt lines are sampled only at that boundary.

/// One cycle of bus activity.
///
/// Naming: `Fetch*` reads, `Store*` writes, `*Dis*` is a dummy access
/// whose value is discarded. `Pc`, `Sp`, `Ea` (effective address), `Ia`
/// (indirect pointer) and `Ba` (base address) name where the access
/// goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    /// Read the branch offset and evaluate the condition.
    ExecuteBranch,
    /// Dummy read at PC; commit the target if it stays on this page.
    BranchDisNext,
    /// Dummy read at the unfixed target; commit the target.
    BranchDisOffset,

    /// Dummy read at PC, then run an implied operation.
    ExecuteDis,
    /// Run the operation, then fetch the next opcode.
    ExecuteLast,
    /// Dummy write of the unmodified value, then modify it.
    ExecuteMidEa,
    /// Write the operation's result to the effective address.
    ExecuteStoreEa,
    /// Push the operation's result.
    ExecuteStoreSp,

    /// Operand low byte; also a zero-page effective address.
    FetchAdlPc,
    /// Operand high byte; completes an absolute effective address.
    FetchAdhPc,
    FetchAdlIa,
    FetchAdhIa,
    FetchAdlVector,
    FetchAdhVector,
    FetchBalPc,
    FetchBahPc,
    FetchBalIa,
    FetchBahIa,
    FetchIalPc,
    FetchIahPc,

    FetchDataPc,
    FetchDataEa,
    FetchDataSp,
    /// Base + X; reads directly when no page is crossed, otherwise a
    /// dummy read at the unfixed address.
    FetchDataBaX,
    FetchDataBaY,

    FetchDisPc,
    FetchDisSp,
    /// Dummy read of the zero-page base, then index it within page zero.
    FetchDisBalX,
    FetchDisBalY,
    /// Dummy read at the unfixed indexed address (stores and RMW).
    FetchDisBaX,
    FetchDisBaY,
    FetchIncPc,
    FetchIncSp,
    FetchPSp,
    FetchPclSp,
    FetchPchSp,

    StoreDataEa,
    StorePSp,
    StorePchSp,
    StorePclSp,
}

/// The semantic action of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc,
    And,
    Asl,
    AslA,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    LsrA,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    RolA,
    Ror,
    RorA,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,

    // Undocumented opcodes software is known to use.
    Anc,
    Arr,
    Isc,
    Lax,
    Rra,
    Sax,
    Slo,

    /// Hardware interrupt acknowledge sequences.
    Irq,
    Nmi,
    /// Instrumentation trap.
    Trap,
    /// Any opcode not listed: a two-cycle no-op.
    Unknown,
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub steps: &'static [MicroOp],
}

impl Instruction {
    const fn new(op: Op, steps: &'static [MicroOp]) -> Self {
        Self { op, steps }
    }

    /// Cycles taken when no page is crossed and no branch is taken.
    #[must_use]
    pub fn base_cycles(&self) -> usize {
        let last_overlaps = self.steps.last() == Some(&MicroOp::ExecuteLast);
        let skipped = self
            .steps
            .iter()
            .map(|m| match m {
                MicroOp::FetchDataBaX | MicroOp::FetchDataBaY => 1_usize,
                MicroOp::ExecuteBranch => 2,
                _ => 0,
            })
            .sum::<usize>();
        1 + self.steps.len() - usize::from(last_overlaps) - skipped
    }
}

/// Byte written over an address to plant a trap. $02 halts a real NMOS
/// 6502, so no working program executes it.
pub const TRAP_OPCODE: u8 = 0x02;

/// Table slot of the trap pseudo-opcode.
pub const TRAP_INDEX: usize = 0x100;

use MicroOp::{
    BranchDisNext, BranchDisOffset, ExecuteBranch, ExecuteDis, ExecuteLast, ExecuteMidEa,
    ExecuteStoreEa, ExecuteStoreSp, FetchAdhIa, FetchAdhPc, FetchAdhVector, FetchAdlIa,
    FetchAdlPc, FetchAdlVector, FetchBahIa, FetchBahPc, FetchBalIa, FetchBalPc, FetchDataBaX,
    FetchDataBaY, FetchDataEa, FetchDataPc, FetchDataSp, FetchDisBaX, FetchDisBaY, FetchDisBalX,
    FetchDisBalY, FetchDisPc, FetchDisSp, FetchIahPc, FetchIalPc, FetchIncPc, FetchIncSp,
    FetchPSp, FetchPchSp, FetchPclSp, StoreDataEa, StorePSp, StorePchSp, StorePclSp,
};

const IMPLIED: &[MicroOp] = &[ExecuteDis];
const IMMEDIATE: &[MicroOp] = &[FetchDataPc, ExecuteLast];

const ZP_READ: &[MicroOp] = &[FetchAdlPc, FetchDataEa, ExecuteLast];
const ZP_STORE: &[MicroOp] = &[FetchAdlPc, ExecuteStoreEa];
const ZP_RMW: &[MicroOp] = &[FetchAdlPc, FetchDataEa, ExecuteMidEa, StoreDataEa];

const ZPX_READ: &[MicroOp] = &[FetchBalPc, FetchDisBalX, FetchDataEa, ExecuteLast];
const ZPX_STORE: &[MicroOp] = &[FetchBalPc, FetchDisBalX, ExecuteStoreEa];
const ZPX_RMW: &[MicroOp] = &[FetchBalPc, FetchDisBalX, FetchDataEa, ExecuteMidEa, StoreDataEa];
const ZPY_READ: &[MicroOp] = &[FetchBalPc, FetchDisBalY, FetchDataEa, ExecuteLast];
const ZPY_STORE: &[MicroOp] = &[FetchBalPc, FetchDisBalY, ExecuteStoreEa];

const ABS_READ: &[MicroOp] = &[FetchAdlPc, FetchAdhPc, FetchDataEa, ExecuteLast];
const ABS_STORE: &[MicroOp] = &[FetchAdlPc, FetchAdhPc, ExecuteStoreEa];
const ABS_RMW: &[MicroOp] = &[FetchAdlPc, FetchAdhPc, FetchDataEa, ExecuteMidEa, StoreDataEa];

const ABSX_READ: &[MicroOp] = &[FetchBalPc, FetchBahPc, FetchDataBaX, FetchDataEa, ExecuteLast];
const ABSX_STORE: &[MicroOp] = &[FetchBalPc, FetchBahPc, FetchDisBaX, ExecuteStoreEa];
const ABSX_RMW: &[MicroOp] = &[
    FetchBalPc,
    FetchBahPc,
    FetchDisBaX,
    FetchDataEa,
    ExecuteMidEa,
    StoreDataEa,
];
const ABSY_READ: &[MicroOp] = &[FetchBalPc, FetchBahPc, FetchDataBaY, FetchDataEa, ExecuteLast];
const ABSY_STORE: &[MicroOp] = &[FetchBalPc, FetchBahPc, FetchDisBaY, ExecuteStoreEa];

const INDX_READ: &[MicroOp] = &[
    FetchBalPc,
    FetchDisBalX,
    FetchAdlIa,
    FetchAdhIa,
    FetchDataEa,
    ExecuteLast,
];
const INDX_STORE: &[MicroOp] = &[FetchBalPc, FetchDisBalX, FetchAdlIa, FetchAdhIa, ExecuteStoreEa];
const INDX_RMW: &[MicroOp] = &[
    FetchBalPc,
    FetchDisBalX,
    FetchAdlIa,
    FetchAdhIa,
    FetchDataEa,
    ExecuteMidEa,
    StoreDataEa,
];

const INDY_READ: &[MicroOp] = &[
    FetchIalPc,
    FetchBalIa,
    FetchBahIa,
    FetchDataBaY,
    FetchDataEa,
    ExecuteLast,
];
const INDY_STORE: &[MicroOp] = &[FetchIalPc, FetchBalIa, FetchBahIa, FetchDisBaY, ExecuteStoreEa];
const INDY_RMW: &[MicroOp] = &[
    FetchIalPc,
    FetchBalIa,
    FetchBahIa,
    FetchDisBaY,
    FetchDataEa,
    ExecuteMidEa,
    StoreDataEa,
];

const BRANCH: &[MicroOp] = &[ExecuteBranch, BranchDisNext, BranchDisOffset];
const JMP_ABS: &[MicroOp] = &[FetchAdlPc, FetchAdhPc, ExecuteLast];
const JMP_IND: &[MicroOp] = &[FetchIalPc, FetchIahPc, FetchAdlIa, FetchAdhIa, ExecuteLast];
const JSR: &[MicroOp] = &[
    FetchAdlPc,
    FetchDisSp,
    StorePchSp,
    StorePclSp,
    FetchAdhPc,
    ExecuteLast,
];
const RTS: &[MicroOp] = &[FetchDisPc, FetchIncSp, FetchPclSp, FetchPchSp, FetchIncPc];
const RTI: &[MicroOp] = &[FetchDisPc, FetchIncSp, FetchPSp, FetchPclSp, FetchPchSp];
const PUSH: &[MicroOp] = &[FetchDisPc, ExecuteStoreSp];
const PULL: &[MicroOp] = &[FetchDisPc, FetchIncSp, FetchDataSp, ExecuteLast];
const BRK: &[MicroOp] = &[
    FetchIncPc,
    StorePchSp,
    StorePclSp,
    StorePSp,
    FetchAdlVector,
    FetchAdhVector,
    ExecuteLast,
];

/// Follows the cycle in which the interrupt displaced an opcode fetch.
const INTERRUPT: &[MicroOp] = &[
    FetchDisPc,
    StorePchSp,
    StorePclSp,
    StorePSp,
    FetchAdlVector,
    FetchAdhVector,
    ExecuteLast,
];

pub const IRQ: Instruction = Instruction::new(Op::Irq, INTERRUPT);
pub const NMI: Instruction = Instruction::new(Op::Nmi, INTERRUPT);

const UNKNOWN: Instruction = Instruction::new(Op::Unknown, IMPLIED);

/// Opcodes 0-255 followed by the trap pseudo-opcode.
pub static INSTRUCTIONS: [Instruction; 257] = build_table();

const fn build_table() -> [Instruction; 257] {
    let mut table = [UNKNOWN; 257];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = decode(opcode as u8);
        opcode += 1;
    }
    table[TRAP_INDEX] = Instruction::new(Op::Trap, IMPLIED);
    table
}

const fn decode(opcode: u8) -> Instruction {
    use Op::{
        Adc, Anc, And, Arr, Asl, AslA, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
        Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Isc, Jmp, Jsr, Lax, Lda,
        Ldx, Ldy, Lsr, LsrA, Nop, Ora, Pha, Php, Pla, Plp, Rol, RolA, Ror, RorA, Rra, Rti, Rts,
        Sax, Sbc, Sec, Sed, Sei, Slo, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    };
    const fn i(op: Op, steps: &'static [MicroOp]) -> Instruction {
        Instruction::new(op, steps)
    }

    match opcode {
        0x00 => i(Brk, BRK),
        0x01 => i(Ora, INDX_READ),
        0x03 => i(Slo, INDX_RMW),
        0x04 => i(Nop, ZP_READ),
        0x05 => i(Ora, ZP_READ),
        0x06 => i(Asl, ZP_RMW),
        0x07 => i(Slo, ZP_RMW),
        0x08 => i(Php, PUSH),
        0x09 => i(Ora, IMMEDIATE),
        0x0A => i(AslA, IMPLIED),
        0x0B => i(Anc, IMMEDIATE),
        0x0C => i(Nop, ABS_READ),
        0x0D => i(Ora, ABS_READ),
        0x0E => i(Asl, ABS_RMW),
        0x0F => i(Slo, ABS_RMW),

        0x10 => i(Bpl, BRANCH),
        0x11 => i(Ora, INDY_READ),
        0x15 => i(Ora, ZPX_READ),
        0x16 => i(Asl, ZPX_RMW),
        0x18 => i(Clc, IMPLIED),
        0x19 => i(Ora, ABSY_READ),
        0x1D => i(Ora, ABSX_READ),
        0x1E => i(Asl, ABSX_RMW),

        0x20 => i(Jsr, JSR),
        0x21 => i(And, INDX_READ),
        0x24 => i(Bit, ZP_READ),
        0x25 => i(And, ZP_READ),
        0x26 => i(Rol, ZP_RMW),
        0x28 => i(Plp, PULL),
        0x29 => i(And, IMMEDIATE),
        0x2A => i(RolA, IMPLIED),
        0x2C => i(Bit, ABS_READ),
        0x2D => i(And, ABS_READ),
        0x2E => i(Rol, ABS_RMW),

        0x30 => i(Bmi, BRANCH),
        0x31 => i(And, INDY_READ),
        0x35 => i(And, ZPX_READ),
        0x36 => i(Rol, ZPX_RMW),
        0x38 => i(Sec, IMPLIED),
        0x39 => i(And, ABSY_READ),
        0x3D => i(And, ABSX_READ),
        0x3E => i(Rol, ABSX_RMW),

        0x40 => i(Rti, RTI),
        0x41 => i(Eor, INDX_READ),
        0x45 => i(Eor, ZP_READ),
        0x46 => i(Lsr, ZP_RMW),
        0x48 => i(Pha, PUSH),
        0x49 => i(Eor, IMMEDIATE),
        0x4A => i(LsrA, IMPLIED),
        0x4C => i(Jmp, JMP_ABS),
        0x4D => i(Eor, ABS_READ),
        0x4E => i(Lsr, ABS_RMW),

        0x50 => i(Bvc, BRANCH),
        0x51 => i(Eor, INDY_READ),
        0x55 => i(Eor, ZPX_READ),
        0x56 => i(Lsr, ZPX_RMW),
        0x58 => i(Cli, IMPLIED),
        0x59 => i(Eor, ABSY_READ),
        0x5D => i(Eor, ABSX_READ),
        0x5E => i(Lsr, ABSX_RMW),

        0x60 => i(Rts, RTS),
        0x61 => i(Adc, INDX_READ),
        0x64 => i(Nop, ZP_READ),
        0x65 => i(Adc, ZP_READ),
        0x66 => i(Ror, ZP_RMW),
        0x68 => i(Pla, PULL),
        0x69 => i(Adc, IMMEDIATE),
        0x6A => i(RorA, IMPLIED),
        0x6B => i(Arr, IMMEDIATE),
        0x6C => i(Jmp, JMP_IND),
        0x6D => i(Adc, ABS_READ),
        0x6E => i(Ror, ABS_RMW),
        0x6F => i(Rra, ABS_RMW),

        0x70 => i(Bvs, BRANCH),
        0x71 => i(Adc, INDY_READ),
        0x73 => i(Rra, INDY_RMW),
        0x74 => i(Nop, ZPX_READ),
        0x75 => i(Adc, ZPX_READ),
        0x76 => i(Ror, ZPX_RMW),
        0x78 => i(Sei, IMPLIED),
        0x79 => i(Adc, ABSY_READ),
        0x7D => i(Adc, ABSX_READ),
        0x7E => i(Ror, ABSX_RMW),

        0x81 => i(Sta, INDX_STORE),
        0x84 => i(Sty, ZP_STORE),
        0x85 => i(Sta, ZP_STORE),
        0x86 => i(Stx, ZP_STORE),
        0x88 => i(Dey, IMPLIED),
        0x8A => i(Txa, IMPLIED),
        0x8C => i(Sty, ABS_STORE),
        0x8D => i(Sta, ABS_STORE),
        0x8E => i(Stx, ABS_STORE),
        0x8F => i(Sax, ABS_STORE),

        0x90 => i(Bcc, BRANCH),
        0x91 => i(Sta, INDY_STORE),
        0x94 => i(Sty, ZPX_STORE),
        0x95 => i(Sta, ZPX_STORE),
        0x96 => i(Stx, ZPY_STORE),
        0x98 => i(Tya, IMPLIED),
        0x99 => i(Sta, ABSY_STORE),
        0x9A => i(Txs, IMPLIED),
        0x9D => i(Sta, ABSX_STORE),

        0xA0 => i(Ldy, IMMEDIATE),
        0xA1 => i(Lda, INDX_READ),
        0xA2 => i(Ldx, IMMEDIATE),
        0xA4 => i(Ldy, ZP_READ),
        0xA5 => i(Lda, ZP_READ),
        0xA6 => i(Ldx, ZP_READ),
        0xA8 => i(Tay, IMPLIED),
        0xA9 => i(Lda, IMMEDIATE),
        0xAA => i(Tax, IMPLIED),
        0xAC => i(Ldy, ABS_READ),
        0xAD => i(Lda, ABS_READ),
        0xAE => i(Ldx, ABS_READ),

        0xB0 => i(Bcs, BRANCH),
        0xB1 => i(Lda, INDY_READ),
        0xB4 => i(Ldy, ZPX_READ),
        0xB5 => i(Lda, ZPX_READ),
        0xB6 => i(Ldx, ZPY_READ),
        0xB7 => i(Lax, ZPY_READ),
        0xB8 => i(Clv, IMPLIED),
        0xB9 => i(Lda, ABSY_READ),
        0xBA => i(Tsx, IMPLIED),
        0xBC => i(Ldy, ABSX_READ),
        0xBD => i(Lda, ABSX_READ),
        0xBE => i(Ldx, ABSY_READ),

        0xC0 => i(Cpy, IMMEDIATE),
        0xC1 => i(Cmp, INDX_READ),
        0xC4 => i(Cpy, ZP_READ),
        0xC5 => i(Cmp, ZP_READ),
        0xC6 => i(Dec, ZP_RMW),
        0xC8 => i(Iny, IMPLIED),
        0xC9 => i(Cmp, IMMEDIATE),
        0xCA => i(Dex, IMPLIED),
        0xCC => i(Cpy, ABS_READ),
        0xCD => i(Cmp, ABS_READ),
        0xCE => i(Dec, ABS_RMW),

        0xD0 => i(Bne, BRANCH),
        0xD1 => i(Cmp, INDY_READ),
        0xD5 => i(Cmp, ZPX_READ),
        0xD6 => i(Dec, ZPX_RMW),
        0xD8 => i(Cld, IMPLIED),
        0xD9 => i(Cmp, ABSY_READ),
        0xDD => i(Cmp, ABSX_READ),
        0xDE => i(Dec, ABSX_RMW),

        0xE0 => i(Cpx, IMMEDIATE),
        0xE1 => i(Sbc, INDX_READ),
        0xE4 => i(Cpx, ZP_READ),
        0xE5 => i(Sbc, ZP_READ),
        0xE6 => i(Inc, ZP_RMW),
        0xE8 => i(Inx, IMPLIED),
        0xE9 => i(Sbc, IMMEDIATE),
        0xEA => i(Nop, IMPLIED),
        0xEC => i(Cpx, ABS_READ),
        0xED => i(Sbc, ABS_READ),
        0xEE => i(Inc, ABS_RMW),

        0xF0 => i(Beq, BRANCH),
        0xF1 => i(Sbc, INDY_READ),
        0xF5 => i(Sbc, ZPX_READ),
        0xF6 => i(Inc, ZPX_RMW),
        0xF7 => i(Isc, ZPX_RMW),
        0xF8 => i(Sed, IMPLIED),
        0xF9 => i(Sbc, ABSY_READ),
        0xFD => i(Sbc, ABSX_READ),
        0xFE => i(Inc, ABSX_RMW),

        _ => UNKNOWN,
    }
}
