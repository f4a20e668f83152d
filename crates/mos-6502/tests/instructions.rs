//! Instruction behaviour and cycle timing for the 6502 stepper.

use emu_core::{Bus, Cpu, SimpleBus};
use mos_6502::{Mos6502, TRAP_OPCODE, flags};

/// Run one instruction from its opcode fetch up to the next boundary.
///
/// The first tick also completes the previous instruction when that one
/// overlaps its last cycle with this fetch. Returns the cycles taken.
fn run_instruction(cpu: &mut Mos6502, bus: &mut impl Bus) -> u32 {
    cpu.tick(bus);
    let mut cycles = 1;
    while !cpu.at_instruction_boundary() {
        cpu.tick(bus);
        cycles += 1;
        assert!(cycles < 20, "instruction did not complete within 20 cycles");
    }
    cycles
}

/// Run `count` instructions, then one more tick so the last one's
/// overlapped action lands in the registers.
fn run_program(cpu: &mut Mos6502, bus: &mut impl Bus, count: usize) {
    for _ in 0..count {
        run_instruction(cpu, bus);
    }
    cpu.tick(bus);
}

/// Load a program at $0200 and set PC there.
fn setup_program(bus: &mut SimpleBus, cpu: &mut Mos6502, program: &[u8]) {
    bus.load(0x0200, program);
    cpu.force_pc(0x0200);
}

/// Records every write so dummy accesses can be checked.
struct RecordingBus {
    inner: SimpleBus,
    writes: Vec<(u16, u8)>,
}

impl Bus for RecordingBus {
    fn read(&mut self, address: u16) -> u8 {
        self.inner.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.writes.push((address, value));
        self.inner.write(address, value);
    }
}

#[test]
fn test_reset_from_zero_image() {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFC, &[0x00, 0xE0]);
    let mut cpu = Mos6502::new();
    cpu.reset(&mut bus);

    assert_eq!(cpu.pc(), 0xE000, "PC should come from the reset vector");
    assert_eq!(cpu.regs.s, 0xFF, "SP should be $FF after reset");
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(cpu.regs.x, 0);
    assert_eq!(cpu.regs.y, 0);
}

#[test]
fn test_immediate_load_is_two_cycles() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x80, 0xEA]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 2, "LDA # takes 2 cycles");
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2, "NOP takes 2 cycles");
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.p.is_set(flags::N), "LDA #$80 sets N");
    assert!(!cpu.regs.p.is_set(flags::Z));
}

#[test]
fn test_stack_pha_pla() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA9, 0x42, // LDA #$42
        0x48, // PHA
        0xA9, 0x00, // LDA #$00
        0x68, // PLA
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "PHA takes 3 cycles");
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4, "PLA takes 4 cycles");
    cpu.tick(&mut bus);

    assert_eq!(cpu.regs.a, 0x42, "PLA should restore A");
    assert_eq!(cpu.regs.s, 0xFF, "SP should be back to $FF after PLA");
    assert_eq!(bus.peek(0x01FF), 0x42);
}

#[test]
fn test_stack_php_plp() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0x38, // SEC
        0x08, // PHP
        0x18, // CLC
        0x28, // PLP
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 4);

    assert_eq!(bus.peek(0x01FF), 0x31, "PHP pushes B and U set");
    assert!(cpu.regs.p.is_set(flags::C), "PLP should restore carry flag");
    assert!(!cpu.regs.p.is_set(flags::B), "B never lives in P");
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_brk_stack_layout() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.load(0xFFFE, &[0x00, 0x03]);

    let program = [
        0x00, // BRK         @ $0200
        0xEA, // padding     @ $0201 (skipped)
    ];
    setup_program(&mut bus, &mut cpu, &program);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 7, "BRK takes 7 cycles");
    cpu.tick(&mut bus);

    // One tick past the sequence: the handler's first opcode was fetched.
    assert_eq!(cpu.pc(), 0x0301, "PC should be past the BRK vector target");
    assert_eq!(cpu.regs.s, 0xFC, "three pushes from $FF");
    assert!(cpu.regs.p.is_set(flags::I), "I flag should be set after BRK");
    assert_eq!(bus.peek(0x01FF), 0x02, "pushed PCH");
    assert_eq!(bus.peek(0x01FE), 0x02, "pushed PCL skips the padding byte");
    assert_eq!(bus.peek(0x01FD), 0x30, "pushed P has B and U set");
}

#[test]
fn test_jsr_rts_round_trip() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.load(0x0220, &[0xA9, 0x07, 0x60]); // LDA #$07; RTS
    let program = [
        0x20, 0x20, 0x02, // JSR $0220
        0xE8, // INX
    ];
    setup_program(&mut bus, &mut cpu, &program);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 6, "JSR takes 6 cycles");
    assert_eq!(bus.peek(0x01FF), 0x02, "return address high");
    assert_eq!(bus.peek(0x01FE), 0x02, "return address is JSR + 2");
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6, "RTS takes 6 cycles");
    run_program(&mut cpu, &mut bus, 1);

    assert_eq!(cpu.regs.a, 0x07);
    assert_eq!(cpu.regs.x, 1, "execution resumed after the JSR");
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_rti_restores_status_and_pc() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    // Stack image as left by an IRQ at $1234 with C set.
    bus.load(0x01FD, &[0x21, 0x34, 0x12]);
    cpu.regs.s = 0xFC;
    setup_program(&mut bus, &mut cpu, &[0x40]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 6, "RTI takes 6 cycles");
    assert_eq!(cpu.pc(), 0x1234);
    assert!(cpu.regs.p.is_set(flags::C));
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_absolute_x_page_cross_costs_one_cycle() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x1100, 0x42);
    bus.write(0x1081, 0x24);

    let program = [
        0xA2, 0x01, // LDX #$01
        0xBD, 0xFF, 0x10, // LDA $10FF,X (crosses into $1100)
        0xBD, 0x80, 0x10, // LDA $1080,X (same page)
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 5, "page cross adds a cycle");
    cpu.tick(&mut bus);
    assert_eq!(cpu.regs.a, 0x42, "LDA should have loaded from $1100");
    while !cpu.at_instruction_boundary() {
        cpu.tick(&mut bus);
    }
    cpu.tick(&mut bus);
    assert_eq!(cpu.regs.a, 0x24);
}

#[test]
fn test_same_page_indexed_read_is_four_cycles() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA0, 0x01, 0xB9, 0x00, 0x10]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4, "LDA abs,Y without cross");
}

#[test]
fn test_indexed_store_always_takes_fixup_cycle() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x5A, 0x9D, 0x00, 0x10]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 5, "STA abs,X is always 5");
    assert_eq!(bus.peek(0x1000), 0x5A);
}

#[test]
fn test_indirect_y_store_and_load() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.load(0x0080, &[0xF0, 0x12]); // pointer $12F0

    let program = [
        0xA0, 0x20, // LDY #$20
        0xA9, 0x99, // LDA #$99
        0x91, 0x80, // STA ($80),Y -> $1310
        0xA9, 0x00, // LDA #$00
        0xB1, 0x80, // LDA ($80),Y (page cross)
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6, "STA (zp),Y is 6");
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6, "LDA (zp),Y crossing is 6");
    cpu.tick(&mut bus);

    assert_eq!(bus.peek(0x1310), 0x99);
    assert_eq!(cpu.regs.a, 0x99);
}

#[test]
fn test_indexed_indirect_pointer_wraps_in_zero_page() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x00FF, 0x00);
    bus.write(0x0000, 0x30); // high byte wraps to $00
    bus.write(0x3000, 0x77);

    let program = [
        0xA2, 0x0F, // LDX #$0F
        0xA1, 0xF0, // LDA ($F0,X) -> pointer at $FF/$00
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    cpu.tick(&mut bus);

    assert_eq!(cpu.regs.a, 0x77);
}

#[test]
fn test_zero_page_x_wraps() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x007F, 0x11);

    let program = [
        0xA2, 0xFF, // LDX #$FF
        0xB5, 0x80, // LDA $80,X -> $7F, not $17F
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.regs.a, 0x11);
}

#[test]
fn test_jmp_indirect_page_wrap_bug() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x10FF, 0x34);
    bus.write(0x1000, 0x12); // high byte comes from $1000, not $1100
    bus.write(0x1100, 0x56);

    setup_program(&mut bus, &mut cpu, &[0x6C, 0xFF, 0x10]);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 5, "JMP (ind) takes 5 cycles");
    cpu.tick(&mut bus);

    assert_eq!(cpu.pc(), 0x1235, "jumped to $1234 and fetched its opcode");
}

#[test]
fn test_rmw_performs_dummy_write() {
    let mut bus = RecordingBus {
        inner: SimpleBus::new(),
        writes: Vec::new(),
    };
    bus.inner.write(0x1234, 0x41);
    bus.inner.load(0x0200, &[0xEE, 0x34, 0x12]); // INC $1234
    let mut cpu = Mos6502::new();
    cpu.force_pc(0x0200);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 6, "INC abs takes 6 cycles");
    assert_eq!(
        bus.writes,
        vec![(0x1234, 0x41), (0x1234, 0x42)],
        "unmodified value is written back before the result"
    );
}

#[test]
fn test_adc_binary_overflow() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0x18, // CLC
        0xA9, 0x7F, // LDA #$7F
        0x69, 0x01, // ADC #$01
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.p.is_set(flags::V), "positive + positive = negative");
    assert!(cpu.regs.p.is_set(flags::N));
    assert!(!cpu.regs.p.is_set(flags::C));
}

#[test]
fn test_sbc_binary_borrow() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0x38, // SEC
        0xA9, 0x00, // LDA #$00
        0xE9, 0x01, // SBC #$01
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.regs.a, 0xFF);
    assert!(!cpu.regs.p.is_set(flags::C), "borrow clears carry");
    assert!(!cpu.regs.p.is_set(flags::V));
}

#[test]
fn test_adc_decimal() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0xF8, // SED
        0x18, // CLC
        0xA9, 0x19, // LDA #$19
        0x69, 0x01, // ADC #$01
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 4);

    assert_eq!(cpu.regs.a, 0x20, "19 + 1 = 20 in BCD");
    assert!(!cpu.regs.p.is_set(flags::C));
}

#[test]
fn test_adc_decimal_carry_never_sets_v_or_n() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0xF8, // SED
        0x18, // CLC
        0xA9, 0x99, // LDA #$99
        0x69, 0x01, // ADC #$01
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 4);

    assert_eq!(cpu.regs.a, 0x00, "99 + 1 wraps to 00");
    assert!(cpu.regs.p.is_set(flags::C));
    assert!(cpu.regs.p.is_set(flags::Z));
    assert!(!cpu.regs.p.is_set(flags::V));
    assert!(!cpu.regs.p.is_set(flags::N));
}

#[test]
fn test_sbc_decimal() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0xF8, // SED
        0x38, // SEC
        0xA9, 0x50, // LDA #$50
        0xE9, 0x01, // SBC #$01
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 4);

    assert_eq!(cpu.regs.a, 0x49, "50 - 1 = 49 in BCD");
    assert!(cpu.regs.p.is_set(flags::C), "no borrow");
}

#[test]
fn test_sbc_decimal_borrow() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0xF8, // SED
        0x38, // SEC
        0xA9, 0x00, // LDA #$00
        0xE9, 0x01, // SBC #$01
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 4);

    assert_eq!(cpu.regs.a, 0x99, "00 - 1 = 99 with borrow");
    assert!(!cpu.regs.p.is_set(flags::C));
    assert!(!cpu.regs.p.is_set(flags::N), "BCD never sets N");
}

#[test]
fn test_compare_sets_carry_and_zero() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x40, 0xC9, 0x40]);
    run_program(&mut cpu, &mut bus, 2);

    assert!(cpu.regs.p.is_set(flags::C));
    assert!(cpu.regs.p.is_set(flags::Z));
}

#[test]
fn test_bit_copies_operand_bits() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x0010, 0xC0);
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x01, 0x24, 0x10]);
    run_program(&mut cpu, &mut bus, 2);

    assert!(cpu.regs.p.is_set(flags::N));
    assert!(cpu.regs.p.is_set(flags::V));
    assert!(cpu.regs.p.is_set(flags::Z), "A & M == 0");
}

#[test]
fn test_branch_cycle_counts() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    // Not taken: 2 cycles.
    setup_program(&mut bus, &mut cpu, &[0xA2, 0x00, 0xD0, 0x10]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2, "BNE not taken");

    // Taken, same page: 3 cycles.
    setup_program(&mut bus, &mut cpu, &[0xA2, 0x01, 0xD0, 0x10]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "BNE taken");
    assert_eq!(cpu.pc(), 0x0214);

    // Taken, crossing into the next page: 4 cycles.
    bus.load(0x02F0, &[0xA2, 0x01, 0xD0, 0x10]);
    cpu.force_pc(0x02F0);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4, "BNE taken across page");
    assert_eq!(cpu.pc(), 0x0304);
}

#[test]
fn test_backward_branch() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0xA2, 0x03, // LDX #$03
        0xCA, // DEX          @ $0202
        0xD0, 0xFD, // BNE $0202
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 7);

    assert_eq!(cpu.regs.x, 0);
    assert_eq!(cpu.pc(), 0x0206, "fell through after the loop");
}

/// Branch at `branch_at` to `target`, with IRQ raised while it executes.
/// Returns the X register and the pushed return address once the IRQ
/// has been taken.
fn branch_then_irq(branch_at: u16, offset: u8) -> (u8, u16) {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.load(0xFFFE, &[0x00, 0x40]);
    bus.load(branch_at - 2, &[0xA2, 0x01, 0xD0, offset]); // LDX #1; BNE
    let target = branch_at.wrapping_add(2).wrapping_add(u16::from(offset));
    bus.load(target, &[0xE8, 0xE8, 0xE8]); // INX x3
    cpu.force_pc(branch_at - 2);
    let lines = cpu.interrupt_lines();

    run_instruction(&mut cpu, &mut bus);
    cpu.tick(&mut bus); // fetch BNE
    lines.set_irq(true);
    while !cpu.at_instruction_boundary() {
        cpu.tick(&mut bus);
    }

    // Run until the interrupt sequence has pushed everything.
    while cpu.regs.s != 0xFC {
        cpu.tick(&mut bus);
    }
    let pushed = u16::from(bus.peek(0x01FE)) | (u16::from(bus.peek(0x01FF)) << 8);
    (cpu.regs.x, pushed)
}

#[test]
fn test_taken_branch_same_page_delays_irq_one_instruction() {
    let (x, pushed) = branch_then_irq(0x0202, 0x00);
    assert_eq!(x, 2, "one INX ran before the interrupt");
    assert_eq!(pushed, 0x0205, "IRQ taken after the first INX");
}

#[test]
fn test_taken_branch_across_page_does_not_delay_irq() {
    let (x, pushed) = branch_then_irq(0x02FD, 0x01);
    assert_eq!(x, 1, "no INX ran before the interrupt");
    assert_eq!(pushed, 0x0300, "IRQ taken at the branch target");
}

#[test]
fn test_irq_sequence_timing_and_vector() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.load(0xFFFE, &[0x00, 0x40]);
    setup_program(&mut bus, &mut cpu, &[0xEA, 0xEA]);
    run_instruction(&mut cpu, &mut bus);
    cpu.set_irq(true);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 7, "IRQ takes 7 cycles");
    cpu.tick(&mut bus);
    assert_eq!(cpu.pc(), 0x4001);
    assert_eq!(bus.peek(0x01FD) & 0x10, 0, "IRQ pushes P with B clear");
    assert!(cpu.regs.p.is_set(flags::I));
}

#[test]
fn test_irq_masked_by_interrupt_disable() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.load(0xFFFE, &[0x00, 0x40]);
    setup_program(&mut bus, &mut cpu, &[0x78, 0xE8, 0xE8]); // SEI; INX; INX
    run_instruction(&mut cpu, &mut bus);
    cpu.set_irq(true);
    run_program(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.regs.x, 2, "IRQ ignored while I is set");
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_irq_is_level_triggered() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    // Handler: INX; CLI; RTI. The line is still held, so it re-enters.
    bus.load(0xFFFE, &[0x00, 0x40]);
    bus.load(0x4000, &[0xE8, 0x58, 0x40]);
    setup_program(&mut bus, &mut cpu, &[0xEA, 0xEA]);
    run_instruction(&mut cpu, &mut bus);
    cpu.set_irq(true);

    for _ in 0..60 {
        cpu.tick(&mut bus);
    }
    assert!(cpu.regs.x > 1, "held IRQ re-enters the handler");
}

#[test]
fn test_nmi_is_edge_triggered() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.load(0xFFFA, &[0x00, 0x50]);
    bus.load(0x5000, &[0xE8, 0x40]); // INX; RTI
    setup_program(&mut bus, &mut cpu, &[0xEA; 32]);
    let lines = cpu.interrupt_lines();
    run_instruction(&mut cpu, &mut bus);

    lines.set_nmi(true); // held high from here on
    for _ in 0..60 {
        cpu.tick(&mut bus);
    }
    assert_eq!(cpu.regs.x, 1, "NMI serviced exactly once per edge");
    assert!(!lines.nmi_pending());
    assert_eq!(bus.peek(0x01FD) & 0x10, 0, "NMI pushes P with B clear");
}

#[test]
fn test_unknown_opcode_is_two_cycle_nop() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0x02, 0xA9, 0x01]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.pc(), 0x0201, "unknown opcode consumes one byte");
    run_program(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0x01);
    assert_eq!(cpu.illegal_opcodes(), 1);
}

#[test]
fn test_illegal_slo_zeropage() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x0010, 0x81);
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x02, 0x07, 0x10]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 5, "SLO zp takes 5 cycles");
    cpu.tick(&mut bus);

    assert_eq!(bus.peek(0x0010), 0x02, "memory shifted left");
    assert_eq!(cpu.regs.a, 0x02, "A |= shifted value");
    assert!(cpu.regs.p.is_set(flags::C), "bit 7 shifted into carry");
}

#[test]
fn test_illegal_anc_immediate() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0xF0, 0x0B, 0x80]);
    run_program(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.p.is_set(flags::C), "carry mirrors N");
    assert!(cpu.regs.p.is_set(flags::N));
}

#[test]
fn test_illegal_sax_absolute() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0xA9, 0xF0, // LDA #$F0
        0xA2, 0x3C, // LDX #$3C
        0x8F, 0x00, 0x30, // SAX $3000
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);

    assert_eq!(bus.peek(0x3000), 0x30);
}

#[test]
fn test_illegal_lax_zeropage_y() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x0015, 0x9C);
    setup_program(&mut bus, &mut cpu, &[0xA0, 0x05, 0xB7, 0x10]);
    run_program(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.regs.a, 0x9C);
    assert_eq!(cpu.regs.x, 0x9C);
}

#[test]
fn test_illegal_isc_zeropage_x() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x0012, 0x04);
    let program = [
        0x38, // SEC
        0xA9, 0x10, // LDA #$10
        0xA2, 0x02, // LDX #$02
        0xF7, 0x10, // ISC $10,X
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_program(&mut cpu, &mut bus, 4);

    assert_eq!(bus.peek(0x0012), 0x05, "memory incremented");
    assert_eq!(cpu.regs.a, 0x0B, "$10 - $05");
    assert!(cpu.regs.p.is_set(flags::C));
}

#[test]
fn test_illegal_rra_absolute() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    bus.write(0x3000, 0x03);
    let program = [
        0x18, // CLC
        0xA9, 0x10, // LDA #$10
        0x6F, 0x00, 0x30, // RRA $3000
    ];
    setup_program(&mut bus, &mut cpu, &program);
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    cpu.tick(&mut bus);

    assert_eq!(bus.peek(0x3000), 0x01, "memory rotated right");
    // ROR moved bit 0 into carry, ADC then adds it: $10 + $01 + 1.
    assert_eq!(cpu.regs.a, 0x12);
}

#[test]
fn test_illegal_nops_consume_operands() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    let program = [
        0x04, 0x10, // NOP zp
        0x0C, 0x00, 0x30, // NOP abs
        0x74, 0x10, // NOP zp,X
        0xE8, // INX
    ];
    setup_program(&mut bus, &mut cpu, &program);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 3);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    run_program(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.x, 1);
    assert_eq!(cpu.illegal_opcodes(), 0, "documented illegal NOPs are not unknown");
}

#[test]
fn test_trap_redirects_pc() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xEA, 0xA9, 0x42, 0xEA]);
    bus.load(0x0300, &[0xA2, 0x07]); // LDX #$07

    cpu.register_trap(
        &mut bus,
        0x0201,
        Box::new(|bus, regs| {
            bus.write(0x0400, regs.a.wrapping_add(1));
            Some(0x0300)
        }),
    );
    assert_eq!(bus.peek(0x0201), TRAP_OPCODE);
    assert_eq!(cpu.trapped_byte(0x0201), Some(0xA9));

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2, "trap costs two cycles");
    run_program(&mut cpu, &mut bus, 1);

    assert_eq!(bus.peek(0x0400), 0x01, "handler wrote through the bus");
    assert_eq!(cpu.regs.x, 0x07, "execution resumed at the handler's PC");
    assert_eq!(cpu.regs.a, 0x00, "displaced LDA never ran");
}

#[test]
fn test_trap_falls_through_to_displaced_instruction() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x42, 0xE8]);

    cpu.register_trap(&mut bus, 0x0200, Box::new(|_, _| None));
    run_program(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.regs.a, 0x42, "displaced LDA ran after the trap");
    assert_eq!(cpu.regs.x, 0x01);
}

#[test]
fn test_remove_trap_restores_byte() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x42]);

    cpu.register_trap(&mut bus, 0x0200, Box::new(|_, _| Some(0x0200)));
    assert!(cpu.remove_trap(&mut bus, 0x0200));
    assert!(!cpu.remove_trap(&mut bus, 0x0200), "second removal is a no-op");
    assert_eq!(bus.peek(0x0200), 0xA9);

    run_program(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0x42);
}

#[test]
fn test_trap_opcode_without_trap_is_unknown() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[TRAP_OPCODE, 0xE8]);
    run_program(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.regs.x, 1);
    assert_eq!(cpu.illegal_opcodes(), 1);
}
