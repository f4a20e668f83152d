//! Whole-machine tests: small hand-assembled KERNALs exercise the CPU, VIC
//! and VIAs together. The ROM boot tests need real ROM images and are
//! ignored by default.

use std::fs;
use std::path::Path;

use emu_core::{Observable, Value};
use emu_vic20::{
    MachineType, ProgramKind, RamExpansion, Vic20, Vic20Config, program::detect_ram,
};
use mos_vic_6561::PALETTE;

/// Set the KERNAL's default PAL screen, colour cell 0 red, then spin.
const DRAW_SCREEN: &[u8] = &[
    0xA9, 0x0C, 0x8D, 0x00, 0x90, // LDA #$0C; STA $9000
    0xA9, 0x26, 0x8D, 0x01, 0x90, // LDA #$26; STA $9001
    0xA9, 0x96, 0x8D, 0x02, 0x90, // LDA #$96; STA $9002
    0xA9, 0x2E, 0x8D, 0x03, 0x90, // LDA #$2E; STA $9003
    0xA9, 0xF0, 0x8D, 0x05, 0x90, // LDA #$F0; STA $9005
    0xA9, 0x1B, 0x8D, 0x0F, 0x90, // LDA #$1B; STA $900F
    0xA9, 0x02, 0x8D, 0x00, 0x96, // LDA #$02; STA $9600
    0x4C, 0x23, 0xE0, // JMP $E023
];

/// Free-running VIA2 timer 1 on IRQ, VIA1 CA1 (RESTORE) on NMI.
const INTERRUPTS: &[u8] = &[
    0x78, // SEI
    0xA9, 0x40, 0x8D, 0x2B, 0x91, // VIA2 ACR: T1 free-run
    0xA9, 0xC0, 0x8D, 0x2E, 0x91, // VIA2 IER: T1
    0xA9, 0x82, 0x8D, 0x1E, 0x91, // VIA1 IER: CA1
    0xA9, 0x00, 0x8D, 0x24, 0x91, // T1 latch low
    0xA9, 0x01, 0x8D, 0x25, 0x91, // T1 high: start, period $0100
    0x58, // CLI
    0x4C, 0x1B, 0xE0, // JMP $E01B
];

/// INC $10; LDA $9124 (ack T1); RTI
const IRQ_HANDLER: &[u8] = &[0xE6, 0x10, 0xAD, 0x24, 0x91, 0x40];
/// INC $11; LDA $9111 (ack CA1); RTI
const NMI_HANDLER: &[u8] = &[0xE6, 0x11, 0xAD, 0x11, 0x91, 0x40];

/// An 8K KERNAL with `main` at $E000, handlers at $E100 (IRQ) and $E110
/// (NMI), and the vectors pointing at them.
fn kernal(main: &[u8]) -> Vec<u8> {
    let mut rom = vec![0xEA; 8192];
    rom[..main.len()].copy_from_slice(main);
    rom[0x100..0x100 + IRQ_HANDLER.len()].copy_from_slice(IRQ_HANDLER);
    rom[0x110..0x110 + NMI_HANDLER.len()].copy_from_slice(NMI_HANDLER);
    rom[0x1FFA..].copy_from_slice(&[0x10, 0xE1, 0x00, 0xE0, 0x00, 0xE1]);
    rom
}

fn config(main: &[u8], ram: RamExpansion) -> Vic20Config {
    let mut char_rom = vec![0; 4096];
    char_rom[..8].fill(0xFF); // screen code 0 is a solid block
    Vic20Config::new(MachineType::Pal, ram, vec![0; 8192], kernal(main), char_rom)
        .expect("ROM sizes are correct")
}

fn pixel(vic20: &Vic20, x: usize, y: usize) -> u32 {
    vic20.framebuffer()[y * vic20.framebuffer_width() as usize + x]
}

#[test]
fn program_sets_up_screen_and_vic_draws_it() {
    let mut vic20 = Vic20::new(&config(DRAW_SCREEN, RamExpansion::UNEXPANDED));
    vic20.run_frame();
    vic20.run_frame();

    assert_eq!(vic20.query("vic.video_base"), Some(Value::U16(0x1E00)));
    assert_eq!(pixel(&vic20, 72, 76), PALETTE[2], "cell 0 is red");
    assert_eq!(pixel(&vic20, 80, 76), PALETTE[0], "cell 1 uses colour 0");
    assert_eq!(pixel(&vic20, 60, 30), PALETTE[3], "cyan border");

    let pc = vic20.cpu().regs.pc;
    assert!((0xE023..=0xE025).contains(&pc), "spinning at ${pc:04X}");
}

#[test]
fn timer_irq_runs_handler_every_period() {
    let mut vic20 = Vic20::new(&config(INTERRUPTS, RamExpansion::UNEXPANDED));
    vic20.run_frame();
    let count = vic20.bus().peek(0x10);
    // 22,152 cycles at one IRQ per ~$100 cycles.
    assert!((70..=95).contains(&count), "{count} interrupts in a frame");
}

#[test]
fn restore_key_runs_nmi_handler_once_per_press() {
    let mut vic20 = Vic20::new(&config(INTERRUPTS, RamExpansion::UNEXPANDED));
    vic20.run_frame();
    assert_eq!(vic20.bus().peek(0x11), 0);

    vic20.set_restore_key(true);
    vic20.run_frame();
    assert_eq!(vic20.bus().peek(0x11), 1);

    vic20.run_frame();
    assert_eq!(vic20.bus().peek(0x11), 1, "held key does not repeat");

    vic20.set_restore_key(false);
    vic20.run_frame();
    vic20.set_restore_key(true);
    vic20.run_frame();
    assert_eq!(vic20.bus().peek(0x11), 2);
}

#[test]
fn prg_for_expanded_machine() {
    let prg = [0x01, 0x12, 0x0B, 0x12, 0x0A, 0x00, 0x99, 0x00, 0x00, 0x00];
    let ram = detect_ram(ProgramKind::Prg, &prg).expect("PRG has a load address");
    assert_eq!(ram, RamExpansion::K24);

    let mut vic20 = Vic20::new(&config(DRAW_SCREEN, ram));
    let start = vic20
        .load_program(ProgramKind::Prg, &prg)
        .expect("PRG should load");
    assert_eq!(start, 0x1201);
    assert_eq!(vic20.query("memory.$1205"), Some(Value::U8(0x99)));
    assert_eq!(vic20.query("memory.$2B"), Some(Value::U8(0x01)));
    assert_eq!(vic20.query("memory.$2C"), Some(Value::U8(0x12)));
    assert_eq!(vic20.query("memory.$2D"), Some(Value::U8(0x09)));
    assert_eq!(vic20.query("memory.$2E"), Some(Value::U8(0x12)));
    assert_eq!(vic20.query("memory.$6000"), Some(Value::U8(0x00)), "24K block present");
}

#[test]
fn snapshot_resumes_where_it_left_off() {
    let config = config(INTERRUPTS, RamExpansion::K3);
    let mut original = Vic20::new(&config);
    original.run_frame();
    original.update(0.003);
    original.finish_instruction();

    let snapshot = original.snapshot();
    let mut resumed = Vic20::from_snapshot(&config, &snapshot).expect("snapshot restores");
    assert_eq!(resumed.snapshot(), snapshot);

    for _ in 0..3 {
        original.run_frame();
        resumed.run_frame();
    }
    assert_eq!(resumed.snapshot(), original.snapshot());
    assert_eq!(resumed.framebuffer(), original.framebuffer());
}

fn load_roms(ram: RamExpansion) -> Vic20Config {
    Vic20Config::from_rom_dir(Path::new("../../roms/vic20"), MachineType::Pal, ram)
        .expect("VIC-20 ROMs not found at roms/vic20")
}

/// Screen codes for "READY."
const READY: [u8; 6] = [18, 5, 1, 4, 25, 46];

fn screen_contains_ready(vic20: &Vic20) -> bool {
    let base = usize::from(vic20.bus().vic.geometry().video_base);
    let screen = &vic20.bus().memory()[base..base + 22 * 23];
    screen.windows(READY.len()).any(|w| w == READY)
}

#[test]
#[ignore] // Requires real VIC-20 ROMs at roms/vic20
fn boot_to_ready_unexpanded() {
    let mut vic20 = Vic20::new(&load_roms(RamExpansion::UNEXPANDED));
    let found = (0..300).any(|_| {
        vic20.run_frame();
        screen_contains_ready(&vic20)
    });
    assert!(found, "no READY. within 300 frames");
    assert_eq!(vic20.query("vic.video_base"), Some(Value::U16(0x1E00)));
}

#[test]
#[ignore] // Requires real VIC-20 ROMs at roms/vic20
fn boot_to_ready_with_8k_moves_screen() {
    let mut vic20 = Vic20::new(&load_roms(RamExpansion::K8));
    let found = (0..300).any(|_| {
        vic20.run_frame();
        screen_contains_ready(&vic20)
    });
    assert!(found, "no READY. within 300 frames");
    assert_eq!(vic20.query("vic.video_base"), Some(Value::U16(0x1000)));

    let out_dir = Path::new("../../test_output");
    fs::create_dir_all(out_dir).ok();
    emu_vic20::capture::save_screenshot(&vic20, &out_dir.join("vic20_boot_8k.png"))
        .expect("screenshot should save");
}
