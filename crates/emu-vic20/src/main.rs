//! Commodore VIC-20 emulator binary.
//!
//! Headless: boots the ROMs, optionally loads a program or cartridge,
//! runs a number of frames and saves a screenshot.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use emu_core::Bus;
use emu_vic20::{
    MachineType, ProgramKind, RamExpansion, Vic20, Vic20Config, capture, program::detect_ram,
};

/// KERNAL keyboard buffer and its fill count.
const KEYBOARD_BUFFER: u16 = 0x0277;
const KEYBOARD_COUNT: u16 = 0x00C6;

#[derive(Parser, Debug)]
#[command(name = "emu-vic20", about = "Cycle-accurate Commodore VIC-20 emulator")]
struct Cli {
    /// Directory holding basic.rom, kernal.rom and char.rom.
    #[arg(long, value_name = "DIR", default_value = "roms/vic20")]
    rom_dir: PathBuf,

    /// BASIC program to load and RUN once the machine has booted.
    #[arg(long, value_name = "PATH", conflicts_with = "cart")]
    prg: Option<PathBuf>,

    /// Cartridge image, mapped before reset.
    #[arg(long, value_name = "PATH")]
    cart: Option<PathBuf>,

    /// RAM expansion: 0, 3k, 8k, 16k, 24k, 32k or 35k. Detected from the
    /// program when omitted.
    #[arg(long, value_name = "SIZE", value_parser = parse_ram)]
    ram: Option<RamExpansion>,

    /// NTSC timing instead of PAL.
    #[arg(long, default_value_t = false)]
    ntsc: bool,

    /// Frames to run.
    #[arg(long, default_value_t = 300)]
    frames: u32,

    /// Frames to let BASIC boot before a PRG is loaded.
    #[arg(long, default_value_t = 150)]
    boot_frames: u32,

    /// Save the last frame as a PNG.
    #[arg(long, value_name = "PATH")]
    screenshot: Option<PathBuf>,
}

fn parse_ram(text: &str) -> Result<RamExpansion, String> {
    RamExpansion::from_preset(text).ok_or_else(|| format!("unknown RAM expansion '{text}'"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let machine = if cli.ntsc {
        MachineType::Ntsc
    } else {
        MachineType::Pal
    };

    let program = match (&cli.prg, &cli.cart) {
        (Some(path), _) => Some((ProgramKind::Prg, fs::read(path)?)),
        (None, Some(path)) => Some((ProgramKind::Cartridge, fs::read(path)?)),
        (None, None) => None,
    };

    let ram = cli
        .ram
        .or_else(|| {
            program
                .as_ref()
                .and_then(|(kind, data)| detect_ram(*kind, data))
        })
        .unwrap_or_default();

    let config = Vic20Config::from_rom_dir(&cli.rom_dir, machine, ram)?;
    let mut vic20 = Vic20::new(&config);

    let mut frames = 0;
    match program {
        Some((ProgramKind::Cartridge, data)) => {
            if vic20.load_program(ProgramKind::Cartridge, &data).is_err() {
                log::warn!("booting BASIC instead");
            }
        }
        Some((kind, data)) => {
            for _ in 0..cli.boot_frames.min(cli.frames) {
                vic20.run_frame();
                frames += 1;
            }
            match vic20.load_program(kind, &data) {
                Ok(_) => type_run(&mut vic20),
                Err(_) => log::warn!("staying at the BASIC prompt"),
            }
        }
        None => {}
    }

    while frames < cli.frames {
        vic20.run_frame();
        frames += 1;
    }

    if let Some(path) = &cli.screenshot {
        capture::save_screenshot(&vic20, path)?;
    }
    Ok(())
}

/// Put RUN and RETURN in the KERNAL keyboard buffer.
fn type_run(vic20: &mut Vic20) {
    let keys = b"RUN\r";
    let bus = vic20.bus_mut();
    for (address, &key) in (KEYBOARD_BUFFER..).zip(keys) {
        bus.write(address, key);
    }
    bus.write(KEYBOARD_COUNT, keys.len() as u8);
}
