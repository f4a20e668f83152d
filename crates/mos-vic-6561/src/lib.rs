//! MOS 6560/6561 VIC (Video Interface Chip).
//!
//! The VIC generates a character-mapped raster four pixels per CPU cycle.
//! Inside the text matrix it alternates between two fetches per cell: the
//! screen code and its colour nibble, then the character bitmap byte that
//! the code selects. Outside the matrix it paints the border, and during
//! blanking it paints nothing.
//!
//! # Standalone IC
//!
//! The chip reads video, colour and character memory through a closure
//! passed to [`Vic6561::tick`], so it knows nothing about the machine's
//! memory map. The caller is responsible for folding the VIC's 14-bit
//! address space onto CPU addresses, which the base tables below already
//! express in CPU terms.
//!
//! # Timing
//!
//! | Variant | Raster | Cycles/line | Cycles/frame |
//! |---------|--------|-------------|--------------|
//! | 6561 PAL | 284 x 312 | 71 | 22,152 |
//! | 6560 NTSC | 260 x 263 | 65 | 17,095 |
//!
//! Lines 0-9 are vertical blanking and the first 48 pixels of each line are
//! horizontal blanking.
//!
//! # Framebuffer
//!
//! The framebuffer covers the whole raster, blanking included, as ARGB32.
//! [`MachineType`] reports the visible window within it.

mod palette;
mod timing;

use emu_core::{Observable, Value};

pub use palette::PALETTE;
pub use timing::MachineType;

/// First register address.
const REG_BASE: u16 = 0x9000;

/// Lines 0-9 are vertical blanking.
const VBLANK_LINES: u16 = 10;
/// Pixels 0-47 of each line are horizontal blanking.
const HBLANK_PIXELS: u16 = 48;
/// Pixels emitted per CPU cycle.
const PIXELS_PER_CYCLE: u16 = 4;

/// Screen memory base, indexed by reg 5 bits 4-7 and reg 2 bit 7.
const VIDEO_BASE_TABLE: [u16; 32] = [
    0x8000, 0x8200, 0x8400, 0x8600, 0x8800, 0x8A00, 0x8C00, 0x8E00, //
    0x9000, 0x9200, 0x9400, 0x9600, 0x9800, 0x9A00, 0x9C00, 0x9E00, //
    0x0000, 0x0200, 0x0400, 0x0600, 0x0800, 0x0A00, 0x0C00, 0x0E00, //
    0x1000, 0x1200, 0x1400, 0x1600, 0x1800, 0x1A00, 0x1C00, 0x1E00, //
];

/// Character memory base, indexed by reg 5 bits 0-3.
const CHAR_BASE_TABLE: [u16; 16] = [
    0x8000, 0x8400, 0x8800, 0x8C00, 0x9000, 0x9400, 0x9800, 0x9C00, //
    0x0000, 0x0400, 0x0800, 0x0C00, 0x1000, 0x1400, 0x1800, 0x1C00, //
];

/// Everything the raster needs from the control registers.
///
/// Recomputed from the raw registers on every write, so it can never drift
/// from what the CPU last stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub columns: u16,
    pub rows: u16,
    /// 8 or 16.
    pub char_height: u16,
    /// Bitmap offset shift for one character: 3 for 8x8, 4 for 8x16.
    pub char_shift: u16,
    /// Matrix bounds in raster pixels (`left`/`right`) and lines
    /// (`top`/`bottom`). Right and bottom are exclusive.
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
    pub video_base: u16,
    pub char_base: u16,
    pub colour_base: u16,
    pub border: u8,
    pub background: u8,
    pub aux: u8,
    /// Reg 15 bit 3 clear: set bitmap bits take the background colour.
    pub reverse: bool,
}

impl Geometry {
    /// Derive the geometry from a raw register file.
    #[must_use]
    pub fn derive(regs: &[u8; 16]) -> Self {
        let columns = u16::from(regs[2] & 0x7F);
        let rows = u16::from((regs[3] & 0x7E) >> 1);
        let (char_height, char_shift) = if regs[3] & 0x01 != 0 { (16, 4) } else { (8, 3) };
        let left = (u16::from(regs[0] & 0x7F) << 2) + 24;
        let top = u16::from(regs[1]) << 1;
        let video_index = usize::from(((regs[5] & 0xF0) >> 3) | ((regs[2] & 0x80) >> 7));

        Self {
            columns,
            rows,
            char_height,
            char_shift,
            left,
            right: left + columns * 8,
            top,
            bottom: top + rows * char_height,
            video_base: VIDEO_BASE_TABLE[video_index],
            char_base: CHAR_BASE_TABLE[usize::from(regs[5] & 0x0F)],
            colour_base: if regs[2] & 0x80 != 0 { 0x9600 } else { 0x9400 },
            border: regs[15] & 0x07,
            background: regs[15] >> 4,
            aux: regs[14] >> 4,
            reverse: regs[15] & 0x08 == 0,
        }
    }

    fn in_matrix(&self, line: u16, pixel: u16) -> bool {
        (self.top..self.bottom).contains(&line) && (self.left..self.right).contains(&pixel)
    }
}

/// MOS 6560/6561 VIC.
pub struct Vic6561 {
    machine: MachineType,
    /// Raw register file as last written, raster bits included.
    regs: [u8; 16],
    geometry: Geometry,
    /// Horizontal pixel counter, steps by 4.
    pixel: u16,
    line: u16,
    /// Video matrix counter: offset of the next screen code.
    matrix_counter: u16,
    /// Matrix offset of the current text row's first cell.
    row_start: u16,
    /// Pixel line within the current text row.
    cell_depth: u16,
    /// A screen code has been fetched and its bitmap is due next cycle.
    bitmap_pending: bool,
    cell_index: u8,
    cell_colour: u8,
    /// Last bitmap byte fetched; also what unmapped register reads see.
    char_data: u8,
    frame_complete: bool,
    framebuffer: Vec<u32>,
}

impl Vic6561 {
    #[must_use]
    pub fn new(machine: MachineType) -> Self {
        let regs = [0; 16];
        let size = usize::from(machine.total_width()) * usize::from(machine.total_height());
        Self {
            machine,
            regs,
            geometry: Geometry::derive(&regs),
            pixel: 0,
            line: 0,
            matrix_counter: 0,
            row_start: 0,
            cell_depth: 0,
            bitmap_pending: false,
            cell_index: 0,
            cell_colour: 0,
            char_data: 0,
            frame_complete: false,
            framebuffer: vec![PALETTE[0]; size],
        }
    }

    /// Advance one CPU cycle (four pixels).
    ///
    /// `read` fetches a byte of video, colour or character memory without
    /// side effects.
    pub fn tick(&mut self, read: impl Fn(u16) -> u8) {
        let width = self.machine.total_width();
        let g = self.geometry;

        if self.bitmap_pending {
            self.bitmap_pending = false;
            let mut address = g
                .char_base
                .wrapping_add(u16::from(self.cell_index) << g.char_shift)
                .wrapping_add(self.cell_depth);
            // Character sets based in low RAM run off the end of the VIC's
            // 8K window and wrap round into the character ROM.
            if g.char_base < 0x2000 && address >= 0x2000 {
                address = address.wrapping_add(0x6000);
            }
            self.char_data = read(address);
            self.draw_cell(self.pixel - PIXELS_PER_CYCLE);
        } else if g.in_matrix(self.line, self.pixel) && self.pixel + 8 <= width {
            self.cell_index = read(g.video_base.wrapping_add(self.matrix_counter));
            self.cell_colour = read(g.colour_base.wrapping_add(self.matrix_counter)) & 0x0F;
            self.matrix_counter = self.matrix_counter.wrapping_add(1);
            self.bitmap_pending = true;
        } else {
            let border = PALETTE[usize::from(g.border)];
            for x in self.pixel..self.pixel + PIXELS_PER_CYCLE {
                self.plot(x, border);
            }
        }

        self.pixel += PIXELS_PER_CYCLE;
        if self.pixel >= width {
            self.end_of_line();
        }
    }

    fn end_of_line(&mut self) {
        let g = self.geometry;
        let finished = self.line;
        self.pixel = 0;
        self.line += 1;

        if self.line >= self.machine.total_height() {
            self.line = 0;
            self.matrix_counter = 0;
            self.row_start = 0;
            self.cell_depth = 0;
            self.frame_complete = true;
        } else if (g.top..g.bottom).contains(&finished) {
            self.cell_depth += 1;
            if self.cell_depth >= g.char_height {
                self.cell_depth = 0;
                self.row_start = self.row_start.wrapping_add(g.columns);
            }
            self.matrix_counter = self.row_start;
        }

        self.regs[4] = (self.line >> 1) as u8;
        self.regs[3] = (self.regs[3] & 0x7F) | (((self.line & 1) as u8) << 7);
    }

    /// Paint the eight pixels of the current cell starting at raster `x`.
    fn draw_cell(&mut self, x: u16) {
        let g = self.geometry;
        let background = PALETTE[usize::from(g.background)];
        let foreground = PALETTE[usize::from(self.cell_colour & 0x07)];
        let data = self.char_data;

        if self.cell_colour & 0x08 != 0 {
            let table = [
                background,
                PALETTE[usize::from(g.border)],
                foreground,
                PALETTE[usize::from(g.aux)],
            ];
            for pair in 0..4u16 {
                let colour = table[usize::from((data >> (6 - pair * 2)) & 0x03)];
                self.plot(x + pair * 2, colour);
                self.plot(x + pair * 2 + 1, colour);
            }
        } else {
            let (set, clear) = if g.reverse {
                (background, foreground)
            } else {
                (foreground, background)
            };
            for bit in 0..8u16 {
                let colour = if data & (0x80 >> bit) != 0 { set } else { clear };
                self.plot(x + bit, colour);
            }
        }
    }

    fn plot(&mut self, x: u16, colour: u32) {
        if self.line < VBLANK_LINES || x < HBLANK_PIXELS || x >= self.machine.total_width() {
            return;
        }
        let index = usize::from(self.line) * usize::from(self.machine.total_width()) + usize::from(x);
        if let Some(pixel) = self.framebuffer.get_mut(index) {
            *pixel = colour;
        }
    }

    /// Register read. Only offsets $0-$F within the decoded window answer;
    /// anything else sees the last bitmap byte left on the data bus.
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        let address = address & 0xFF0F;
        if (REG_BASE..=REG_BASE + 0x0F).contains(&address) {
            self.regs[usize::from(address - REG_BASE)]
        } else {
            self.char_data
        }
    }

    /// Register write. Geometry is re-derived immediately.
    pub fn write(&mut self, address: u16, value: u8) {
        let address = address & 0xFF0F;
        if !(REG_BASE..=REG_BASE + 0x0F).contains(&address) {
            return;
        }
        match address - REG_BASE {
            // Bit 7 is the raster line's low bit and belongs to the chip.
            3 => self.regs[3] = (self.regs[3] & 0x80) | (value & 0x7F),
            // Raster, light pen and paddles are inputs.
            4 | 6..=9 => return,
            reg => self.regs[usize::from(reg)] = value,
        }
        self.geometry = Geometry::derive(&self.regs);
    }

    /// Raw register file, raster bits included.
    #[must_use]
    pub fn registers(&self) -> [u8; 16] {
        self.regs
    }

    /// Replace the whole register file, as a snapshot restore does, and
    /// re-derive the geometry. The raster registers are overwritten by the
    /// next line change.
    pub fn load_registers(&mut self, regs: &[u8; 16]) {
        self.regs = *regs;
        self.geometry = Geometry::derive(&self.regs);
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Has the frame completed? Auto-clears on read.
    pub fn take_frame_complete(&mut self) -> bool {
        let result = self.frame_complete;
        self.frame_complete = false;
        result
    }

    /// Reference to the framebuffer (ARGB32), total raster size.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        u32::from(self.machine.total_width())
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        u32::from(self.machine.total_height())
    }

    #[must_use]
    pub fn machine(&self) -> MachineType {
        self.machine
    }

    /// Current raster line.
    #[must_use]
    pub fn raster_line(&self) -> u16 {
        self.line
    }

    /// CPU cycle within the current line.
    #[must_use]
    pub fn raster_cycle(&self) -> u16 {
        self.pixel / PIXELS_PER_CYCLE
    }

    /// Move the beam to `line`/`cycle`, the way a snapshot restore resumes
    /// mid-frame. Fetch progress is rebuilt for that line. Out-of-range
    /// positions are clamped to the raster.
    pub fn set_raster(&mut self, line: u16, cycle: u16) {
        let g = self.geometry;
        self.line = line.min(self.machine.total_height() - 1);
        self.pixel = cycle.min(self.machine.cycles_per_line() - 1) * PIXELS_PER_CYCLE;
        self.bitmap_pending = false;

        if self.line > g.top && g.char_height > 0 {
            let lines_in = (self.line.min(g.bottom) - g.top).min(g.rows * g.char_height);
            self.cell_depth = if self.line < g.bottom { lines_in % g.char_height } else { 0 };
            self.row_start = (lines_in / g.char_height) * g.columns;
        } else {
            self.cell_depth = 0;
            self.row_start = 0;
        }
        self.matrix_counter = self.row_start;

        self.regs[4] = (self.line >> 1) as u8;
        self.regs[3] = (self.regs[3] & 0x7F) | (((self.line & 1) as u8) << 7);
    }
}

impl Observable for Vic6561 {
    fn query(&self, path: &str) -> Option<Value> {
        let g = &self.geometry;
        match path {
            "line" => Some(self.line.into()),
            "cycle" => Some(self.raster_cycle().into()),
            "columns" => Some(g.columns.into()),
            "rows" => Some(g.rows.into()),
            "char_height" => Some(g.char_height.into()),
            "video_base" => Some(g.video_base.into()),
            "char_base" => Some(g.char_base.into()),
            "colour_base" => Some(g.colour_base.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "line",
            "cycle",
            "columns",
            "rows",
            "char_height",
            "video_base",
            "char_base",
            "colour_base",
        ]
    }
}
