//! Raster timing for the two VIC variants.

/// Which VIC the machine carries. The chip sets the master clock, the
/// raster size and the frame rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MachineType {
    /// 6561, 50 Hz.
    #[default]
    Pal,
    /// 6560, 60 Hz.
    Ntsc,
}

impl MachineType {
    /// CPU cycles per second.
    #[must_use]
    pub const fn cycles_per_second(self) -> u32 {
        match self {
            Self::Pal => 1_108_405,
            Self::Ntsc => 1_022_727,
        }
    }

    /// Raster line length in pixels, blanking included.
    #[must_use]
    pub const fn total_width(self) -> u16 {
        match self {
            Self::Pal => 284,
            Self::Ntsc => 260,
        }
    }

    /// Raster lines per frame.
    #[must_use]
    pub const fn total_height(self) -> u16 {
        match self {
            Self::Pal => 312,
            Self::Ntsc => 263,
        }
    }

    #[must_use]
    pub const fn visible_width(self) -> u16 {
        match self {
            Self::Pal => 220,
            Self::Ntsc => 199,
        }
    }

    #[must_use]
    pub const fn visible_height(self) -> u16 {
        match self {
            Self::Pal => 272,
            Self::Ntsc => 252,
        }
    }

    /// Left edge of the visible window within the raster.
    #[must_use]
    pub const fn horizontal_offset(self) -> u16 {
        match self {
            Self::Pal => 55,
            Self::Ntsc => 49,
        }
    }

    /// Top edge of the visible window within the raster.
    #[must_use]
    pub const fn vertical_offset(self) -> u16 {
        match self {
            Self::Pal => 34,
            Self::Ntsc => 8,
        }
    }

    #[must_use]
    pub const fn frames_per_second(self) -> u32 {
        match self {
            Self::Pal => 50,
            Self::Ntsc => 60,
        }
    }

    /// CPU cycles per raster line. The VIC emits four pixels per cycle.
    #[must_use]
    pub const fn cycles_per_line(self) -> u16 {
        self.total_width() / 4
    }

    /// CPU cycles per frame.
    #[must_use]
    pub const fn cycles_per_frame(self) -> u32 {
        self.cycles_per_line() as u32 * self.total_height() as u32
    }
}
