//! VIC-20 keyboard matrix.
//!
//! The KERNAL drives a column select onto VIA2 port B ($9120, active low)
//! and reads the rows back on port A ($9121, active low: 0 = pressed). The
//! matrix is passive, so it can equally be scanned the other way round:
//! drive port A and read port B.

/// Logical key on the VIC-20 keyboard.
///
/// Each key maps to a (row, col) pair: `row` is the VIA2 port B line that
/// selects it, `col` the port A line it pulls low.
///
/// | PB | PA0 | PA1 | PA2 | PA3 | PA4 | PA5 | PA6 | PA7 |
/// |----|-----|-----|-----|-----|-----|-----|-----|-----|
/// | 0  | 1   | 3   | 5   | 7   | 9   | +   | £   | DEL |
/// | 1  | ←   | W   | R   | Y   | I   | P   | *   | RET |
/// | 2  | CTRL| A   | D   | G   | J   | L   | ;   | →   |
/// | 3  | STOP| LSHFT| X  | V   | N   | ,   | /   | ↓   |
/// | 4  | SPC | Z   | C   | B   | M   | .   | RSHFT| F1 |
/// | 5  | C=  | S   | F   | H   | K   | :   | =   | F3  |
/// | 6  | Q   | E   | T   | U   | O   | @   | ↑   | F5  |
/// | 7  | 2   | 4   | 6   | 8   | 0   | -   | HOME| F7  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vic20Key {
    // PB0
    N1,
    N3,
    N5,
    N7,
    N9,
    Plus,
    Pound,
    Delete,
    // PB1
    LeftArrow,
    W,
    R,
    Y,
    I,
    P,
    Asterisk,
    Return,
    // PB2
    Ctrl,
    A,
    D,
    G,
    J,
    L,
    Semicolon,
    CursorRight,
    // PB3
    RunStop,
    LShift,
    X,
    V,
    N,
    Comma,
    Slash,
    CursorDown,
    // PB4
    Space,
    Z,
    C,
    B,
    M,
    Period,
    RShift,
    F1,
    // PB5
    Commodore,
    S,
    F,
    H,
    K,
    Colon,
    Equals,
    F3,
    // PB6
    Q,
    E,
    T,
    U,
    O,
    At,
    UpArrow,
    F5,
    // PB7
    N2,
    N4,
    N6,
    N8,
    N0,
    Minus,
    Home,
    F7,
}

impl Vic20Key {
    /// Every key, in matrix order.
    pub const ALL: [Self; 64] = [
        Self::N1,
        Self::N3,
        Self::N5,
        Self::N7,
        Self::N9,
        Self::Plus,
        Self::Pound,
        Self::Delete,
        Self::LeftArrow,
        Self::W,
        Self::R,
        Self::Y,
        Self::I,
        Self::P,
        Self::Asterisk,
        Self::Return,
        Self::Ctrl,
        Self::A,
        Self::D,
        Self::G,
        Self::J,
        Self::L,
        Self::Semicolon,
        Self::CursorRight,
        Self::RunStop,
        Self::LShift,
        Self::X,
        Self::V,
        Self::N,
        Self::Comma,
        Self::Slash,
        Self::CursorDown,
        Self::Space,
        Self::Z,
        Self::C,
        Self::B,
        Self::M,
        Self::Period,
        Self::RShift,
        Self::F1,
        Self::Commodore,
        Self::S,
        Self::F,
        Self::H,
        Self::K,
        Self::Colon,
        Self::Equals,
        Self::F3,
        Self::Q,
        Self::E,
        Self::T,
        Self::U,
        Self::O,
        Self::At,
        Self::UpArrow,
        Self::F5,
        Self::N2,
        Self::N4,
        Self::N6,
        Self::N8,
        Self::N0,
        Self::Minus,
        Self::Home,
        Self::F7,
    ];

    /// Return the (row, col) pair for this key in the keyboard matrix.
    #[must_use]
    pub const fn matrix(self) -> (u8, u8) {
        let index = self as u8;
        (index / 8, index % 8)
    }
}

/// 8x8 keyboard matrix.
///
/// Internally stores 1 = pressed per bit. The scan methods return
/// active-low data as seen on the VIA2 port pins.
pub struct KeyboardMatrix {
    /// `rows[r]` has bit `c` set if key (row=r, col=c) is pressed.
    rows: [u8; 8],
}

impl KeyboardMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: [0; 8] }
    }

    /// Set or clear the key at the given row and column.
    pub fn set_key(&mut self, row: u8, col: u8, pressed: bool) {
        if row < 8 && col < 8 {
            if pressed {
                self.rows[row as usize] |= 1 << col;
            } else {
                self.rows[row as usize] &= !(1 << col);
            }
        }
    }

    /// Port A levels for a port B drive. A 0 bit in `row_select` selects a
    /// row; a 0 bit in the result is a pressed key in a selected row.
    #[must_use]
    pub fn scan_rows(&self, row_select: u8) -> u8 {
        let mut result = 0;
        for (row, &cols) in self.rows.iter().enumerate() {
            if row_select & (1 << row) == 0 {
                result |= cols;
            }
        }
        !result
    }

    /// Port B levels for a port A drive: the same matrix read sideways.
    #[must_use]
    pub fn scan_columns(&self, col_select: u8) -> u8 {
        let mut result = 0;
        for (row, &cols) in self.rows.iter().enumerate() {
            if !col_select & cols != 0 {
                result |= 1 << row;
            }
        }
        !result
    }

    /// Release all keys.
    pub fn release_all(&mut self) {
        self.rows = [0; 8];
    }
}

impl Default for KeyboardMatrix {
    fn default() -> Self {
        Self::new()
    }
}
