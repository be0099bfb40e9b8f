//! Bitmap digit fonts
//!
//! Rows are MSB-aligned: bit 31 of [`Font::row_bits`] is column 0, so a cell
//! is lit when `row & (0x8000_0000 >> col) != 0`.

/// Read-only glyph source used by the glyph and clock effects
pub trait Font {
    fn width(&self) -> u16;
    fn height(&self) -> u16;
    fn count(&self) -> u16;

    /// Row bits for `symbol`, zero for out-of-range input
    fn row_bits(&self, symbol: u16, row: u16) -> u32;

    #[inline]
    fn is_set(&self, symbol: u16, col: u16, row: u16) -> bool {
        col < 32 && self.row_bits(symbol, row) & (0x8000_0000 >> col) != 0
    }
}

/// Monospace font stored as one byte per row, MSB first
#[derive(Debug)]
pub struct DigitFont {
    width: u16,
    height: u16,
    rows: &'static [u8],
}

impl DigitFont {
    pub const fn new(width: u16, height: u16, rows: &'static [u8]) -> Self {
        Self { width, height, rows }
    }
}

impl Font for DigitFont {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn count(&self) -> u16 {
        if self.height == 0 {
            return 0;
        }
        (self.rows.len() / self.height as usize) as u16
    }

    fn row_bits(&self, symbol: u16, row: u16) -> u32 {
        if symbol >= self.count() || row >= self.height {
            return 0;
        }
        let idx = symbol as usize * self.height as usize + row as usize;
        self.rows.get(idx).map_or(0, |&r| (r as u32) << 24)
    }
}

#[rustfmt::skip]
static CLOCK_4X7_ROWS: [u8; 70] = [
    // 0
    0b1111_0000, 0b1001_0000, 0b1001_0000, 0b1001_0000, 0b1001_0000, 0b1001_0000, 0b1111_0000,
    // 1
    0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000,
    // 2
    0b1111_0000, 0b0001_0000, 0b0001_0000, 0b1111_0000, 0b1000_0000, 0b1000_0000, 0b1111_0000,
    // 3
    0b1111_0000, 0b0001_0000, 0b0001_0000, 0b1111_0000, 0b0001_0000, 0b0001_0000, 0b1111_0000,
    // 4
    0b1001_0000, 0b1001_0000, 0b1001_0000, 0b1111_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000,
    // 5
    0b1111_0000, 0b1000_0000, 0b1000_0000, 0b1111_0000, 0b0001_0000, 0b0001_0000, 0b1111_0000,
    // 6
    0b1111_0000, 0b1000_0000, 0b1000_0000, 0b1111_0000, 0b1001_0000, 0b1001_0000, 0b1111_0000,
    // 7
    0b1111_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000, 0b0001_0000,
    // 8
    0b1111_0000, 0b1001_0000, 0b1001_0000, 0b1111_0000, 0b1001_0000, 0b1001_0000, 0b1111_0000,
    // 9
    0b1111_0000, 0b1001_0000, 0b1001_0000, 0b1111_0000, 0b0001_0000, 0b0001_0000, 0b1111_0000,
];

#[rustfmt::skip]
static DIGITS_3X5_ROWS: [u8; 50] = [
    0b1110_0000, 0b1010_0000, 0b1010_0000, 0b1010_0000, 0b1110_0000, // 0
    0b0100_0000, 0b1100_0000, 0b0100_0000, 0b0100_0000, 0b1110_0000, // 1
    0b1110_0000, 0b0010_0000, 0b1110_0000, 0b1000_0000, 0b1110_0000, // 2
    0b1110_0000, 0b0010_0000, 0b1110_0000, 0b0010_0000, 0b1110_0000, // 3
    0b1010_0000, 0b1010_0000, 0b1110_0000, 0b0010_0000, 0b0010_0000, // 4
    0b1110_0000, 0b1000_0000, 0b1110_0000, 0b0010_0000, 0b1110_0000, // 5
    0b1110_0000, 0b1000_0000, 0b1110_0000, 0b1010_0000, 0b1110_0000, // 6
    0b1110_0000, 0b0010_0000, 0b0010_0000, 0b0010_0000, 0b0010_0000, // 7
    0b1110_0000, 0b1010_0000, 0b1110_0000, 0b1010_0000, 0b1110_0000, // 8
    0b1110_0000, 0b1010_0000, 0b1110_0000, 0b0010_0000, 0b1110_0000, // 9
];

/// Segment-style 4x7 digits. Glyph 8 has every segment lit.
pub static DIGITAL_CLOCK_4X7: DigitFont = DigitFont::new(4, 7, &CLOCK_4X7_ROWS);

/// Compact 3x5 digits
pub static DIGITS_3X5: DigitFont = DigitFont::new(3, 5, &DIGITS_3X5_ROWS);
