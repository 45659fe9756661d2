//! Bitmap fonts for [`Display::write_char`](crate::Display::write_char) and
//! [`Display::write_string`](crate::Display::write_string).
//!
//! A glyph is `height` rows of `u16`, one row per entry. The leftmost pixel of
//! a row is bit 15, so a font can be at most 16 pixels wide. Glyphs are stored
//! consecutively starting with `' '`.

/// First character covered by every font.
pub const FIRST_CHAR: char = ' ';

/// Character drawn in place of one the font does not cover.
pub const REPLACEMENT_CHAR: char = '?';

/// A fixed-width bitmap font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font<'a> {
    width: u8,
    height: u8,
    data: &'a [u16],
}

impl<'a> Font<'a> {
    /// Creates a font from its glyph rows.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0 or larger than 16, or if `height` is 0.
    pub const fn new(width: u8, height: u8, data: &'a [u16]) -> Self {
        assert!(width > 0 && width <= 16, "font width must be in 1..=16");
        assert!(height > 0, "font height must not be 0");
        Self {
            width,
            height,
            data,
        }
    }

    /// Glyph width in pixels.
    pub const fn width(&self) -> u16 {
        self.width as u16
    }

    /// Glyph height in pixels.
    pub const fn height(&self) -> u16 {
        self.height as u16
    }

    /// Number of glyphs in the font.
    pub const fn glyph_count(&self) -> usize {
        self.data.len() / self.height as usize
    }

    /// Rows of the glyph for `ch`, or `None` if the font does not cover it.
    pub fn glyph(&self, ch: char) -> Option<&'a [u16]> {
        let index = (ch as u32).checked_sub(FIRST_CHAR as u32)? as usize;
        let rows = usize::from(self.height);
        let start = index.checked_mul(rows)?;
        self.data.get(start..start + rows)
    }
}

/// Returns `true` if pixel `column` of a glyph row is set.
pub(crate) const fn is_set(row: u16, column: u16) -> bool {
    column < 16 && (row << column) & 0x8000 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // ' ', '!', '"'
    const DATA: [u16; 9] = [
        0x0000, 0x0000, 0x0000, //
        0x2000, 0x2000, 0x0000, //
        0x5000, 0x0000, 0x0000, //
    ];
    const FONT: Font<'static> = Font::new(4, 3, &DATA);

    #[test]
    fn glyphs_are_indexed_from_space() {
        assert_eq!(FONT.glyph_count(), 3);
        assert_eq!(FONT.glyph(' '), Some(&DATA[0..3]));
        assert_eq!(FONT.glyph('!'), Some(&DATA[3..6]));
        assert_eq!(FONT.glyph('"'), Some(&DATA[6..9]));
    }

    #[test]
    fn uncovered_characters_have_no_glyph() {
        assert_eq!(FONT.glyph('#'), None);
        assert_eq!(FONT.glyph('\n'), None);
        assert_eq!(FONT.glyph('é'), None);
    }

    #[test]
    fn leftmost_pixel_is_the_top_bit() {
        assert!(is_set(0x8000, 0));
        assert!(!is_set(0x8000, 1));
        assert!(is_set(0x2000, 2));
        assert!(is_set(0x0001, 15));
        assert!(!is_set(0xFFFF, 16));
    }
}
