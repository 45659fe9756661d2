//! RGB565 helpers.
//!
//! Colors are plain `u16` values in host byte order. The conversion to the
//! panel's big-endian wire order happens once, when a pixel enters the
//! [`PixelStream`](crate::stream::PixelStream).

use embedded_graphics_core::pixelcolor::{
    raw::{RawData, RawU16},
    Rgb565,
};

/// Black
pub const BLACK: u16 = 0x0000;
/// White
pub const WHITE: u16 = 0xFFFF;
/// Red
pub const RED: u16 = 0xF800;
/// Green
pub const GREEN: u16 = 0x07E0;
/// Blue
pub const BLUE: u16 = 0x001F;
/// Cyan
pub const CYAN: u16 = 0x07FF;
/// Magenta
pub const MAGENTA: u16 = 0xF81F;
/// Yellow
pub const YELLOW: u16 = 0xFFE0;

/// Packs an 8 bit per channel color into RGB565.
///
/// Keeps the top 5 bits of red, 6 of green and 5 of blue.
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Swaps the two bytes of a pixel.
pub const fn swap(color: u16) -> u16 {
    color.swap_bytes()
}

/// Bytes of `color` in transmission order, high byte first.
pub const fn to_wire(color: u16) -> [u8; 2] {
    color.to_be_bytes()
}

/// Raw RGB565 value of an `embedded-graphics` color.
pub fn from_rgb565(color: Rgb565) -> u16 {
    RawU16::from(color).into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics_core::pixelcolor::RgbColor;

    #[test]
    fn packs_top_bits() {
        assert_eq!(rgb565(255, 0, 0), RED);
        assert_eq!(rgb565(0, 255, 0), GREEN);
        assert_eq!(rgb565(0, 0, 255), BLUE);
        assert_eq!(rgb565(255, 255, 255), WHITE);
        assert_eq!(rgb565(0x07, 0x03, 0x07), BLACK);
        assert_eq!(rgb565(0x12, 0x34, 0x56), 0x11AA);
    }

    #[test]
    fn swap_is_self_inverse() {
        for color in [0x0000, 0x00FF, 0x1234, 0xF800, 0xABCD, 0xFFFF] {
            assert_eq!(swap(swap(color)), color);
        }
        assert_eq!(swap(0x1234), 0x3412);
    }

    #[test]
    fn wire_order_is_big_endian() {
        assert_eq!(to_wire(0xF81F), [0xF8, 0x1F]);
        assert_eq!(u16::from_be_bytes(to_wire(0x1234)), 0x1234);
    }

    #[test]
    fn matches_embedded_graphics() {
        assert_eq!(from_rgb565(Rgb565::RED), RED);
        assert_eq!(from_rgb565(Rgb565::new(0, 63, 0)), GREEN);
        assert_eq!(from_rgb565(Rgb565::WHITE), WHITE);
    }
}
