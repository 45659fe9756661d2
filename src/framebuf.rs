//! An off-screen framebuffer for `embedded-graphics` rendering.
//!
//! [`FrameBuf`] is a `DrawTarget` that stores RGB565 pixels as plain `u16`
//! values in a caller-provided slice. Render a scene into it with any
//! `embedded-graphics` primitive, then blit it with
//! [`Display::show_framebuf`](crate::Display::show_framebuf). The conversion to
//! wire order happens while the pixels stream out, so the same frame can be
//! shown any number of times.
//!
//! # Example
//!
//! ```
//! use embedded_graphics::pixelcolor::Rgb565;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::{Circle, PrimitiveStyle};
//! use st7735_dma::framebuf::FrameBuf;
//!
//! const WIDTH: usize = 32;
//! const HEIGHT: usize = 16;
//!
//! let mut pixels = [0u16; WIDTH * HEIGHT];
//! let mut fbuf = FrameBuf::new(&mut pixels[..], WIDTH, HEIGHT);
//!
//! fbuf.clear(Rgb565::BLACK).unwrap();
//! Circle::new(Point::new(8, 0), 16)
//!     .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
//!     .draw(&mut fbuf)
//!     .unwrap();
//!
//! assert_eq!(fbuf.width(), WIDTH);
//! assert_eq!(fbuf.pixel(16, 8), Some(0xF800));
//! assert_eq!(fbuf.pixel(0, 0), Some(0x0000));
//! ```

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::Rgb565,
    primitives::Rectangle,
    Pixel,
};

use crate::color;

/// A framebuffer of RGB565 pixels in row-major order.
pub struct FrameBuf<'a> {
    pixels: &'a mut [u16],
    width: usize,
    height: usize,
}

impl<'a> FrameBuf<'a> {
    /// Creates a new framebuffer.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` is shorter than `width * height`.
    pub fn new(pixels: &'a mut [u16], width: usize, height: usize) -> Self {
        let expected_len = width * height;
        assert!(
            pixels.len() >= expected_len,
            "FrameBuf pixel buffer is too small. Expected at least {}, got {}.",
            expected_len,
            pixels.len()
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Returns the width of the framebuffer in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the framebuffer in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at `(x, y)`, or `None` outside the framebuffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Returns the frame as a row-major pixel slice.
    pub fn as_pixels(&self) -> &[u16] {
        &self.pixels[..self.width * self.height]
    }

    /// Returns the frame as a mutable row-major pixel slice.
    pub fn as_mut_pixels(&mut self) -> &mut [u16] {
        &mut self.pixels[..self.width * self.height]
    }
}

impl OriginDimensions for FrameBuf<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuf<'_> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounding_box = self.bounding_box();
        let width = self.width;

        for Pixel(coord, color) in pixels {
            if bounding_box.contains(coord) {
                let index = coord.y as usize * width + coord.x as usize;
                self.pixels[index] = color::from_rgb565(color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.as_mut_pixels().fill(color::from_rgb565(color));
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = drawable_area.bottom_right() else {
            return Ok(());
        };

        let raw = color::from_rgb565(color);
        let x0 = drawable_area.top_left.x as usize;
        let x1 = bottom_right.x as usize + 1;
        for y in drawable_area.top_left.y as usize..=bottom_right.y as usize {
            let row = y * self.width;
            self.pixels[row + x0..row + x1].fill(raw);
        }
        Ok(())
    }
}
