//! Drawing operations.
//!
//! Every operation clips its geometry against the panel first. Requests that
//! are entirely off-screen return before anything reaches the bus. The rest
//! select the panel, set the address window, stream their pixels, flush and
//! deselect.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::{
    font::{self, Font},
    framebuf::FrameBuf,
    interface::Interface,
    Display, Error,
};

impl<'b, DI, D, RST> Display<'b, DI, D, RST>
where
    DI: Interface<'b>,
    D: DelayNs,
    RST: OutputPin,
{
    /// Sets a single pixel.
    pub async fn set_pixel(&mut self, x: u16, y: u16, color: u16) -> Result<(), Error<DI::Error>> {
        self.fill_rect(x, y, 1, 1, color).await
    }

    /// Draws a horizontal line of `width` pixels starting at `(x, y)`.
    pub async fn draw_hline(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        color: u16,
    ) -> Result<(), Error<DI::Error>> {
        self.fill_rect(x, y, width, 1, color).await
    }

    /// Draws a vertical line of `height` pixels starting at `(x, y)`.
    pub async fn draw_vline(
        &mut self,
        x: u16,
        y: u16,
        height: u16,
        color: u16,
    ) -> Result<(), Error<DI::Error>> {
        self.fill_rect(x, y, 1, height, color).await
    }

    ///
    /// Fills a rectangle with a solid color.
    ///
    /// The parts of the rectangle outside the panel are dropped.
    ///
    pub async fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: u16,
    ) -> Result<(), Error<DI::Error>> {
        let Some(area) = self.geometry.clip(x, y, width, height) else {
            return Ok(());
        };

        self.stream.select()?;
        let result = async {
            self.set_address_window(area).await?;
            self.stream.push_repeated(color, area.pixel_count()).await
        }
        .await;
        self.finish(result).await
    }

    /// Fills the whole panel with a solid color.
    pub async fn fill_screen(&mut self, color: u16) -> Result<(), Error<DI::Error>> {
        let (width, height) = self.size();
        self.fill_rect(0, 0, width, height, color).await
    }

    ///
    /// Draws a `width` x `height` image of row-major RGB565 pixels at `(x, y)`.
    ///
    /// Rows and columns outside the panel are skipped. If `pixels` holds fewer
    /// than `height` full rows only the complete rows are drawn.
    ///
    pub async fn draw_image(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: &[u16],
    ) -> Result<(), Error<DI::Error>> {
        self.blit(x, y, usize::from(width), usize::from(height), pixels).await
    }

    /// Draws the contents of a [`FrameBuf`] with its top left corner at `(x, y)`.
    pub async fn show_framebuf(
        &mut self,
        x: u16,
        y: u16,
        framebuf: &FrameBuf<'_>,
    ) -> Result<(), Error<DI::Error>> {
        self.blit(
            x,
            y,
            framebuf.width(),
            framebuf.height(),
            framebuf.as_pixels(),
        )
        .await
    }

    ///
    /// Draws a single character with its top left corner at `(x, y)`.
    ///
    /// Set glyph pixels are drawn in `color`, the others in `background`.
    /// Characters the font does not cover are drawn as
    /// [`REPLACEMENT_CHAR`](font::REPLACEMENT_CHAR).
    ///
    pub async fn write_char(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        font: &Font<'_>,
        color: u16,
        background: u16,
    ) -> Result<(), Error<DI::Error>> {
        if self.geometry.clip(x, y, font.width(), font.height()).is_none() {
            return Ok(());
        }

        self.stream.select()?;
        let result = self.draw_glyph(x, y, ch, font, color, background).await;
        self.finish(result).await
    }

    ///
    /// Draws a string starting at `(x, y)`.
    ///
    /// The text wraps to the start of the next line when the next glyph would
    /// not fit horizontally, and drawing stops once a line would not fit
    /// vertically. A space that lands exactly on a wrap is dropped.
    ///
    pub async fn write_string(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        font: &Font<'_>,
        color: u16,
        background: u16,
    ) -> Result<(), Error<DI::Error>> {
        let (width, height) = self.size();
        let (glyph_width, glyph_height) = (font.width(), font.height());
        let (mut x, mut y) = (x, y);

        self.stream.select()?;
        let result = async {
            for ch in text.chars() {
                if x.saturating_add(glyph_width) > width {
                    x = 0;
                    y = y.saturating_add(glyph_height);
                    if y.saturating_add(glyph_height) > height {
                        break;
                    }
                    if ch == ' ' {
                        continue;
                    }
                }

                self.draw_glyph(x, y, ch, font, color, background).await?;
                x = x.saturating_add(glyph_width);
            }
            Ok::<_, Error<DI::Error>>(())
        }
        .await;
        self.finish(result).await
    }

    async fn blit(
        &mut self,
        x: u16,
        y: u16,
        stride: usize,
        rows: usize,
        pixels: &[u16],
    ) -> Result<(), Error<DI::Error>> {
        if stride == 0 {
            return Ok(());
        }
        let rows = rows.min(pixels.len() / stride);
        let width = u16::try_from(stride).unwrap_or(u16::MAX);
        let height = u16::try_from(rows).unwrap_or(u16::MAX);
        let Some(area) = self.geometry.clip(x, y, width, height) else {
            return Ok(());
        };

        self.stream.select()?;
        let result = async {
            self.set_address_window(area).await?;
            for row in pixels.chunks_exact(stride).take(usize::from(area.height)) {
                self.stream
                    .push_slice(&row[..usize::from(area.width)])
                    .await?;
            }
            Ok::<_, Error<DI::Error>>(())
        }
        .await;
        self.finish(result).await
    }

    // Streams one glyph, clipped to the panel. Expects the panel to be selected.
    async fn draw_glyph(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        font: &Font<'_>,
        color: u16,
        background: u16,
    ) -> Result<(), Error<DI::Error>> {
        let Some(area) = self.geometry.clip(x, y, font.width(), font.height()) else {
            return Ok(());
        };
        let glyph = font
            .glyph(ch)
            .or_else(|| font.glyph(font::REPLACEMENT_CHAR));

        self.set_address_window(area).await?;
        match glyph {
            Some(rows) => {
                for &bits in rows.iter().take(usize::from(area.height)) {
                    for column in 0..area.width {
                        let pixel = if font::is_set(bits, column) {
                            color
                        } else {
                            background
                        };
                        self.stream.push(pixel).await?;
                    }
                }
                Ok(())
            }
            None => {
                self.stream
                    .push_repeated(background, area.pixel_count())
                    .await
            }
        }
    }

    // Ends a drawing operation. The panel is deselected even if `result` is an error.
    async fn finish(
        &mut self,
        result: Result<(), Error<DI::Error>>,
    ) -> Result<(), Error<DI::Error>> {
        let result = match result {
            Ok(()) => self.drain().await,
            Err(e) => Err(e),
        };
        self.deselect_after(result)
    }

    async fn drain(&mut self) -> Result<(), Error<DI::Error>> {
        self.stream.flush().await?;
        if self.stream.is_deferred() {
            self.stream.wait_idle().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        _mock::{CommandRecord, MockDelay, MockError, MockInterface},
        color, dcs,
        options::{PanelVariant, Rotation},
        Buffers, Builder, NoResetPin,
    };
    use std::vec::Vec;
    use tokio_test::block_on;

    const fn test_glyphs() -> [u16; 70] {
        let mut data = [0u16; 70];
        let a = ('A' as usize - 32) * 2;
        data[a] = 0xFC00;
        data[a + 1] = 0xFC00;
        let q = ('?' as usize - 32) * 2;
        data[q] = 0x8000;
        data
    }

    // 6x2 glyphs from ' ' to 'B', 'A' fully set, '?' has its top left pixel set
    const GLYPHS: [u16; 70] = test_glyphs();
    const FONT: Font<'static> = Font::new(6, 2, &GLYPHS);

    fn init<'b>(
        variant: PanelVariant,
        rotation: Rotation,
        di: MockInterface<'b>,
        buffers: Buffers<'b>,
    ) -> Display<'b, MockInterface<'b>, MockDelay, NoResetPin> {
        block_on(
            Builder::new(variant, di, buffers)
                .rotation(rotation)
                .init(MockDelay::default()),
        )
        .unwrap()
    }

    // Commands sent after the last rotation change.
    fn drawn(commands: &[CommandRecord]) -> &[CommandRecord] {
        let start = commands
            .iter()
            .rposition(|record| record.command == dcs::MADCTL)
            .map_or(0, |index| index + 1);
        &commands[start..]
    }

    // [x0, x1, y0, y1] of every address window.
    fn windows(commands: &[CommandRecord]) -> Vec<[u16; 4]> {
        commands
            .windows(2)
            .filter(|pair| pair[0].command == dcs::CASET && pair[1].command == dcs::RASET)
            .map(|pair| {
                let (c, r) = (&pair[0].params, &pair[1].params);
                [
                    u16::from_be_bytes([c[0], c[1]]),
                    u16::from_be_bytes([c[2], c[3]]),
                    u16::from_be_bytes([r[0], r[1]]),
                    u16::from_be_bytes([r[2], r[3]]),
                ]
            })
            .collect()
    }

    #[test]
    fn off_screen_requests_send_nothing() {
        let mut buffer = [0u8; 32];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Single(&mut buffer),
        );
        assert_eq!(display.size(), (128, 160));

        block_on(async {
            display.fill_rect(128, 0, 5, 5, color::RED).await.unwrap();
            display.fill_rect(0, 160, 5, 5, color::RED).await.unwrap();
            display.set_pixel(200, 3, color::RED).await.unwrap();
            display.draw_hline(0, 0, 0, color::RED).await.unwrap();
            display.draw_image(130, 0, 2, 1, &[1, 2]).await.unwrap();
            display
                .write_char(0, 159, 'A', &FONT, color::WHITE, color::BLACK)
                .await
                .unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        // the glyph at row 159 is clipped to its first row
        assert_eq!(windows(drawn(di.commands())), &[[0, 5, 159, 159]]);
        assert_eq!(di.selections(), 2);
        assert_eq!(di.bytes_sent(), 12);
    }

    #[test]
    fn partially_visible_rect_is_clamped() {
        let mut front = [0u8; 32];
        let mut back = [0u8; 32];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Double(&mut front, &mut back),
        );

        block_on(async {
            display.fill_rect(120, 150, 20, 20, color::RED).await.unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        let commands = drawn(di.commands());
        assert_eq!(
            commands.iter().map(|r| r.command).collect::<Vec<_>>(),
            &[dcs::CASET, dcs::RASET, dcs::RAMWR]
        );
        assert_eq!(windows(commands), &[[120, 127, 150, 159]]);
        assert_eq!(di.bytes_sent(), 8 * 10 * 2);
        assert!(di.data().chunks(2).all(|pixel| pixel == [0xF8, 0x00]));
        assert!(!di.is_selected());
    }

    #[test]
    fn windows_include_the_ram_offset() {
        let mut buffer = [0u8; 8];
        let mut display = init(
            PanelVariant::Tft128x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Single(&mut buffer),
        );

        block_on(async {
            display.set_pixel(0, 0, color::BLUE).await.unwrap();
            display.draw_vline(127, 10, 200, color::BLUE).await.unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        assert_eq!(
            windows(drawn(di.commands())),
            &[[2, 2, 3, 3], [129, 129, 13, 130]]
        );
        assert_eq!(di.bytes_sent(), (1 + 118) * 2);
    }

    #[test]
    fn quarter_turn_on_mini_panel() {
        let mut front = [0u8; 256];
        let mut back = [0u8; 256];
        let mut display = init(
            PanelVariant::Tft160x80,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Double(&mut front, &mut back),
        );
        assert_eq!(display.size(), (80, 160));

        block_on(async {
            display.set_rotation(Rotation::from_index(1)).await.unwrap();
            display.fill_screen(color::GREEN).await.unwrap();
            display.wait_idle().await.unwrap();
        });
        assert_eq!(display.size(), (160, 80));
        assert_eq!(display.rotation(), Rotation::Deg90);

        let (di, _, _) = display.release();
        assert_eq!(windows(drawn(di.commands())), &[[0, 159, 24, 103]]);
        assert_eq!(di.bytes_sent(), 160 * 80 * 2);
        assert_eq!(di.transfers(), 160 * 80 / 128);
    }

    #[test]
    fn image_is_clipped_per_row() {
        let mut buffer = [0u8; 64];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Single(&mut buffer),
        );
        let image: [u16; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

        block_on(async {
            // five rows requested, three available
            display.draw_image(126, 0, 4, 5, &image).await.unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        assert_eq!(windows(drawn(di.commands())), &[[126, 127, 0, 2]]);
        assert_eq!(di.data(), &[0, 1, 0, 2, 0, 5, 0, 6, 0, 9, 0, 10]);
    }

    #[test]
    fn framebuf_is_streamed_row_by_row() {
        let mut buffer = [0u8; 64];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Single(&mut buffer),
        );
        let mut pixels: [u16; 4] = [0x1111, 0x2222, 0x3333, 0x4444];
        let framebuf = FrameBuf::new(&mut pixels, 2, 2);

        block_on(async {
            display.show_framebuf(10, 20, &framebuf).await.unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        assert_eq!(windows(drawn(di.commands())), &[[10, 11, 20, 21]]);
        assert_eq!(
            di.data(),
            &[0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44]
        );
    }

    #[test]
    fn text_wraps_and_drops_the_space_at_the_wrap() {
        let mut front = [0u8; 64];
        let mut back = [0u8; 64];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg90,
            MockInterface::new(),
            Buffers::Double(&mut front, &mut back),
        );
        assert_eq!(display.size(), (160, 128));

        block_on(async {
            display
                .write_string(
                    0,
                    0,
                    "AAAAAAAAAAAAAAAAAAAAAAAAAA B",
                    &FONT,
                    color::WHITE,
                    color::BLACK,
                )
                .await
                .unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        let windows = windows(drawn(di.commands()));
        assert_eq!(windows.len(), 27);
        assert_eq!(windows[25], [150, 155, 0, 1]);
        assert_eq!(windows[26], [0, 5, 2, 3]);

        let data = di.data();
        assert_eq!(data.len(), 27 * 12 * 2);
        assert!(data[..26 * 24].iter().all(|&byte| byte == 0xFF));
        assert!(data[26 * 24..].iter().all(|&byte| byte == 0x00));
        assert_eq!(di.selections(), 2);
    }

    #[test]
    fn text_stops_at_the_bottom() {
        static TALL: [u16; 80] = [0; 80];
        let tall = Font::new(16, 40, &TALL);

        let mut front = [0u8; 256];
        let mut back = [0u8; 256];
        let mut display = init(
            PanelVariant::Tft160x80,
            Rotation::Deg90,
            MockInterface::new(),
            Buffers::Double(&mut front, &mut back),
        );

        block_on(async {
            display
                .write_string(0, 0, "!!!!!!!!!!!!!!!!!!!!!!!!!", &tall, color::WHITE, color::BLACK)
                .await
                .unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        let windows = windows(drawn(di.commands()));
        assert_eq!(windows.len(), 20);
        assert_eq!(windows[19], [144, 159, 24 + 40, 24 + 79]);
        assert_eq!(di.bytes_sent(), 20 * 16 * 40 * 2);
    }

    #[test]
    fn unknown_characters_use_the_replacement_glyph() {
        let mut buffer = [0u8; 64];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Single(&mut buffer),
        );

        block_on(async {
            display
                .write_char(0, 0, 'é', &FONT, color::WHITE, color::BLACK)
                .await
                .unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        let data = di.data();
        assert_eq!(&data[..2], &[0xFF, 0xFF]);
        assert!(data[2..].iter().all(|&byte| byte == 0x00));
        assert_eq!(data.len(), 24);
    }

    #[test]
    fn deferred_interfaces_finish_before_returning() {
        let mut buffer = [0u8; 64];
        let mut di = MockInterface::new();
        di.defer(true);
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            di,
            Buffers::Single(&mut buffer),
        );

        block_on(display.fill_rect(0, 0, 4, 4, color::CYAN)).unwrap();
        assert!(display.is_idle());

        let (di, _, _) = display.release();
        assert_eq!(di.bytes_sent(), 32);
    }

    #[test]
    fn background_interfaces_keep_the_last_transfer_in_flight() {
        let mut buffer = [0u8; 64];
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            MockInterface::new(),
            Buffers::Single(&mut buffer),
        );

        block_on(display.fill_rect(0, 0, 4, 4, color::CYAN)).unwrap();
        assert!(!display.is_idle());

        block_on(display.wait_idle()).unwrap();
        assert!(display.is_idle());
    }

    #[test]
    fn failed_transfer_still_releases_the_panel() {
        let mut buffer = [0u8; 4];
        let mut di = MockInterface::new();
        di.fail_next_wait(true);
        let mut display = init(
            PanelVariant::Tft160x128,
            Rotation::Deg0,
            di,
            Buffers::Single(&mut buffer),
        );

        block_on(async {
            let result = display.fill_rect(0, 0, 2, 2, color::RED).await;
            assert_eq!(result, Err(Error::Interface(MockError)));

            display.set_pixel(5, 5, color::GREEN).await.unwrap();
            display.wait_idle().await.unwrap();
        });

        let (di, _, _) = display.release();
        assert!(!di.is_selected());
        assert_eq!(di.selections(), 3);
        assert_eq!(windows(drawn(di.commands())), &[[0, 1, 0, 1], [5, 5, 5, 5]]);
        assert_eq!(di.data(), &[0x07, 0xE0]);
    }
}
