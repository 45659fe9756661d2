#![no_std]
// associated re-typing not supported in rust yet
#![allow(clippy::type_complexity)]

//! Async driver for ST7735 TFT displays with buffered, DMA friendly pixel streaming.
//!
//! Drawing operations clip their geometry against the panel, set the controller's
//! address window and push pixels through a [`PixelStream`], which batches them
//! into one or two transmission buffers and lends full buffers to the
//! [`Interface`](interface::Interface) for asynchronous transfer.
//!
//! # Example
//!
//! ```
//! use st7735_dma::{color, options::{PanelVariant, Rotation}, Buffers, Builder};
//!
//! # tokio_test::block_on(async {
//! let mut front = [0u8; 512];
//! let mut back = [0u8; 512];
//! # let di = st7735_dma::_mock::MockInterface::new();
//! # let rst = st7735_dma::_mock::MockOutputPin::default();
//! # let delay = st7735_dma::_mock::MockDelay::default();
//!
//! let mut display = Builder::new(
//!     PanelVariant::Tft160x128,
//!     di,
//!     Buffers::Double(&mut front, &mut back),
//! )
//! .reset_pin(rst)
//! .rotation(Rotation::Deg90)
//! .init(delay)
//! .await
//! .unwrap();
//!
//! assert_eq!(display.size(), (160, 128));
//! display.fill_screen(color::BLACK).await.unwrap();
//! display.fill_rect(10, 10, 40, 20, color::rgb565(255, 128, 0)).await.unwrap();
//! # });
//! ```

#[cfg(test)]
extern crate std;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

pub mod interface;
use interface::Interface;

pub mod options;
use options::{Area, DisplayOptions, Geometry, Rotation};

mod builder;
pub use builder::*;

pub mod color;
pub mod dcs;
pub mod font;
pub use font::Font;
pub mod framebuf;

pub mod stream;
pub use stream::{Buffers, Error, PixelStream};

mod graphics;

pub mod _troubleshooting;

#[doc(hidden)]
pub mod _mock;

const SLEEP_IN_DELAY_MS: u32 = 5;
const SLEEP_OUT_DELAY_MS: u32 = 120;

///
/// Display driver for ST7735 TFT panels.
///
pub struct Display<'b, DI, D, RST>
where
    DI: Interface<'b>,
    D: DelayNs,
    RST: OutputPin,
{
    // Pixel stream, owns the interface and the delay
    stream: PixelStream<'b, DI, D>,
    // Reset pin
    rst: Option<RST>,
    // Options the display was built with, rotation kept current
    options: DisplayOptions,
    // Size and RAM offsets for the current rotation
    geometry: Geometry,
    inverted: bool,
    sleeping: bool,
}

impl<'b, DI, D, RST> Display<'b, DI, D, RST>
where
    DI: Interface<'b>,
    D: DelayNs,
    RST: OutputPin,
{
    ///
    /// Returns the current [options::DisplayOptions]
    ///
    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    /// Returns the current [Rotation].
    pub fn rotation(&self) -> Rotation {
        self.geometry.rotation
    }

    /// Returns the size and RAM offsets for the current rotation.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Visible `(width, height)` for the current rotation.
    pub fn size(&self) -> (u16, u16) {
        (self.geometry.width, self.geometry.height)
    }

    ///
    /// Sets the display [Rotation].
    ///
    /// Width, height and RAM offsets swap for 90 and 270 degree rotations.
    ///
    /// # Examples
    ///
    /// ```
    /// use st7735_dma::options::{PanelVariant, Rotation};
    ///
    /// # tokio_test::block_on(async {
    /// # let mut buffer = [0u8; 64];
    /// # let mut display = st7735_dma::Builder::new(
    /// #     PanelVariant::Tft160x80,
    /// #     st7735_dma::_mock::MockInterface::new(),
    /// #     st7735_dma::Buffers::Single(&mut buffer),
    /// # )
    /// # .init(st7735_dma::_mock::MockDelay::default())
    /// # .await
    /// # .unwrap();
    /// display.set_rotation(Rotation::from_index(1)).await.unwrap();
    /// assert_eq!(display.size(), (160, 80));
    /// # });
    /// ```
    pub async fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Error<DI::Error>> {
        self.stream.select()?;
        let result = self.apply_rotation(rotation).await;
        self.deselect_after(result)
    }

    /// Turns color inversion on or off.
    pub async fn invert_colors(&mut self, invert: bool) -> Result<(), Error<DI::Error>> {
        self.stream.select()?;
        let result = self.apply_inversion(invert).await;
        self.deselect_after(result)
    }

    /// Returns `true` if color inversion is on.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Starts transmission of any pixels still waiting in the stream.
    pub async fn flush(&mut self) -> Result<(), Error<DI::Error>> {
        self.stream.flush().await
    }

    /// Waits until the last transfer has completed, bounded by the stall timeout.
    pub async fn wait_idle(&mut self) -> Result<(), Error<DI::Error>> {
        self.stream.wait_idle().await
    }

    /// Returns `true` if no transfer is in flight.
    ///
    /// The buffer of a completed transfer is reclaimed by the next wait.
    pub fn is_idle(&self) -> bool {
        self.stream.is_idle()
    }

    /// Number of transfers that were forced idle after the stall timeout.
    pub fn stalls(&self) -> u32 {
        self.stream.stalls()
    }

    ///
    /// Returns `true` if display is currently set to sleep.
    ///
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    ///
    /// Puts the display to sleep, reducing power consumption.
    /// Need to call [Self::wake] before issuing other commands
    ///
    pub async fn sleep(&mut self) -> Result<(), Error<DI::Error>> {
        self.stream.select()?;
        let result = self.stream.send_command(dcs::SLPIN, &[]).await;
        if result.is_ok() {
            self.stream.delay_ms(SLEEP_IN_DELAY_MS).await;
            self.sleeping = true;
        }
        self.deselect_after(result)
    }

    ///
    /// Wakes the display after it's been set to sleep via [Self::sleep]
    ///
    pub async fn wake(&mut self) -> Result<(), Error<DI::Error>> {
        self.stream.select()?;
        let result = self.stream.send_command(dcs::SLPOUT, &[]).await;
        if result.is_ok() {
            self.stream.delay_ms(SLEEP_OUT_DELAY_MS).await;
            self.sleeping = false;
        }
        self.deselect_after(result)
    }

    ///
    /// Release resources allocated to this driver back.
    /// This returns the display interface, delay and reset pin, deconstructing the driver.
    ///
    pub fn release(self) -> (DI, D, Option<RST>) {
        let (di, delay) = self.stream.release();
        (di, delay, self.rst)
    }

    /// Returns the underlying pixel stream.
    ///
    /// # Safety
    ///
    /// Sending raw commands to the controller can lead to undefined behaviour,
    /// because the rest of the code isn't aware of any state changes that were
    /// caused by sending raw commands. The user must ensure that the state of the
    /// controller isn't altered in a way that interferes with the normal operation
    /// of this crate.
    pub unsafe fn stream(&mut self) -> &mut PixelStream<'b, DI, D> {
        &mut self.stream
    }

    // Releases the panel and returns the first error.
    fn deselect_after(
        &mut self,
        result: Result<(), Error<DI::Error>>,
    ) -> Result<(), Error<DI::Error>> {
        let deselected = self.stream.deselect();
        result.and(deselected)
    }

    // Sets the address window for the display and starts a memory write.
    async fn set_address_window(&mut self, area: Area) -> Result<(), Error<DI::Error>> {
        let [xs_hi, xs_lo] = (area.x + self.geometry.x_start).to_be_bytes();
        let [xe_hi, xe_lo] = (area.x_end() + self.geometry.x_start).to_be_bytes();
        let [ys_hi, ys_lo] = (area.y + self.geometry.y_start).to_be_bytes();
        let [ye_hi, ye_lo] = (area.y_end() + self.geometry.y_start).to_be_bytes();

        self.stream
            .send_command(dcs::CASET, &[xs_hi, xs_lo, xe_hi, xe_lo])
            .await?;
        self.stream
            .send_command(dcs::RASET, &[ys_hi, ys_lo, ye_hi, ye_lo])
            .await?;
        self.stream.send_command(dcs::RAMWR, &[]).await
    }

    async fn apply_rotation(&mut self, rotation: Rotation) -> Result<(), Error<DI::Error>> {
        let variant = self.options.variant;
        let madctl = rotation.madctl(variant.color_order());
        self.stream.send_command(dcs::MADCTL, &[madctl]).await?;
        self.geometry = Geometry::new(variant, rotation);
        self.options.rotation = rotation;
        Ok(())
    }

    async fn apply_inversion(&mut self, invert: bool) -> Result<(), Error<DI::Error>> {
        let command = if invert { dcs::INVON } else { dcs::INVOFF };
        self.stream.send_command(command, &[]).await?;
        self.inverted = invert;
        Ok(())
    }

    // Plays a packed init script.
    async fn run_script(&mut self, script: &[u8]) -> Result<(), Error<DI::Error>> {
        for frame in dcs::Script::new(script) {
            self.stream.send_command(frame.command, frame.params).await?;
            if let Some(ms) = frame.delay_ms {
                self.stream.delay_ms(u32::from(ms)).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::_mock::{MockDelay, MockError, MockInterface};
    use options::PanelVariant;
    use tokio_test::block_on;

    #[test]
    fn sleep_and_wake() {
        let mut buffer = [0u8; 16];
        let mut display = block_on(
            Builder::new(
                PanelVariant::Tft128x128,
                MockInterface::new(),
                Buffers::Single(&mut buffer),
            )
            .init(MockDelay::default()),
        )
        .unwrap();

        block_on(async {
            display.sleep().await.unwrap();
            assert!(display.is_sleeping());
            display.wake().await.unwrap();
            assert!(!display.is_sleeping());
        });

        let (di, delay, _) = display.release();
        let opcodes = di.opcodes();
        assert_eq!(&opcodes[opcodes.len() - 2..], &[dcs::SLPIN, dcs::SLPOUT]);
        assert_eq!(
            delay.elapsed_ms(),
            760 + u64::from(SLEEP_IN_DELAY_MS + SLEEP_OUT_DELAY_MS)
        );
    }

    #[test]
    fn failed_sleep_keeps_the_display_awake() {
        let mut buffer = [0u8; 16];
        let mut di = MockInterface::new();
        di.fail_next_wait(true);
        let mut display = block_on(
            Builder::new(PanelVariant::Tft128x128, di, Buffers::Single(&mut buffer))
                .init(MockDelay::default()),
        )
        .unwrap();

        block_on(async {
            display.set_pixel(1, 1, color::RED).await.unwrap();
            assert_eq!(display.sleep().await, Err(Error::Interface(MockError)));
            assert!(!display.is_sleeping());
            display.wake().await.unwrap();
        });

        let (di, _, _) = display.release();
        assert!(!di.is_selected());
        let opcodes = di.opcodes();
        assert!(!opcodes.contains(&dcs::SLPIN));
        assert_eq!(opcodes.last(), Some(&dcs::SLPOUT));
        // the failed transfer was abandoned
        assert!(di.data().is_empty());
    }

    #[test]
    fn inversion_and_rotation_are_tracked() {
        let mut buffer = [0u8; 16];
        let mut display = block_on(
            Builder::new(
                PanelVariant::Tft160x128,
                MockInterface::new(),
                Buffers::Single(&mut buffer),
            )
            .init(MockDelay::default()),
        )
        .unwrap();

        block_on(async {
            display.invert_colors(true).await.unwrap();
            display.set_rotation(Rotation::Deg270).await.unwrap();
        });
        assert!(display.is_inverted());
        assert_eq!(display.options().rotation, Rotation::Deg270);
        assert_eq!(display.size(), (160, 128));

        let (di, _, _) = display.release();
        let commands = di.commands();
        let tail = &commands[commands.len() - 2..];
        assert_eq!(tail[0].command, dcs::INVON);
        assert_eq!(tail[1].command, dcs::MADCTL);
        assert_eq!(tail[1].params.as_slice(), &[0x60]);
        assert!(!di.is_selected());
    }
}
