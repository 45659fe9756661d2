//! [super::Display] builder module

use core::convert::Infallible;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::{
    dcs,
    interface::Interface,
    options::{Geometry, PanelVariant, Rotation},
    stream::{Buffers, Error, PixelStream},
    Display, DisplayOptions,
};

const RESET_PULSE_MS: u32 = 5;
const RESET_SETTLE_MS: u32 = 5;

/// Builder for [Display] instances.
///
/// Exposes all possible display options.
///
/// # Examples
///
/// ```
/// use st7735_dma::{Builder, Buffers, options::{PanelVariant, Rotation}};
///
/// # tokio_test::block_on(async {
/// let mut buffer = [0u8; 256];
/// # let di = st7735_dma::_mock::MockInterface::new();
/// # let rst = st7735_dma::_mock::MockOutputPin::default();
/// # let delay = st7735_dma::_mock::MockDelay::default();
/// let mut display = Builder::new(PanelVariant::Tft128x128, di, Buffers::Single(&mut buffer))
///     .reset_pin(rst)
///     .rotation(Rotation::Deg180)
///     .invert_colors(false)
///     .stall_timeout_us(50_000)
///     .init(delay)
///     .await
///     .unwrap();
/// # });
/// ```
pub struct Builder<'b, DI, RST>
where
    DI: Interface<'b>,
    RST: OutputPin,
{
    di: DI,
    rst: Option<RST>,
    buffers: Buffers<'b>,
    options: DisplayOptions,
}

impl<'b, DI> Builder<'b, DI, NoResetPin>
where
    DI: Interface<'b>,
{
    ///
    /// Constructs a new builder for the given panel variant, interface and
    /// transmission buffers.
    ///
    #[must_use]
    pub fn new(variant: PanelVariant, di: DI, buffers: Buffers<'b>) -> Self {
        Self {
            di,
            rst: None,
            buffers,
            options: DisplayOptions::new(variant),
        }
    }
}

impl<'b, DI, RST> Builder<'b, DI, RST>
where
    DI: Interface<'b>,
    RST: OutputPin,
{
    ///
    /// Sets the initial [Rotation].
    ///
    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.options.rotation = rotation;
        self
    }

    ///
    /// Turns color inversion on or off after the init sequence.
    ///
    /// Without this call the panel keeps the inversion its init sequence sets,
    /// which is on for [PanelVariant::Tft160x80] and off otherwise.
    ///
    #[must_use]
    pub fn invert_colors(mut self, invert: bool) -> Self {
        self.options.invert_colors = Some(invert);
        self
    }

    ///
    /// Sets how long a single transfer may take before it is forced idle.
    ///
    #[must_use]
    pub fn stall_timeout_us(mut self, timeout_us: u32) -> Self {
        self.options.stall_timeout_us = timeout_us;
        self
    }

    /// Sets the reset pin.
    ///
    /// ### WARNING
    /// The reset pin needs to be in *high* state in order for the display to operate.
    /// If it wasn't provided the user needs to ensure this is the case.
    ///
    #[must_use]
    pub fn reset_pin<RST2: OutputPin>(self, rst: RST2) -> Builder<'b, DI, RST2> {
        Builder {
            di: self.di,
            rst: Some(rst),
            buffers: self.buffers,
            options: self.options,
        }
    }

    ///
    /// Consumes the builder to create a new [Display] with an optional reset [OutputPin].
    /// Blocks using the provided [DelayNs] `delay` to perform the display initialization.
    /// The delay is kept by the display to bound transfer waits.
    ///
    pub async fn init<D: DelayNs>(
        self,
        delay: D,
    ) -> Result<Display<'b, DI, D, RST>, InitError<DI::Error, RST::Error>> {
        let Self {
            di,
            rst,
            buffers,
            options,
        } = self;
        let variant = options.variant;

        let mut display = Display {
            stream: PixelStream::new(di, delay, buffers, options.stall_timeout_us),
            rst,
            options,
            geometry: Geometry::new(variant, options.rotation),
            inverted: false,
            sleeping: false,
        };

        display.stream.select()?;
        let result = async {
            if let Some(rst) = display.rst.as_mut() {
                rst.set_low().map_err(InitError::ResetPin)?;
                display.stream.delay_ms(RESET_PULSE_MS).await;
                rst.set_high().map_err(InitError::ResetPin)?;
                display.stream.delay_ms(RESET_SETTLE_MS).await;
            }

            display.run_script(dcs::INIT_SCRIPT_1).await?;
            display.run_script(variant.window_script()).await?;
            display.run_script(dcs::INIT_SCRIPT_3).await?;
            display.inverted = variant == PanelVariant::Tft160x80;

            if let Some(madctl) = variant.initial_madctl() {
                display.stream.send_command(dcs::MADCTL, &[madctl]).await?;
            }
            if let Some(invert) = options.invert_colors {
                display.apply_inversion(invert).await?;
            }
            display.apply_rotation(options.rotation).await?;
            Ok::<_, InitError<DI::Error, RST::Error>>(())
        }
        .await;

        let deselected = display.stream.deselect();
        result?;
        deselected?;

        Ok(display)
    }
}

///
/// Error returned by [Builder::init].
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError<DI, P> {
    /// Error caused by the display interface or the pixel stream.
    Interface(Error<DI>),
    /// Error caused by the reset pin's [`OutputPin`] implementation.
    ResetPin(P),
}

impl<DI, P> From<Error<DI>> for InitError<DI, P> {
    fn from(value: Error<DI>) -> Self {
        Self::Interface(value)
    }
}

///
/// Marker type for no reset pin.
///
pub enum NoResetPin {}

impl digital::OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl digital::ErrorType for NoResetPin {
    type Error = Infallible;
}
