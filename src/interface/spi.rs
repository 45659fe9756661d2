//!
//! Async SPI interface for the ST7735.
//!
//! This module provides an implementation of the [`Interface`] trait on top of an
//! `embedded-hal-async` [`SpiDevice`] and a data/command (DC) output pin.
//!
//! The SPI device frames every transaction with chip select, so [`Interface::select`]
//! and [`Interface::deselect`] keep their default no-op behaviour. A lent buffer is
//! transmitted when [`Interface::wait_idle`] is awaited, so drawing operations wait
//! for their last transfer before returning. This makes the interface portable to
//! any async SPI driver at the cost of not overlapping pixel generation with
//! transmission. Platform DMA engines that run on their own should implement
//! [`Interface`] directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use st7735_dma::interface::SpiInterface;
//!
//! let spi = /* your async SPI device */;
//! let dc = /* your DC OutputPin */;
//! let mut iface = SpiInterface::new(spi, dc);
//! // Use iface with the display builder
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiDevice;

use super::Interface;

/// Error type for the async SPI interface.
///
/// Wraps errors from the SPI bus or the data/command (DC) pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError<SPI, DC> {
    /// SPI bus error
    Spi(SPI),
    /// Data/command pin error
    Dc(DC),
    /// A transfer was started while another one was still pending
    Busy,
}

/// Async SPI interface for the ST7735.
///
/// Use [`SpiInterface::new`] to construct, and [`SpiInterface::release`] to deconstruct and
/// recover the SPI and DC resources.
pub struct SpiInterface<'b, SPI, DC> {
    spi: SPI,
    dc: DC,
    pending: Option<(&'b mut [u8], usize)>,
}

impl<'b, SPI, DC> SpiInterface<'b, SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    /// Create a new async SPI interface from an SPI device and DC pin.
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self {
            spi,
            dc,
            pending: None,
        }
    }

    /// Release the DC pin and SPI peripheral back, deconstructing the interface.
    ///
    /// A pending transfer is discarded.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

impl<'b, SPI, DC> Interface<'b> for SpiInterface<'b, SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    type Error = SpiError<SPI::Error, DC::Error>;

    /// Send a command and its arguments to the display controller.
    ///
    /// The DC pin is set low for the command byte, then high for the argument bytes.
    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(SpiError::Dc)?;
        self.spi.write(&[command]).await.map_err(SpiError::Spi)?;
        self.dc.set_high().map_err(SpiError::Dc)?;
        if !args.is_empty() {
            self.spi.write(args).await.map_err(SpiError::Spi)?;
        }
        Ok(())
    }

    fn begin_send(&mut self, buffer: &'b mut [u8], len: usize) -> Result<(), Self::Error> {
        if self.pending.is_some() {
            return Err(SpiError::Busy);
        }
        let len = len.min(buffer.len());
        self.pending = Some((buffer, len));
        Ok(())
    }

    fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    async fn wait_idle(&mut self) -> Result<Option<&'b mut [u8]>, Self::Error> {
        if let Some((buffer, len)) = &self.pending {
            self.dc.set_high().map_err(SpiError::Dc)?;
            self.spi
                .write(&buffer[..*len])
                .await
                .map_err(SpiError::Spi)?;
        }
        Ok(self.pending.take().map(|(buffer, _)| buffer))
    }

    fn force_idle(&mut self) -> Option<&'b mut [u8]> {
        self.pending.take().map(|(buffer, _)| buffer)
    }

    fn is_deferred(&self) -> bool {
        true
    }
}
