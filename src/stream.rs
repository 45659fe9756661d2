//! Buffered pixel streaming.
//!
//! [`PixelStream`] collects pixels into fixed transmission buffers, converting
//! each one to the panel's big-endian wire order, and lends full buffers to the
//! [`Interface`] for asynchronous transfer.
//!
//! With [`Buffers::Single`] the producer waits for the previous transfer before
//! it can reuse the only buffer. With [`Buffers::Double`] the producer fills one
//! buffer while the other one is on the wire, and the two swap on every flush.
//!
//! A buffer that is lent to the interface is owned by it until the interface
//! hands it back, so the stream can never overwrite pixels that are still being
//! transmitted.

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;

use crate::color;
use crate::interface::Interface;

/// Errors reported by the stream and the drawing operations built on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The interface reported an error
    Interface(E),
    /// The interface did not return a lent buffer
    BufferLost,
}

/// Transmission buffers handed to the stream.
///
/// Each buffer holds `len / 2` pixels. In double mode the smaller of the two
/// determines the capacity.
pub enum Buffers<'b> {
    /// One buffer, the producer stalls on every flush
    Single(&'b mut [u8]),
    /// Two buffers, filled and transmitted alternately
    Double(&'b mut [u8], &'b mut [u8]),
}

impl Buffers<'_> {
    fn capacity(&self) -> usize {
        match self {
            Self::Single(buffer) => buffer.len() / 2,
            Self::Double(front, back) => front.len().min(back.len()) / 2,
        }
    }
}

/// Pixel accumulator in front of an [`Interface`].
pub struct PixelStream<'b, DI, D> {
    di: DI,
    delay: D,
    slots: [Option<&'b mut [u8]>; 2],
    double: bool,
    // slot the producer writes into
    active: usize,
    // slot currently lent to the interface
    in_flight: Option<usize>,
    // pixels written into the active slot
    cursor: usize,
    capacity: usize,
    stall_timeout_us: u32,
    stalls: u32,
    transfers: u32,
}

impl<'b, DI, D> PixelStream<'b, DI, D>
where
    DI: Interface<'b>,
    D: DelayNs,
{
    /// Creates a new stream.
    ///
    /// # Panics
    ///
    /// Panics if a buffer cannot hold at least one pixel.
    pub fn new(di: DI, delay: D, buffers: Buffers<'b>, stall_timeout_us: u32) -> Self {
        let capacity = buffers.capacity();
        assert!(
            capacity > 0,
            "PixelStream buffers are too small. Expected at least 2 bytes each."
        );
        let (slots, double) = match buffers {
            Buffers::Single(buffer) => ([Some(buffer), None], false),
            Buffers::Double(front, back) => ([Some(front), Some(back)], true),
        };
        Self {
            di,
            delay,
            slots,
            double,
            active: 0,
            in_flight: None,
            cursor: 0,
            capacity,
            stall_timeout_us,
            stalls: 0,
            transfers: 0,
        }
    }

    /// Number of pixels a buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pixels waiting in the active buffer.
    pub fn pending(&self) -> usize {
        self.cursor
    }

    /// Returns `true` if both buffers are in use.
    pub fn is_double_buffered(&self) -> bool {
        self.double
    }

    /// Returns `true` if no transfer is in flight.
    ///
    /// A completed transfer counts as idle even though its buffer is only
    /// reclaimed by the next [`wait_idle`](Self::wait_idle).
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() || self.di.is_idle()
    }

    /// Number of transfers that had to be forced idle after a timeout.
    pub fn stalls(&self) -> u32 {
        self.stalls
    }

    /// Number of transfers started so far.
    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    /// Bound for a single transfer, in microseconds.
    pub fn stall_timeout_us(&self) -> u32 {
        self.stall_timeout_us
    }

    /// Appends a pixel, flushing when the buffer becomes full.
    pub async fn push(&mut self, color: u16) -> Result<(), Error<DI::Error>> {
        // a full buffer is left behind when its flush failed
        if self.cursor == self.capacity {
            self.flush().await?;
        }
        let offset = self.cursor * 2;
        let buffer = self.producer_buffer().await?;
        buffer[offset..offset + 2].copy_from_slice(&color::to_wire(color));
        self.cursor += 1;
        if self.cursor == self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Appends `count` copies of `color`.
    pub async fn push_repeated(
        &mut self,
        color: u16,
        mut count: usize,
    ) -> Result<(), Error<DI::Error>> {
        let wire = color::to_wire(color);
        while count > 0 {
            let start = self.cursor;
            let run = count.min(self.capacity - start);
            let buffer = self.producer_buffer().await?;
            for chunk in buffer[start * 2..(start + run) * 2].chunks_exact_mut(2) {
                chunk.copy_from_slice(&wire);
            }
            self.cursor += run;
            count -= run;
            if self.cursor == self.capacity {
                self.flush().await?;
            }
        }
        Ok(())
    }

    /// Appends every pixel of `colors` in order.
    pub async fn push_slice(&mut self, mut colors: &[u16]) -> Result<(), Error<DI::Error>> {
        while !colors.is_empty() {
            let start = self.cursor;
            let run = colors.len().min(self.capacity - start);
            let (head, tail) = colors.split_at(run);
            let buffer = self.producer_buffer().await?;
            for (chunk, &color) in buffer[start * 2..(start + run) * 2]
                .chunks_exact_mut(2)
                .zip(head)
            {
                chunk.copy_from_slice(&color::to_wire(color));
            }
            self.cursor += run;
            colors = tail;
            if self.cursor == self.capacity {
                self.flush().await?;
            }
        }
        Ok(())
    }

    /// Lends the active buffer to the interface.
    ///
    /// Does nothing if no pixels are pending. Otherwise waits for the previous
    /// transfer, starts a new one and, with two buffers, switches the producer
    /// to the other buffer. The transfer is still in flight when this returns.
    pub async fn flush(&mut self) -> Result<(), Error<DI::Error>> {
        if self.cursor == 0 {
            return Ok(());
        }
        self.wait_idle().await?;

        let slot = self.active;
        let len = self.cursor * 2;
        self.cursor = 0;
        let buffer = self.slots[slot].take().ok_or(Error::BufferLost)?;
        if self.double {
            self.active ^= 1;
        }

        self.in_flight = Some(slot);
        self.transfers = self.transfers.wrapping_add(1);
        if let Err(e) = self.di.begin_send(buffer, len) {
            self.in_flight = None;
            self.slots[slot] = self.di.force_idle();
            return Err(Error::Interface(e));
        }
        Ok(())
    }

    /// Waits until the in-flight transfer has completed.
    ///
    /// The wait is bounded by the stall timeout. When it expires the transfer is
    /// forced idle, the stall is counted and the buffer is reclaimed, so this
    /// never hangs on a lost completion.
    pub async fn wait_idle(&mut self) -> Result<(), Error<DI::Error>> {
        let Some(slot) = self.in_flight else {
            return Ok(());
        };

        let timeout_us = self.stall_timeout_us;
        let outcome = select(self.di.wait_idle(), self.delay.delay_us(timeout_us)).await;
        let (returned, result) = match outcome {
            Either::First(Ok(buffer)) => (buffer, Ok(())),
            Either::First(Err(e)) => (self.di.force_idle(), Err(Error::Interface(e))),
            Either::Second(()) => {
                self.stalls = self.stalls.saturating_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "transfer stalled for {=u32} us, forcing idle ({=u32} stalls)",
                    timeout_us,
                    self.stalls
                );
                (self.di.force_idle(), Ok(()))
            }
        };

        self.in_flight = None;
        match returned {
            Some(buffer) => self.slots[slot] = Some(buffer),
            None => return Err(Error::BufferLost),
        }
        result
    }

    /// Sends a command once every pending pixel has been transmitted.
    pub async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Error<DI::Error>> {
        self.flush().await?;
        self.wait_idle().await?;
        self.di
            .send_command(command, args)
            .await
            .map_err(Error::Interface)
    }

    /// Waits `ms` milliseconds.
    pub async fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    pub(crate) fn is_deferred(&self) -> bool {
        self.di.is_deferred()
    }

    pub(crate) fn select(&mut self) -> Result<(), Error<DI::Error>> {
        self.di.select().map_err(Error::Interface)
    }

    pub(crate) fn deselect(&mut self) -> Result<(), Error<DI::Error>> {
        self.di.deselect().map_err(Error::Interface)
    }

    /// Returns the interface and the delay provider.
    ///
    /// A transfer that is still in flight keeps its buffer inside the interface.
    pub fn release(self) -> (DI, D) {
        (self.di, self.delay)
    }

    // Waits for the producer buffer when it is still lent out.
    async fn producer_buffer(&mut self) -> Result<&mut [u8], Error<DI::Error>> {
        if self.slots[self.active].is_none() {
            self.wait_idle().await?;
        }
        self.slots[self.active]
            .as_deref_mut()
            .ok_or(Error::BufferLost)
    }
}
