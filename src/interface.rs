//! Interface traits and implementations

mod spi;
pub use spi::*;

use core::future::Future;

/// Command and transfer interface
///
/// Models the transport between the driver and the controller: a bus-blocking
/// command write plus an asynchronous block transfer with a busy state. At most
/// one transfer is in flight at any time.
///
/// Transmission buffers are lent to the interface by ownership: [`begin_send`](Self::begin_send)
/// takes the buffer and the interface hands it back from [`wait_idle`](Self::wait_idle)
/// or [`force_idle`](Self::force_idle). An implementation must always return the
/// buffer it was given.
pub trait Interface<'b> {
    /// Error type
    type Error: core::fmt::Debug;

    /// Send a command with optional parameters.
    ///
    /// The data/command line is low for the opcode and high for the parameters.
    /// Must not be called while a transfer is in flight.
    fn send_command(
        &mut self,
        command: u8,
        args: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Begin transmitting the first `len` bytes of `buffer` as pixel data.
    ///
    /// `WriteMemoryStart` (RAMWR) must be sent before the first transfer of a
    /// drawing operation. Calling this while busy is a contract violation and
    /// must be rejected with an error. A buffer passed to a rejected call is
    /// only recovered if [`force_idle`](Self::force_idle) returns it.
    fn begin_send(&mut self, buffer: &'b mut [u8], len: usize) -> Result<(), Self::Error>;

    /// Returns `true` if no transfer is in flight.
    fn is_idle(&self) -> bool;

    /// Resolves once the in-flight transfer has completed.
    ///
    /// Returns the lent buffer, or `None` if nothing was in flight. If the
    /// returned future is dropped before completion the transfer stays
    /// in flight.
    fn wait_idle(
        &mut self,
    ) -> impl Future<Output = Result<Option<&'b mut [u8]>, Self::Error>>;

    /// Abandon the in-flight transfer and clear the busy state.
    ///
    /// Used when a completion never arrived. The returned buffer may still be
    /// read by stalled hardware, which can show up as corrupted pixels but
    /// never as a hang.
    fn force_idle(&mut self) -> Option<&'b mut [u8]>;

    /// Returns `true` if a transfer only makes progress while
    /// [`wait_idle`](Self::wait_idle) is awaited.
    ///
    /// Drawing operations wait for the last transfer of such interfaces before
    /// they return.
    fn is_deferred(&self) -> bool {
        false
    }

    /// Assert chip select before a drawing operation.
    ///
    /// Bus devices that frame every transaction themselves keep the default.
    fn select(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Release chip select after a drawing operation.
    ///
    /// Must not cut off a transfer that is still in flight.
    fn deselect(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<'b, T: Interface<'b> + ?Sized> Interface<'b> for &mut T {
    type Error = T::Error;

    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error> {
        T::send_command(self, command, args).await
    }

    fn begin_send(&mut self, buffer: &'b mut [u8], len: usize) -> Result<(), Self::Error> {
        T::begin_send(self, buffer, len)
    }

    fn is_idle(&self) -> bool {
        T::is_idle(self)
    }

    async fn wait_idle(&mut self) -> Result<Option<&'b mut [u8]>, Self::Error> {
        T::wait_idle(self).await
    }

    fn force_idle(&mut self) -> Option<&'b mut [u8]> {
        T::force_idle(self)
    }

    fn is_deferred(&self) -> bool {
        T::is_deferred(self)
    }

    fn select(&mut self) -> Result<(), Self::Error> {
        T::select(self)
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        T::deselect(self)
    }
}
