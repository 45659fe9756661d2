//! Recording test doubles used by the unit tests and documentation examples.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::interface::Interface;

/// Number of commands a [`MockInterface`] remembers.
pub const COMMAND_LOG: usize = 128;
/// Number of transmitted pixel bytes a [`MockInterface`] remembers.
pub const DATA_LOG: usize = 4096;
/// Number of transfer lengths a [`MockInterface`] remembers.
pub const TRANSFER_LOG: usize = 64;

/// Error injected by a [`MockInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// A command as seen by the [`MockInterface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Opcode
    pub command: u8,
    /// Parameter bytes
    pub params: heapless::Vec<u8, 16>,
    /// Pixel bytes transmitted before this command
    pub bytes_before: usize,
}

/// Interface double that completes transfers when they are awaited.
///
/// Pixel bytes are captured when a transfer completes, so anything written
/// into a buffer while it was lent would show up in [`data`](Self::data).
#[derive(Default)]
pub struct MockInterface<'b> {
    pending: Option<(&'b mut [u8], usize)>,
    stalled: bool,
    deferred: bool,
    fail_wait: bool,
    reject_send: bool,
    lose_buffer: bool,
    selected: bool,
    selections: usize,
    commands: heapless::Vec<CommandRecord, COMMAND_LOG>,
    data: heapless::Vec<u8, DATA_LOG>,
    transfer_lengths: heapless::Vec<usize, TRANSFER_LOG>,
    bytes_sent: usize,
    transfers: usize,
}

impl<'b> MockInterface<'b> {
    /// Creates an idle interface with empty logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true`, completions never arrive and only `force_idle` clears a transfer.
    pub fn stall(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// When `true`, the interface reports itself as deferred.
    pub fn defer(&mut self, deferred: bool) {
        self.deferred = deferred;
    }

    /// When `true`, the next wait on a pending transfer fails and the transfer stays pending.
    pub fn fail_next_wait(&mut self, fail: bool) {
        self.fail_wait = fail;
    }

    /// When `true`, the next `begin_send` fails. The buffer stays with the interface.
    pub fn reject_next_send(&mut self, reject: bool) {
        self.reject_send = reject;
    }

    /// When `true`, `force_idle` drops the pending buffer instead of returning it.
    pub fn lose_buffers(&mut self, lose: bool) {
        self.lose_buffer = lose;
    }

    /// Commands sent so far, up to [`COMMAND_LOG`].
    pub fn commands(&self) -> &[CommandRecord] {
        &self.commands
    }

    /// Opcodes sent so far, up to [`COMMAND_LOG`].
    pub fn opcodes(&self) -> heapless::Vec<u8, COMMAND_LOG> {
        self.commands.iter().map(|record| record.command).collect()
    }

    /// Pixel bytes of completed transfers, up to [`DATA_LOG`].
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Byte length of each completed transfer, up to [`TRANSFER_LOG`].
    pub fn transfer_lengths(&self) -> &[usize] {
        &self.transfer_lengths
    }

    /// Total pixel bytes of completed transfers.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Number of completed transfers.
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// Number of times chip select was asserted.
    pub fn selections(&self) -> usize {
        self.selections
    }

    /// Returns `true` while chip select is asserted.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Clears every log.
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.data.clear();
        self.transfer_lengths.clear();
        self.bytes_sent = 0;
        self.transfers = 0;
        self.selections = 0;
    }

    fn complete(&mut self) -> Option<&'b mut [u8]> {
        let (buffer, len) = self.pending.take()?;
        for &byte in &buffer[..len] {
            self.data.push(byte).ok();
        }
        self.transfer_lengths.push(len).ok();
        self.bytes_sent += len;
        self.transfers += 1;
        Some(buffer)
    }
}

impl<'b> Interface<'b> for MockInterface<'b> {
    type Error = MockError;

    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error> {
        assert!(self.pending.is_none(), "command sent during a transfer");
        let record = CommandRecord {
            command,
            params: args.iter().copied().take(16).collect(),
            bytes_before: self.bytes_sent,
        };
        self.commands.push(record).ok();
        Ok(())
    }

    fn begin_send(&mut self, buffer: &'b mut [u8], len: usize) -> Result<(), Self::Error> {
        assert!(self.pending.is_none(), "transfer started while busy");
        let len = len.min(buffer.len());
        self.pending = Some((buffer, len));
        if self.reject_send {
            self.reject_send = false;
            return Err(MockError);
        }
        Ok(())
    }

    fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    async fn wait_idle(&mut self) -> Result<Option<&'b mut [u8]>, Self::Error> {
        if self.pending.is_some() && self.fail_wait {
            self.fail_wait = false;
            return Err(MockError);
        }
        if self.stalled && self.pending.is_some() {
            core::future::pending::<()>().await;
        }
        Ok(self.complete())
    }

    fn force_idle(&mut self) -> Option<&'b mut [u8]> {
        let buffer = self.pending.take().map(|(buffer, _)| buffer);
        if self.lose_buffer {
            return None;
        }
        buffer
    }

    fn is_deferred(&self) -> bool {
        self.deferred
    }

    fn select(&mut self) -> Result<(), Self::Error> {
        self.selected = true;
        self.selections += 1;
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        self.selected = false;
        Ok(())
    }
}

/// Output pin double that remembers its level.
#[derive(Debug, Default)]
pub struct MockOutputPin {
    high: bool,
    toggles: usize,
}

impl MockOutputPin {
    /// Returns `true` if the pin is driven high.
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Number of level changes so far.
    pub fn toggles(&self) -> usize {
        self.toggles
    }

    fn drive(&mut self, high: bool) {
        if self.high != high {
            self.toggles += 1;
        }
        self.high = high;
    }
}

impl ErrorType for MockOutputPin {
    type Error = Infallible;
}

impl OutputPin for MockOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// Delay double that returns immediately and adds up the requested time.
#[derive(Debug, Default)]
pub struct MockDelay {
    elapsed_ns: u64,
}

impl MockDelay {
    /// Total requested delay in microseconds.
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }

    /// Total requested delay in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}
