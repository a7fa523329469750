// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Byte transport seen by the bootloader core.

/// Receive timeout used while idling for a command.
pub const WAIT_FOREVER: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecvError {
    /// Nothing (or not enough) arrived before the deadline.
    Timeout,
    /// The link itself failed (e.g. USB reset mid-transfer).
    Link,
}

/// Blocking, frame-oriented serial link.
pub trait Transport {
    /// Send a whole frame. Blocks until the link accepted every byte.
    fn send(&mut self, frame: &[u8]);

    /// Fill `buf`, waiting at most `timeout_ms` milliseconds (`WAIT_FOREVER`
    /// never expires). Returns the number of bytes stored. A frame cut short
    /// by the deadline comes back as `Ok(n)` with `n < buf.len()`, so callers
    /// must check the length before using the frame.
    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, RecvError>;

    /// Drop any bytes already buffered but not yet consumed.
    fn discard_pending(&mut self) {}
}
