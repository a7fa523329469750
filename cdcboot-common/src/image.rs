// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application image checks run before handing off control.

use crate::error::ChecksumMismatch;
use crate::flash::{FlashDriver, FlashRegion, WORD_SIZE};
use crate::log;

/// First two entries of a Cortex-M vector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VectorTable {
    pub initial_sp: u32,
    pub reset_vector: u32,
}

impl VectorTable {
    /// Read straight from the driver. `base` must be a word-aligned flash
    /// address.
    pub fn read<D: FlashDriver>(driver: &D, base: u32) -> Self {
        Self {
            initial_sp: driver.read_word(base),
            reset_vector: driver.read_word(base + WORD_SIZE),
        }
    }
}

/// Whether the application slot holds something that looks like firmware:
/// its initial stack pointer must point into RAM. Erased flash reads as
/// `0xFFFF_FFFF` and fails.
pub fn application_exists<D: FlashDriver>(flash: &FlashRegion<D>) -> bool {
    let partition = flash.partition();
    match flash.read_word(partition.app_start) {
        Ok(sp) => partition.ram_contains(sp),
        Err(_) => false,
    }
}

/// Compare the checksum of the first `word_count` application words against
/// `expected`.
pub fn verify_checksum<D: FlashDriver>(
    flash: &mut FlashRegion<D>,
    expected: u32,
    word_count: u32,
) -> Result<(), ChecksumMismatch> {
    let start = flash.partition().app_start;
    // An unreadable range cannot match anything the host computed.
    let actual = flash.checksum(start, word_count).unwrap_or(!expected);

    if actual != expected {
        log::warn!(
            "checksum mismatch over {} words: expected 0x{:08x}, got 0x{:08x}",
            word_count,
            expected,
            actual
        );
        return Err(ChecksumMismatch { expected, actual });
    }
    Ok(())
}
