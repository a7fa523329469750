// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bounds-checked flash access on top of a target-specific [`FlashDriver`].
//!
//! [`FlashRegion`] is the only component allowed to mutate flash. Every
//! mutation is bracketed by an unlock/lock pair held in an [`Unlocked`] guard,
//! so the controller is relocked on every exit path, including errors.

use core::ops::{Deref, DerefMut};

use crate::checksum;
use crate::error::FlashError;
use crate::log;
use crate::partition::{MemoryPartition, SectorId};

/// Smallest programmable unit.
pub type Word = u32;
pub const WORD_SIZE: u32 = 4;

/// Opaque failure reported by the low-level driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverError;

/// Low-level flash controller operations, implemented per target.
///
/// Addresses are absolute. The driver does no range checking of its own.
pub trait FlashDriver {
    fn unlock(&mut self) -> Result<(), DriverError>;
    fn lock(&mut self);
    /// Clear sticky error/status flags left over from earlier operations.
    fn clear_status(&mut self);
    fn program_word(&mut self, address: u32, value: Word) -> Result<(), DriverError>;
    fn erase_sector(&mut self, sector: SectorId) -> Result<(), DriverError>;
    fn read_word(&self, address: u32) -> Word;

    /// CRC over `word_count` words using a hardware unit, if the target has
    /// one. Must produce the same value as [`checksum::checksum_words`].
    fn hardware_crc(&mut self, _address: u32, _word_count: u32) -> Option<u32> {
        None
    }
}

/// Scoped write access: unlocks on creation, locks on drop.
pub struct Unlocked<'a, D: FlashDriver> {
    driver: &'a mut D,
}

impl<'a, D: FlashDriver> Unlocked<'a, D> {
    pub fn acquire(driver: &'a mut D) -> Result<Self, DriverError> {
        driver.unlock()?;
        Ok(Self { driver })
    }
}

impl<D: FlashDriver> Deref for Unlocked<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.driver
    }
}

impl<D: FlashDriver> DerefMut for Unlocked<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.driver
    }
}

impl<D: FlashDriver> Drop for Unlocked<'_, D> {
    fn drop(&mut self) {
        self.driver.lock();
    }
}

/// Flash region manager: enforces the partition on every access.
pub struct FlashRegion<D> {
    driver: D,
    partition: MemoryPartition,
}

impl<D: FlashDriver> FlashRegion<D> {
    pub fn new(driver: D, partition: MemoryPartition) -> Self {
        Self { driver, partition }
    }

    pub fn partition(&self) -> &MemoryPartition {
        &self.partition
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Prepare the controller: unlock, clear stale flags, relock.
    /// Safe to call any number of times.
    pub fn init(&mut self) -> Result<(), FlashError> {
        let mut flash = Unlocked::acquire(&mut self.driver).map_err(|_| FlashError::InitFailed)?;
        flash.clear_status();
        Ok(())
    }

    /// Erase one application sector.
    pub fn erase_sector(&mut self, sector: SectorId) -> Result<(), FlashError> {
        if !self.partition.is_app_sector(sector) {
            log::warn!("refusing to erase sector {} outside the application", sector);
            return Err(FlashError::EraseOutOfRange);
        }

        let mut flash = Unlocked::acquire(&mut self.driver).map_err(|_| FlashError::EraseFailed)?;
        flash.erase_sector(sector).map_err(|_| {
            log::warn!("erase of sector {} failed", sector);
            FlashError::EraseFailed
        })
    }

    /// Erase every application sector in ascending order, stopping at the
    /// first failure.
    pub fn erase_application_region(&mut self) -> Result<(), FlashError> {
        for sector in self.partition.app_sectors.clone() {
            self.erase_sector(sector)?;
        }
        Ok(())
    }

    /// Program `words` starting at `address`, reading each word back.
    ///
    /// The whole range must be word-aligned and inside the application
    /// window, otherwise nothing is written. Words programmed before a
    /// failure stay programmed.
    pub fn write_words(&mut self, address: u32, words: &[Word]) -> Result<(), FlashError> {
        let in_window = byte_len(words.len())
            .is_some_and(|len| self.partition.app_window_contains(address, len));
        if address % WORD_SIZE != 0 || !in_window {
            return Err(FlashError::WriteOutOfRange);
        }

        let mut flash = Unlocked::acquire(&mut self.driver).map_err(|_| FlashError::WriteFailed)?;
        for (word_addr, &value) in (address..).step_by(WORD_SIZE as usize).zip(words) {
            flash
                .program_word(word_addr, value)
                .map_err(|_| FlashError::WriteFailed)?;

            let readback = flash.read_word(word_addr);
            if readback != value {
                log::warn!(
                    "verify failed at 0x{:08x}: wrote 0x{:08x}, read 0x{:08x}",
                    word_addr,
                    value,
                    readback
                );
                return Err(FlashError::WriteVerifyMismatch);
            }
        }
        Ok(())
    }

    /// Read `count` words from anywhere in flash. `N` is the capacity of the
    /// returned buffer; asking for more than fits is treated as out of range.
    pub fn read_words<const N: usize>(
        &self,
        address: u32,
        count: usize,
    ) -> Result<heapless::Vec<Word, N>, FlashError> {
        if count > N {
            return Err(FlashError::ReadOutOfRange);
        }
        self.check_readable(address, count)?;

        Ok((address..)
            .step_by(WORD_SIZE as usize)
            .take(count)
            .map(|addr| self.driver.read_word(addr))
            .collect())
    }

    pub fn read_word(&self, address: u32) -> Result<Word, FlashError> {
        let words = self.read_words::<1>(address, 1)?;
        words.first().copied().ok_or(FlashError::ReadOutOfRange)
    }

    /// Checksum over `word_count` words of flash, see [`checksum`].
    pub fn checksum(&mut self, address: u32, word_count: u32) -> Result<u32, FlashError> {
        self.check_readable(address, word_count as usize)?;
        Ok(checksum::checksum(&mut self.driver, address, word_count))
    }

    fn check_readable(&self, address: u32, count: usize) -> Result<(), FlashError> {
        let in_flash =
            byte_len(count).is_some_and(|len| self.partition.flash_contains(address, len));
        if address % WORD_SIZE != 0 || !in_flash {
            return Err(FlashError::ReadOutOfRange);
        }
        Ok(())
    }
}

fn byte_len(words: usize) -> Option<u32> {
    u32::try_from(words).ok()?.checked_mul(WORD_SIZE)
}
