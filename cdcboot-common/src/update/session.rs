// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use super::storage;
use crate::error::BootloaderError;
use crate::flash::{FlashDriver, FlashRegion, Word, WORD_SIZE};
use crate::log;
use crate::partition::MemoryPartition;
use crate::protocol::{Response, PACKET_SIZE, PACKET_WORDS};
use crate::transport::Transport;

/// How long to wait for each data packet.
pub const PACKET_TIMEOUT_MS: u32 = 2000;
/// Missed packets in a row that abandon the download.
pub const MAX_CONSECUTIVE_FAILURES: u8 = 3;

/// Result of a complete transfer, before checksum verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DownloadOutcome {
    pub packets: u16,
    /// Image length in words, i.e. the range the checksum covers.
    pub words: u32,
}

/// Bookkeeping for one firmware transfer.
#[derive(Debug)]
pub struct DownloadSession {
    expected_count: u16,
    received_count: u16,
    next_address: u32,
    expected_checksum: u32,
    consecutive_failures: u8,
}

impl DownloadSession {
    /// Start bookkeeping for `packets` packets. Refuses empty transfers and
    /// images that would not fit the application window.
    pub fn new(
        packets: u16,
        expected_checksum: u32,
        partition: &MemoryPartition,
    ) -> Result<Self, BootloaderError> {
        let image_len = u32::from(packets) * PACKET_SIZE as u32;
        if packets == 0 || !partition.app_window_contains(partition.app_start, image_len) {
            log::warn!(
                "DownloadFw: {} packets do not fit the application window",
                packets
            );
            return Err(BootloaderError::DownloadFailed);
        }

        Ok(Self {
            expected_count: packets,
            received_count: 0,
            next_address: partition.app_start,
            expected_checksum,
            consecutive_failures: 0,
        })
    }

    pub fn expected_checksum(&self) -> u32 {
        self.expected_checksum
    }

    pub fn received_count(&self) -> u16 {
        self.received_count
    }

    pub fn image_words(&self) -> u32 {
        u32::from(self.expected_count) * PACKET_WORDS as u32
    }

    /// Erase the application region, then receive and program every packet.
    ///
    /// All-or-nothing: unless every expected packet was received and written,
    /// the session fails.
    pub fn run_to_completion<T, D>(
        &mut self,
        transport: &mut T,
        flash: &mut FlashRegion<D>,
    ) -> Result<DownloadOutcome, BootloaderError>
    where
        T: Transport,
        D: FlashDriver,
    {
        if let Err(e) = storage::erase_application(flash) {
            log::error!("DownloadFw: erase failed: {}", e);
            return Err(BootloaderError::DownloadFailed);
        }

        let mut packet = [0u8; PACKET_SIZE];
        while self.received_count < self.expected_count {
            match transport.receive(&mut packet, PACKET_TIMEOUT_MS) {
                Ok(PACKET_SIZE) => self.accept(transport, flash, &packet)?,
                _ => {
                    transport.send(&Response::PacketNack(self.received_count).encode());
                    self.consecutive_failures += 1;
                    log::warn!(
                        "Packet {} missing ({} in a row)",
                        self.received_count,
                        self.consecutive_failures
                    );
                    if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        break;
                    }
                }
            }
        }

        if self.received_count != self.expected_count {
            log::error!(
                "DownloadFw: stopped after {} of {} packets",
                self.received_count,
                self.expected_count
            );
            return Err(BootloaderError::DownloadFailed);
        }

        log::info!("DownloadFw: {} packets written", self.received_count);
        Ok(DownloadOutcome {
            packets: self.received_count,
            words: self.image_words(),
        })
    }

    fn accept<T, D>(
        &mut self,
        transport: &mut T,
        flash: &mut FlashRegion<D>,
        packet: &[u8; PACKET_SIZE],
    ) -> Result<(), BootloaderError>
    where
        T: Transport,
        D: FlashDriver,
    {
        transport.send(&Response::PacketAck(self.received_count).encode());

        let mut words = [0 as Word; PACKET_WORDS];
        for (word, bytes) in words.iter_mut().zip(packet.chunks_exact(WORD_SIZE as usize)) {
            *word = Word::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        log::trace!(
            "Packet {} -> 0x{:08x}",
            self.received_count,
            self.next_address
        );
        flash.write_words(self.next_address, &words)?;

        self.next_address += PACKET_SIZE as u32;
        self.received_count += 1;
        self.consecutive_failures = 0;
        Ok(())
    }
}
