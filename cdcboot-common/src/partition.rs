// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Static memory partitioning: bootloader sectors, application window, RAM window.

use core::ops::Range;

/// Sector index inside the flash device.
pub type SectorId = u16;

/// Flash and RAM layout the bootloader enforces.
///
/// All addresses are absolute (memory-mapped). Sectors have a uniform size and
/// sector `0` starts at `flash_base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPartition {
    pub flash_base: u32,
    pub flash_size: u32,
    pub sector_size: u32,
    pub total_sectors: SectorId,
    pub bootloader_sectors: Range<SectorId>,
    pub app_sectors: Range<SectorId>,
    /// First byte of the application image (vector table).
    pub app_start: u32,
    /// One past the last byte the application may occupy.
    pub app_end: u32,
    pub ram_start: u32,
    /// Top of RAM. An initial stack pointer equal to this is valid.
    pub ram_end: u32,
}

impl MemoryPartition {
    /// Absolute address of the first byte of `sector`.
    pub const fn sector_address(&self, sector: SectorId) -> u32 {
        self.flash_base + sector as u32 * self.sector_size
    }

    pub const fn flash_end(&self) -> u32 {
        self.flash_base + self.flash_size
    }

    pub const fn app_size(&self) -> u32 {
        self.app_end - self.app_start
    }

    pub fn is_app_sector(&self, sector: SectorId) -> bool {
        self.app_sectors.contains(&sector)
    }

    /// Whether `[address, address + len)` lies inside the application window.
    pub fn app_window_contains(&self, address: u32, len: u32) -> bool {
        match address.checked_add(len) {
            Some(end) => address >= self.app_start && end <= self.app_end,
            None => false,
        }
    }

    /// Whether `[address, address + len)` lies inside the flash device.
    pub fn flash_contains(&self, address: u32, len: u32) -> bool {
        match address.checked_add(len) {
            Some(end) => address >= self.flash_base && end <= self.flash_end(),
            None => false,
        }
    }

    /// Initial stack pointer plausibility check.
    pub fn ram_contains(&self, address: u32) -> bool {
        (self.ram_start..=self.ram_end).contains(&address)
    }

    /// Layout invariants: the sector ranges tile the device, the application
    /// window starts right after the bootloader sectors and covers exactly the
    /// application sectors.
    pub const fn is_consistent(&self) -> bool {
        let sectors_fit = self.total_sectors as u32 * self.sector_size == self.flash_size;
        let boot_first = self.bootloader_sectors.start == 0
            && self.bootloader_sectors.end <= self.app_sectors.start;
        let app_last = self.app_sectors.end <= self.total_sectors
            && self.app_sectors.start < self.app_sectors.end;
        let window_matches = self.app_start == self.sector_address(self.app_sectors.start)
            && self.app_end == self.sector_address(self.app_sectors.end);
        let ram_ordered = self.ram_start < self.ram_end;

        sectors_fit && boot_first && app_last && window_matches && ram_ordered
    }
}

// --- RP2040 layout ---
//
// 2 MB QSPI flash mapped at 0x1000_0000, erased in 64 KB blocks. The first
// block holds boot2 and the bootloader; the application is linked at
// 0x1001_0000 and runs in place.

pub const RP2040_FLASH_BASE: u32 = 0x1000_0000;
pub const RP2040_FLASH_SIZE: u32 = 2 * 1024 * 1024;
pub const RP2040_SECTOR_SIZE: u32 = 64 * 1024;
pub const RP2040_RAM_START: u32 = 0x2000_0000;
pub const RP2040_RAM_END: u32 = 0x2004_2000;

pub const RP2040_PARTITION: MemoryPartition = MemoryPartition {
    flash_base: RP2040_FLASH_BASE,
    flash_size: RP2040_FLASH_SIZE,
    sector_size: RP2040_SECTOR_SIZE,
    total_sectors: 32,
    bootloader_sectors: 0..1,
    app_sectors: 1..32,
    app_start: 0x1001_0000,
    app_end: 0x1020_0000,
    ram_start: RP2040_RAM_START,
    ram_end: RP2040_RAM_END,
};

// Compile-time layout check
const _: () = assert!(RP2040_PARTITION.is_consistent());
