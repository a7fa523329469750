// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! [`FlashDriver`] backed by the RP2040 boot ROM flash routines.
//!
//! On RP2040, flash operations (erase/program) require disabling XIP first.
//! The full sequence is:
//!   1. connect_internal_flash()
//!   2. flash_exit_xip()
//!   3. flash_range_erase() or flash_range_program()
//!   4. flash_flush_cache()
//!   5. flash_enter_cmd_xip()
//!
//! All code executing during steps 1-5 must run from RAM, not flash.
//! We use `#[unsafe(link_section = ".data")]` to place critical functions in RAM,
//! and pre-resolve all ROM function pointers at init time.
//!
//! The QSPI flash has no lock of its own; `unlock`/`lock` drive a software
//! write-enable latch, and program or erase calls made while locked fail.

use cdcboot_common::partition::{SectorId, RP2040_FLASH_BASE, RP2040_SECTOR_SIZE};
use cdcboot_common::{DriverError, FlashDriver, Word, WORD_SIZE};
use core::sync::atomic::{AtomicUsize, Ordering};

/// Smallest unit the ROM can program.
const FLASH_PAGE_SIZE: usize = 256;
/// 64K block erase (`D8h`), matching one bootloader sector.
const BLOCK_ERASE_CMD: u8 = 0xD8;

// RP2040 ROM table addresses (defined in RP2040 datasheet section 2.8.3)
/// Pointer to the ROM function table (16-bit pointer stored at 0x14)
const ROM_FUNC_TABLE_PTR: *const u16 = 0x0000_0014 as *const u16;
/// Pointer to the ROM table lookup function (16-bit pointer stored at 0x18)
const ROM_TABLE_LOOKUP_PTR: *const u16 = 0x0000_0018 as *const u16;

// ROM function pointer types
type RomFnVoid = unsafe extern "C" fn();
type RomFnErase = unsafe extern "C" fn(u32, usize, u32, u8);
type RomFnProgram = unsafe extern "C" fn(u32, *const u8, usize);

/// ROM function pointers, resolved once from the ROM table.
static ROM_CONNECT_INTERNAL_FLASH: AtomicUsize = AtomicUsize::new(0);
static ROM_FLASH_EXIT_XIP: AtomicUsize = AtomicUsize::new(0);
static ROM_FLASH_RANGE_ERASE: AtomicUsize = AtomicUsize::new(0);
static ROM_FLASH_RANGE_PROGRAM: AtomicUsize = AtomicUsize::new(0);
static ROM_FLASH_FLUSH_CACHE: AtomicUsize = AtomicUsize::new(0);
static ROM_FLASH_ENTER_CMD_XIP: AtomicUsize = AtomicUsize::new(0);

static ROM_FUNCTIONS: [(&AtomicUsize, &[u8; 2]); 6] = [
    (&ROM_CONNECT_INTERNAL_FLASH, b"IF"),
    (&ROM_FLASH_EXIT_XIP, b"EX"),
    (&ROM_FLASH_RANGE_ERASE, b"RE"),
    (&ROM_FLASH_RANGE_PROGRAM, b"RP"),
    (&ROM_FLASH_FLUSH_CACHE, b"FC"),
    (&ROM_FLASH_ENTER_CMD_XIP, b"CX"),
];

/// Look up a ROM function by its two-character tag.
/// Uses RP2040 ROM table as documented in datasheet section 2.8.3.
unsafe fn rom_func_lookup(tag: &[u8; 2]) -> usize {
    // Read function table pointer (stored as 16-bit value)
    let fn_table = *ROM_FUNC_TABLE_PTR as *const u16;

    // Read and call the ROM table lookup function
    let lookup: unsafe extern "C" fn(*const u16, u32) -> usize =
        core::mem::transmute::<usize, unsafe extern "C" fn(*const u16, u32) -> usize>(
            *ROM_TABLE_LOOKUP_PTR as usize,
        );

    let code = u16::from_le_bytes(*tag) as u32;
    lookup(fn_table, code)
}

fn rom_functions_resolved() -> bool {
    ROM_FUNCTIONS
        .iter()
        .all(|(slot, _)| slot.load(Ordering::Acquire) != 0)
}

/// Erase flash at the given flash-relative offset.
/// Runs entirely from RAM with proper XIP teardown/setup.
///
/// # Safety
/// ROM function pointers must be resolved; `offset` and `size` must be
/// multiples of the sector size.
#[unsafe(link_section = ".data")]
#[inline(never)]
unsafe fn flash_erase(offset: u32, size: u32) {
    let connect: RomFnVoid = core::mem::transmute(ROM_CONNECT_INTERNAL_FLASH.load(Ordering::Acquire));
    let exit_xip: RomFnVoid = core::mem::transmute(ROM_FLASH_EXIT_XIP.load(Ordering::Acquire));
    let erase: RomFnErase = core::mem::transmute(ROM_FLASH_RANGE_ERASE.load(Ordering::Acquire));
    let flush: RomFnVoid = core::mem::transmute(ROM_FLASH_FLUSH_CACHE.load(Ordering::Acquire));
    let enter_xip: RomFnVoid = core::mem::transmute(ROM_FLASH_ENTER_CMD_XIP.load(Ordering::Acquire));

    cortex_m::interrupt::disable();
    connect();
    exit_xip();
    erase(offset, size as usize, RP2040_SECTOR_SIZE, BLOCK_ERASE_CMD);
    flush();
    enter_xip();
    cortex_m::interrupt::enable();
}

/// Program one page at the given flash-relative offset.
/// Runs entirely from RAM with proper XIP teardown/setup.
///
/// # Safety
/// ROM function pointers must be resolved; `offset` must be page aligned.
#[unsafe(link_section = ".data")]
#[inline(never)]
unsafe fn flash_program(offset: u32, data: *const u8, len: usize) {
    let connect: RomFnVoid = core::mem::transmute(ROM_CONNECT_INTERNAL_FLASH.load(Ordering::Acquire));
    let exit_xip: RomFnVoid = core::mem::transmute(ROM_FLASH_EXIT_XIP.load(Ordering::Acquire));
    let program: RomFnProgram = core::mem::transmute(ROM_FLASH_RANGE_PROGRAM.load(Ordering::Acquire));
    let flush: RomFnVoid = core::mem::transmute(ROM_FLASH_FLUSH_CACHE.load(Ordering::Acquire));
    let enter_xip: RomFnVoid = core::mem::transmute(ROM_FLASH_ENTER_CMD_XIP.load(Ordering::Acquire));

    cortex_m::interrupt::disable();
    connect();
    exit_xip();
    program(offset, data, len);
    flush();
    enter_xip();
    cortex_m::interrupt::enable();
}

/// Convert an absolute XIP flash address to a flash-relative offset.
fn addr_to_offset(abs_addr: u32) -> u32 {
    abs_addr - RP2040_FLASH_BASE
}

pub struct RomFlash {
    write_enabled: bool,
}

impl RomFlash {
    /// Resolve the ROM flash routines. The ROM table lookups need XIP to be
    /// active, so this runs before any erase or program.
    pub fn new() -> Self {
        for &(slot, tag) in ROM_FUNCTIONS.iter() {
            // SAFETY: the boot ROM is always mapped at address 0
            let func = unsafe { rom_func_lookup(tag) };
            slot.store(func, Ordering::Release);
        }
        Self {
            write_enabled: false,
        }
    }
}

impl FlashDriver for RomFlash {
    fn unlock(&mut self) -> Result<(), DriverError> {
        if !rom_functions_resolved() {
            defmt::error!("Flash: ROM routines missing");
            return Err(DriverError);
        }
        self.write_enabled = true;
        Ok(())
    }

    fn lock(&mut self) {
        self.write_enabled = false;
    }

    fn clear_status(&mut self) {
        // The ROM routines leave no sticky error flags behind.
    }

    fn program_word(&mut self, address: u32, value: Word) -> Result<(), DriverError> {
        if !self.write_enabled {
            return Err(DriverError);
        }

        // Program a whole page of 0xFF around the word; erased bits stay set.
        let offset = addr_to_offset(address);
        let page_offset = offset & !(FLASH_PAGE_SIZE as u32 - 1);
        let at = (offset - page_offset) as usize;

        let mut page = [0xFFu8; FLASH_PAGE_SIZE];
        page[at..at + WORD_SIZE as usize].copy_from_slice(&value.to_le_bytes());

        // SAFETY: routines resolved (checked on unlock), offset page aligned
        unsafe { flash_program(page_offset, page.as_ptr(), page.len()) };
        Ok(())
    }

    fn erase_sector(&mut self, sector: SectorId) -> Result<(), DriverError> {
        if !self.write_enabled {
            return Err(DriverError);
        }

        let offset = u32::from(sector) * RP2040_SECTOR_SIZE;
        defmt::trace!("Flash: erasing block at offset 0x{:08x}", offset);
        // SAFETY: routines resolved (checked on unlock), offset block aligned
        unsafe { flash_erase(offset, RP2040_SECTOR_SIZE) };
        Ok(())
    }

    fn read_word(&self, address: u32) -> Word {
        // SAFETY: callers only pass word-aligned addresses inside XIP flash
        unsafe { (address as *const Word).read_volatile() }
    }
}
