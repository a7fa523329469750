// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory stand-ins for the flash controller, the serial link and the CPU.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use cdcboot_common::partition::SectorId;
use cdcboot_common::protocol::{Response, PACKET_SIZE};
use cdcboot_common::{
    Bootloader, DriverError, FlashDriver, FlashRegion, HardwareControl, MemoryPartition, RecvError,
    Transport,
};

pub const ERASED: u32 = 0xFFFF_FFFF;

/// 8 KB device, 1 KB sectors: sectors 0-1 bootloader, 2-7 application.
pub const TEST_PARTITION: MemoryPartition = MemoryPartition {
    flash_base: 0x0800_0000,
    flash_size: 8 * 1024,
    sector_size: 1024,
    total_sectors: 8,
    bootloader_sectors: 0..2,
    app_sectors: 2..8,
    app_start: 0x0800_0800,
    app_end: 0x0800_2000,
    ram_start: 0x2000_0000,
    ram_end: 0x2002_0000,
};

pub const APP_START: u32 = TEST_PARTITION.app_start;
pub const APP_END: u32 = TEST_PARTITION.app_end;

// --- Flash ---

/// NOR-like flash: erase sets all bits, programming can only clear bits.
pub struct FakeFlash {
    pub words: Vec<u32>,
    pub locked: bool,
    pub unlock_fails: bool,
    pub status_clears: usize,
    pub programs: usize,
    /// Every erase attempt, successful or not, in call order.
    pub erases: Vec<SectorId>,
    /// Remaining injected failures per sector.
    pub erase_failures: HashMap<SectorId, u32>,
    pub fail_program_at: Option<u32>,
    pub hardware_crc: Option<u32>,
}

impl FakeFlash {
    pub fn new() -> Self {
        let len = (TEST_PARTITION.flash_size / 4) as usize;
        Self {
            words: vec![ERASED; len],
            locked: true,
            unlock_fails: false,
            status_clears: 0,
            programs: 0,
            erases: Vec::new(),
            erase_failures: HashMap::new(),
            fail_program_at: None,
            hardware_crc: None,
        }
    }

    fn index(address: u32) -> usize {
        ((address - TEST_PARTITION.flash_base) / 4) as usize
    }

    pub fn word_at(&self, address: u32) -> u32 {
        self.words[Self::index(address)]
    }

    pub fn set_word(&mut self, address: u32, value: u32) {
        let i = Self::index(address);
        self.words[i] = value;
    }

    pub fn fail_erase(&mut self, sector: SectorId, times: u32) {
        self.erase_failures.insert(sector, times);
    }

    pub fn app_is_erased(&self) -> bool {
        let start = Self::index(APP_START);
        let end = Self::index(APP_END);
        self.words[start..end].iter().all(|&w| w == ERASED)
    }
}

impl FlashDriver for FakeFlash {
    fn unlock(&mut self) -> Result<(), DriverError> {
        if self.unlock_fails {
            return Err(DriverError);
        }
        self.locked = false;
        Ok(())
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn clear_status(&mut self) {
        self.status_clears += 1;
    }

    fn program_word(&mut self, address: u32, value: u32) -> Result<(), DriverError> {
        assert!(!self.locked, "program while locked at 0x{address:08x}");
        self.programs += 1;
        if self.fail_program_at == Some(address) {
            return Err(DriverError);
        }
        let i = Self::index(address);
        self.words[i] &= value;
        Ok(())
    }

    fn erase_sector(&mut self, sector: SectorId) -> Result<(), DriverError> {
        assert!(!self.locked, "erase while locked (sector {sector})");
        self.erases.push(sector);
        if let Some(remaining) = self.erase_failures.get_mut(&sector) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError);
            }
        }

        let words_per_sector = (TEST_PARTITION.sector_size / 4) as usize;
        let start = sector as usize * words_per_sector;
        self.words[start..start + words_per_sector].fill(ERASED);
        Ok(())
    }

    fn read_word(&self, address: u32) -> u32 {
        self.word_at(address)
    }

    fn hardware_crc(&mut self, _address: u32, _word_count: u32) -> Option<u32> {
        self.hardware_crc
    }
}

pub fn flash_region() -> FlashRegion<FakeFlash> {
    FlashRegion::new(FakeFlash::new(), TEST_PARTITION)
}

// --- Transport ---

pub enum Rx {
    Frame(Vec<u8>),
    Timeout,
    Link,
}

/// Plays back a fixed script of receive outcomes and records what was sent.
/// Once the script runs out every receive times out.
#[derive(Default)]
pub struct ScriptedTransport {
    pub incoming: VecDeque<Rx>,
    pub sent: Vec<Vec<u8>>,
    pub timeouts: Vec<u32>,
    pub discards: usize,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Rx>) -> Self {
        Self {
            incoming: script.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn responses(&self) -> Vec<Response> {
        self.sent
            .iter()
            .map(|frame| Response::decode(frame).expect("undecodable response frame"))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, frame: &[u8]) {
        self.sent.push(frame.to_vec());
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, RecvError> {
        self.timeouts.push(timeout_ms);
        match self.incoming.pop_front() {
            Some(Rx::Frame(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Rx::Link) => Err(RecvError::Link),
            Some(Rx::Timeout) | None => Err(RecvError::Timeout),
        }
    }

    fn discard_pending(&mut self) {
        self.discards += 1;
    }
}

// --- CPU ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    DisableInterrupts,
    DeinitPeripherals,
    StopSystemTimer,
    SetVectorTableBase(u32),
    Start { stack_pointer: u32, entry: u32 },
}

/// Records the hand-off sequence. `start` panics so a test can observe it.
#[derive(Default)]
pub struct RecordingHardware {
    pub calls: Vec<HwCall>,
}

impl HardwareControl for RecordingHardware {
    fn disable_interrupts(&mut self) {
        self.calls.push(HwCall::DisableInterrupts);
    }

    fn deinit_peripherals(&mut self) {
        self.calls.push(HwCall::DeinitPeripherals);
    }

    fn stop_system_timer(&mut self) {
        self.calls.push(HwCall::StopSystemTimer);
    }

    fn set_vector_table_base(&mut self, base: u32) {
        self.calls.push(HwCall::SetVectorTableBase(base));
    }

    unsafe fn start(&mut self, stack_pointer: u32, entry: u32) -> ! {
        self.calls.push(HwCall::Start {
            stack_pointer,
            entry,
        });
        panic!("application started");
    }
}

// --- Images ---

pub const APP_STACK_TOP: u32 = 0x2002_0000;
pub const APP_RESET: u32 = APP_START + 0x101;

/// A firmware image of `packets` full packets with a valid vector table.
pub fn firmware_image(packets: usize) -> Vec<u8> {
    let mut image: Vec<u8> = (0..packets * PACKET_SIZE)
        .map(|i| (i * 7 + 3) as u8)
        .collect();
    image[0..4].copy_from_slice(&APP_STACK_TOP.to_le_bytes());
    image[4..8].copy_from_slice(&APP_RESET.to_le_bytes());
    image
}

pub fn packets(image: &[u8]) -> Vec<Rx> {
    image
        .chunks(PACKET_SIZE)
        .map(|chunk| Rx::Frame(chunk.to_vec()))
        .collect()
}

pub type TestBootloader = Bootloader<ScriptedTransport, FakeFlash, RecordingHardware>;

pub fn bootloader(script: impl IntoIterator<Item = Rx>) -> TestBootloader {
    bootloader_with(script, FakeFlash::new())
}

pub fn bootloader_with(script: impl IntoIterator<Item = Rx>, flash: FakeFlash) -> TestBootloader {
    Bootloader::new(
        ScriptedTransport::new(script),
        FlashRegion::new(flash, TEST_PARTITION),
        RecordingHardware::default(),
    )
}
