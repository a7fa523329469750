// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board bring-up: clocks, timer, status LED and the USB bus allocator.

use core::cell::UnsafeCell;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use rp2040_hal as hal;
use rp2040_hal::gpio::bank0::Gpio25;
use rp2040_hal::gpio::{FunctionSioOutput, Pin, PullDown};
use rp2040_hal::pac;
use rp2040_hal::usb::UsbBus;
use usb_device::class_prelude::UsbBusAllocator;

const XOSC_CRYSTAL_FREQ: u32 = 12_000_000;

pub type LedPin = Pin<Gpio25, FunctionSioOutput, PullDown>;

/// Parts needed to build the USB bus once the transport is brought up.
pub struct UsbParts {
    pub regs: pac::USBCTRL_REGS,
    pub dpram: pac::USBCTRL_DPRAM,
    pub clock: hal::clocks::UsbClock,
    pub resets: pac::RESETS,
}

pub struct Peripherals {
    pub timer: hal::Timer,
    pub led_pin: LedPin,
    pub usb: Option<UsbParts>,
}

#[derive(Debug, defmt::Format)]
pub enum BoardError {
    PeripheralsTaken,
    ClockInit,
}

/// Bring up the crystal, PLLs and the 1 MHz timer. Called once from `main`.
pub fn init() -> Result<Peripherals, BoardError> {
    let mut pac = pac::Peripherals::take().ok_or(BoardError::PeripheralsTaken)?;
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    let clocks = hal::clocks::init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .map_err(|_| BoardError::ClockInit)?;

    let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let led_pin = pins.gpio25.into_push_pull_output();

    Ok(Peripherals {
        timer,
        led_pin,
        usb: Some(UsbParts {
            regs: pac.USBCTRL_REGS,
            dpram: pac.USBCTRL_DPRAM,
            clock: clocks.usb_clock,
            resets: pac.RESETS,
        }),
    })
}

/// Blink an LED a specified number of times.
pub fn blink(led: &mut impl OutputPin, timer: &mut impl DelayNs, count: u32, period_ms: u32) {
    for _ in 0..count {
        led.set_high().ok();
        timer.delay_ms(period_ms);
        led.set_low().ok();
        timer.delay_ms(period_ms);
    }
}

/// Holds the USB bus allocator in a static so the device and serial class can
/// borrow it for `'static`.
///
/// SAFETY: single-threaded bare-metal environment; written once before any
/// reference is handed out.
struct SyncBus(UnsafeCell<Option<UsbBusAllocator<UsbBus>>>);
unsafe impl Sync for SyncBus {}

static USB_BUS: SyncBus = SyncBus(UnsafeCell::new(None));

/// Store the bus allocator and return the `'static` reference to it.
/// Returns `None` if a bus was already stored.
pub fn store_usb_bus(bus: UsbBusAllocator<UsbBus>) -> Option<&'static UsbBusAllocator<UsbBus>> {
    // SAFETY: single-threaded, and the slot is only filled once
    unsafe {
        let slot = &mut *USB_BUS.0.get();
        if slot.is_some() {
            return None;
        }
        Some(slot.insert(bus))
    }
}
