// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

#![no_std]
#![no_main]

mod boot;
mod flash;
mod peripherals;
mod usb_transport;

use cdcboot_common::{Bootloader, FlashRegion, RP2040_PARTITION};
use defmt_rtt as _;
use embedded_hal::digital::OutputPin;
use panic_probe as _;
use rp2040_hal as hal;
use usb_device::class_prelude::UsbBusAllocator;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

/// Park forever. Only reached if the board cannot be brought up.
fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

#[entry]
fn main() -> ! {
    defmt::println!("Bootloader init");

    let mut p = match peripherals::init() {
        Ok(p) => p,
        Err(e) => {
            defmt::error!("Board init failed: {:?}", e);
            halt();
        }
    };
    peripherals::blink(&mut p.led_pin, &mut p.timer, 3, 200);

    let Some(mut usb) = p.usb.take() else {
        defmt::error!("USB peripheral unavailable");
        halt();
    };
    let usb_bus = UsbBusAllocator::new(hal::usb::UsbBus::new(
        usb.regs,
        usb.dpram,
        usb.clock,
        true,
        &mut usb.resets,
    ));
    let Some(usb_bus) = peripherals::store_usb_bus(usb_bus) else {
        defmt::error!("USB bus already initialized");
        halt();
    };

    let transport = match usb_transport::UsbTransport::new(usb_bus, p.timer) {
        Ok(transport) => transport,
        Err(e) => {
            defmt::error!("Failed to initialize USB transport: {:?}", e);
            halt();
        }
    };
    defmt::println!("USB CDC initialized");
    p.led_pin.set_high().ok();

    let flash = FlashRegion::new(flash::RomFlash::new(), RP2040_PARTITION);
    defmt::println!(
        "Application slot 0x{:08x}..0x{:08x}",
        RP2040_PARTITION.app_start,
        RP2040_PARTITION.app_end
    );

    Bootloader::new(transport, flash, boot::CortexM).run()
}
