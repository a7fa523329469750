// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hand-off from the bootloader to the application.

use crate::flash::{FlashDriver, FlashRegion};
use crate::image::VectorTable;
use crate::log;

/// CPU and system-level controls needed to start another image.
pub trait HardwareControl {
    fn disable_interrupts(&mut self);
    /// Reset peripherals and clocks the bootloader brought up.
    fn deinit_peripherals(&mut self);
    /// Stop SysTick and zero its reload and current value.
    fn stop_system_timer(&mut self);
    fn set_vector_table_base(&mut self, base: u32);

    /// Load the main stack pointer and branch to `entry`.
    ///
    /// # Safety
    /// `stack_pointer` and `entry` must come from a valid application vector
    /// table. Nothing of the caller survives this call.
    unsafe fn start(&mut self, stack_pointer: u32, entry: u32) -> !;
}

/// Tear down the bootloader and jump into the application.
///
/// # Safety
/// The application slot must hold an image that passed
/// [`application_exists`](crate::image::application_exists). If the vector
/// table is bogus the behavior is undefined.
pub unsafe fn launch<H, D>(hw: &mut H, flash: &FlashRegion<D>) -> !
where
    H: HardwareControl,
    D: FlashDriver,
{
    let app_start = flash.partition().app_start;
    let vt = VectorTable::read(flash.driver(), app_start);
    log::info!(
        "Jumping to application: SP=0x{:08x} reset=0x{:08x}",
        vt.initial_sp,
        vt.reset_vector
    );

    hw.disable_interrupts();
    hw.deinit_peripherals();
    hw.stop_system_timer();
    hw.set_vector_table_base(app_start);
    hw.start(vt.initial_sp, vt.reset_vector)
}
