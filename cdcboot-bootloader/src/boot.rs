// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use cdcboot_common::HardwareControl;

const NVIC_ICER0: *mut u32 = 0xE000_E180 as *mut u32;
const NVIC_ICPR0: *mut u32 = 0xE000_E280 as *mut u32;

const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
const SYST_RVR: *mut u32 = 0xE000_E014 as *mut u32;
const SYST_CVR: *mut u32 = 0xE000_E018 as *mut u32;

const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;

/// RESETS.RESET through the atomic set alias (base 0x4000_C000 + 0x2000).
const RESETS_RESET_SET: *mut u32 = 0x4000_E000 as *mut u32;
const RESET_USBCTRL: u32 = 1 << 24;
const RESET_TIMER: u32 = 1 << 21;

/// Direct register access for the hand-off to the application.
pub struct CortexM;

impl HardwareControl for CortexM {
    fn disable_interrupts(&mut self) {
        cortex_m::interrupt::disable();
        // SAFETY: writes to NVIC clear-enable/clear-pending only mask lines
        unsafe {
            NVIC_ICER0.write_volatile(u32::MAX);
            NVIC_ICPR0.write_volatile(u32::MAX);
        }
    }

    fn deinit_peripherals(&mut self) {
        // Hold the blocks we brought up in reset; the application
        // re-initializes clocks itself.
        // SAFETY: atomic set alias, no read-modify-write race
        unsafe { RESETS_RESET_SET.write_volatile(RESET_USBCTRL | RESET_TIMER) };
    }

    fn stop_system_timer(&mut self) {
        // SAFETY: SysTick is not used after this point
        unsafe {
            SYST_CSR.write_volatile(0);
            SYST_RVR.write_volatile(0);
            SYST_CVR.write_volatile(0);
        }
    }

    fn set_vector_table_base(&mut self, base: u32) {
        // SAFETY: interrupts are disabled, nothing fires through the old table
        unsafe { SCB_VTOR.write_volatile(base) };
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    unsafe fn start(&mut self, stack_pointer: u32, entry: u32) -> ! {
        core::arch::asm!(
            "msr msp, {sp}",
            "bx {reset}",
            sp = in(reg) stack_pointer,
            reset = in(reg) entry,
            options(noreturn)
        );
    }
}
