// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! USB CDC transport carrying raw fixed-size frames.

use cdcboot_common::transport::{RecvError, Transport, WAIT_FOREVER};
use rp2040_hal::usb::UsbBus;
use rp2040_hal::Timer;
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

#[derive(Debug, defmt::Format)]
pub enum TransportError {
    StringTooLong,
}

pub struct UsbTransport {
    serial: SerialPort<'static, UsbBus>,
    usb_dev: UsbDevice<'static, UsbBus>,
    timer: Timer,
}

impl UsbTransport {
    pub fn new(
        usb_bus: &'static UsbBusAllocator<UsbBus>,
        timer: Timer,
    ) -> Result<Self, TransportError> {
        let serial = SerialPort::new(usb_bus);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x2E8A, 0x000A))
            .strings(&[StringDescriptors::default()
                .manufacturer("ADNT")
                .product("cdcboot")
                .serial_number("0001")])
            .map_err(|_| TransportError::StringTooLong)?
            .device_class(usbd_serial::USB_CLASS_CDC)
            .build();

        Ok(Self {
            serial,
            usb_dev,
            timer,
        })
    }

    /// Poll USB device. Must be called frequently.
    pub fn poll(&mut self) -> bool {
        self.usb_dev.poll(&mut [&mut self.serial])
    }

    fn now_us(&self) -> u64 {
        self.timer.get_counter().ticks()
    }

    /// Write all bytes to USB serial, handling WouldBlock by polling.
    fn write_all(&mut self, data: &[u8]) {
        let mut offset = 0;
        while offset < data.len() {
            match self.serial.write(&data[offset..]) {
                Ok(n) => offset += n,
                Err(UsbError::WouldBlock) => {
                    self.poll();
                }
                Err(_) => break,
            }
        }
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, frame: &[u8]) {
        self.write_all(frame);
        while let Err(UsbError::WouldBlock) = self.serial.flush() {
            self.poll();
        }
    }

    /// Fill `buf` completely, or give up once `timeout_ms` has passed. A
    /// partial frame at the deadline is returned as a short read.
    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, RecvError> {
        let deadline = (timeout_ms != WAIT_FOREVER)
            .then(|| self.now_us() + u64::from(timeout_ms) * 1000);
        let mut filled = 0;

        while filled < buf.len() {
            self.poll();
            match self.serial.read(&mut buf[filled..]) {
                Ok(n) => filled += n,
                Err(UsbError::WouldBlock) => {}
                Err(_) => {
                    defmt::warn!("USB: read failed");
                    return Err(RecvError::Link);
                }
            }

            if deadline.is_some_and(|d| self.now_us() >= d) {
                break;
            }
        }

        match filled {
            0 if !buf.is_empty() => Err(RecvError::Timeout),
            n => Ok(n),
        }
    }

    fn discard_pending(&mut self) {
        let mut scratch = [0u8; 64];
        self.poll();
        while let Ok(n) = self.serial.read(&mut scratch) {
            if n == 0 {
                break;
            }
            defmt::trace!("USB: discarded {} stale bytes", n);
            self.poll();
        }
    }
}
