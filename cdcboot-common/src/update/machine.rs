// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use super::state::BootState;
use crate::error::{BootloaderError, FlashError};
use crate::flash::{FlashDriver, FlashRegion};
use crate::launch::HardwareControl;
use crate::log;
use crate::protocol::Response;
use crate::transport::Transport;

/// The bootloader: owns the transport, the flash region and the hardware
/// controls, and walks the state machine one state per [`step`](Self::step).
pub struct Bootloader<T, D, H> {
    pub(super) transport: T,
    pub(super) flash: FlashRegion<D>,
    pub(super) hw: H,
    state: BootState,
    pub(super) last_error: Option<BootloaderError>,
}

impl<T, D, H> Bootloader<T, D, H>
where
    T: Transport,
    D: FlashDriver,
    H: HardwareControl,
{
    /// Initialize flash and build the machine. If flash cannot be prepared,
    /// the first thing the host sees is an error.
    pub fn new(transport: T, mut flash: FlashRegion<D>, hw: H) -> Self {
        let (state, last_error) = match flash.init() {
            Ok(()) => (BootState::Idle, None),
            Err(e) => {
                log::error!("Flash init failed: {}", e);
                (BootState::SendError, Some(BootloaderError::Flash(e)))
            }
        };

        Self {
            transport,
            flash,
            hw,
            state,
            last_error,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn flash(&self) -> &FlashRegion<D> {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut FlashRegion<D> {
        &mut self.flash
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Run the handler of the current state and move to the state it picks.
    pub fn step(&mut self) -> BootState {
        let state = self.state;
        let next = match state {
            BootState::Idle => self.handle_idle(),
            BootState::Execute => self.handle_execute(),
            BootState::EraseApp => self.handle_erase_app(),
            BootState::DownloadFw { packets, checksum } => {
                self.handle_download(packets, checksum)
            }
            BootState::Abort => self.handle_abort(),
            BootState::SendError => self.handle_send_error(),
        };

        log::trace!("State: {:?} -> {:?}", state, next);
        self.state = next;
        next
    }

    /// Run forever. Only leaves through the application hand-off.
    pub fn run(mut self) -> ! {
        loop {
            self.step();
        }
    }

    pub(super) fn respond(&mut self, response: Response) {
        self.transport.send(&response.encode());
    }

    /// Remember `error` for the next `Error` frame and continue with `next`.
    pub(super) fn fail(&mut self, error: BootloaderError, next: BootState) -> BootState {
        log::warn!("{}", error);
        self.last_error = Some(error);
        next
    }

    pub(super) fn fail_flash(&mut self, error: FlashError, next: BootState) -> BootState {
        self.fail(error.into(), next)
    }
}
