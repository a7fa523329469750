// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use super::machine::Bootloader;
use super::session::DownloadSession;
use super::state::BootState;
use super::storage;
use crate::error::{BootloaderError, ErrorCode};
use crate::flash::FlashDriver;
use crate::image;
use crate::launch::{self, HardwareControl};
use crate::log;
use crate::protocol::{Command, CommandId, Response, COMMAND_FRAME_SIZE};
use crate::transport::{Transport, WAIT_FOREVER};

impl<T, D, H> Bootloader<T, D, H>
where
    T: Transport,
    D: FlashDriver,
    H: HardwareControl,
{
    /// Wait for the next command and pick the state that serves it.
    pub(super) fn handle_idle(&mut self) -> BootState {
        self.transport.discard_pending();

        let mut frame = [0u8; COMMAND_FRAME_SIZE];
        match self.transport.receive(&mut frame, WAIT_FOREVER) {
            Ok(COMMAND_FRAME_SIZE) => {}
            Ok(len) => {
                log::warn!("Idle: dropped truncated command ({} bytes)", len);
                return BootState::Idle;
            }
            Err(e) => {
                log::debug!("Idle: receive failed: {:?}", e);
                return BootState::Idle;
            }
        }

        let cmd = Command::decode(&frame);
        log::info!("Command: {:?}", cmd);
        match cmd {
            Command::Execute => BootState::Execute,
            Command::EraseApp => BootState::EraseApp,
            Command::DownloadFw { packets, checksum } => BootState::DownloadFw { packets, checksum },
            Command::Packet | Command::Unrecognized(_) => {
                self.fail(BootloaderError::InvalidCommand, BootState::SendError)
            }
        }
    }

    /// Start the application, or report that there is none.
    pub(super) fn handle_execute(&mut self) -> BootState {
        if !image::application_exists(&self.flash) {
            return self.fail(BootloaderError::NoUserApp, BootState::SendError);
        }

        self.respond(Response::Ack(CommandId::Execute));
        // SAFETY: the application slot holds a plausible vector table.
        unsafe { launch::launch(&mut self.hw, &self.flash) }
    }

    pub(super) fn handle_erase_app(&mut self) -> BootState {
        match storage::erase_application(&mut self.flash) {
            Ok(()) => {
                self.respond(Response::Ack(CommandId::EraseApp));
                BootState::Idle
            }
            Err(e) => self.fail_flash(e, BootState::SendError),
        }
    }

    /// Receive, program and verify a new image. Success goes straight to
    /// `Execute`; any failure after the erase goes through `Abort`.
    pub(super) fn handle_download(&mut self, packets: u16, checksum: u32) -> BootState {
        let mut session = match DownloadSession::new(packets, checksum, self.flash.partition()) {
            Ok(session) => session,
            // Nothing has been touched yet, so there is nothing to wipe.
            Err(e) => return self.fail(e, BootState::SendError),
        };

        self.respond(Response::Ack(CommandId::DownloadFw));
        log::info!(
            "DownloadFw: {} packets, checksum 0x{:08x}",
            packets,
            checksum
        );

        let result = session
            .run_to_completion(&mut self.transport, &mut self.flash)
            .and_then(|outcome| {
                image::verify_checksum(&mut self.flash, session.expected_checksum(), outcome.words)
                    .map_err(BootloaderError::from)
            });

        match result {
            Ok(()) => {
                log::info!("DownloadFw: image verified");
                BootState::Execute
            }
            Err(e) => self.fail(e, BootState::Abort),
        }
    }

    /// Wipe a failed download so no partial image can be started, then report.
    /// If the wipe fails, the vector table is zeroed instead and the erase
    /// failure is what the host sees.
    pub(super) fn handle_abort(&mut self) -> BootState {
        if let Err(e) = storage::erase_application(&mut self.flash) {
            log::error!("Abort: re-erase failed: {}", e);
            if let Err(err) = storage::invalidate_application(&mut self.flash) {
                log::error!("Abort: vector table not cleared: {}", err);
            }
            self.last_error = Some(e.into());
        }
        self.handle_send_error()
    }

    pub(super) fn handle_send_error(&mut self) -> BootState {
        let code = self
            .last_error
            .take()
            .map_or(ErrorCode::InvalidState, ErrorCode::from);
        self.respond(Response::Error(code));
        BootState::Idle
    }
}
