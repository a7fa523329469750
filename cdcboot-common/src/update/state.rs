// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

/// Bootloader state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootState {
    /// Waiting for a command from the host.
    Idle,
    /// Start the application if one is installed.
    Execute,
    /// Erase the application region.
    EraseApp,
    /// Receive and program a new image, then verify it.
    DownloadFw { packets: u16, checksum: u32 },
    /// A download failed: wipe whatever was written, then report.
    Abort,
    /// Report the last recorded error.
    SendError,
}
