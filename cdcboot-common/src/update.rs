// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bootloader state machine and firmware download over the serial transport.
//!
//! Protocol, as seen from the host:
//! - `Execute`: start the installed application if one is present
//! - `EraseApp`: erase the whole application region
//! - `DownloadFw`: erase, then stream headerless 64-byte packets, each
//!   answered by `PacketAck`/`PacketNack`; the image is checksummed once
//!   written and started on success
//!
//! Any failure is answered by exactly one `Error` frame before the machine
//! returns to `Idle`. A failed download is erased again first.

mod commands;
mod machine;
mod session;
mod state;
mod storage;

pub use machine::Bootloader;
pub use session::{
    DownloadOutcome, DownloadSession, MAX_CONSECUTIVE_FAILURES, PACKET_TIMEOUT_MS,
};
pub use state::BootState;
pub use storage::ERASE_ATTEMPTS;
