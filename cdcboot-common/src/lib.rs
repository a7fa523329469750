// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hardware-independent core of the cdcboot serial bootloader.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - Default: `no_std` mode for embedded targets
//! - `std` feature: Enables `std` support for host tools and tests
//! - `defmt` feature: Routes the internal log calls to `defmt`
//!
//! The crate never touches hardware directly. Flash, transport and CPU control
//! are reached through the [`FlashDriver`], [`Transport`] and
//! [`HardwareControl`] traits, which the firmware implements per target.

#![cfg_attr(not(feature = "std"), no_std)]

mod log;

pub mod checksum;
pub mod error;
pub mod flash;
pub mod image;
pub mod launch;
pub mod partition;
pub mod protocol;
pub mod transport;
pub mod update;

// Re-export commonly used types
pub use error::{BootloaderError, ErrorCode, FlashError};
pub use flash::{DriverError, FlashDriver, FlashRegion, Word, WORD_SIZE};
pub use launch::HardwareControl;
pub use partition::{MemoryPartition, RP2040_PARTITION};
pub use protocol::{Command, CommandId, Response};
pub use transport::{RecvError, Transport};
pub use update::{BootState, Bootloader, DownloadOutcome, DownloadSession};
