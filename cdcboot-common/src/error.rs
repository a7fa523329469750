// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error kinds and their on-wire codes.

use core::fmt;

/// Failures reported by the flash region manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The controller refused to unlock during initialization.
    InitFailed,
    /// The hardware reported a failed sector erase.
    EraseFailed,
    /// The sector is not part of the application region.
    EraseOutOfRange,
    /// Target range is unaligned or leaves the application window.
    WriteOutOfRange,
    /// A programmed word read back differently.
    WriteVerifyMismatch,
    /// The hardware reported a failed word program.
    WriteFailed,
    /// Target range is unaligned or leaves the flash device.
    ReadOutOfRange,
}

/// Computed checksum did not match the one announced by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChecksumMismatch {
    pub expected: u32,
    pub actual: u32,
}

/// Everything the state machine can end up reporting to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootloaderError {
    Flash(FlashError),
    InvalidCommand,
    InvalidState,
    ChecksumMismatch(ChecksumMismatch),
    DownloadFailed,
    NoUserApp,
    ReceiveTimeout,
}

impl From<FlashError> for BootloaderError {
    fn from(e: FlashError) -> Self {
        Self::Flash(e)
    }
}

impl From<ChecksumMismatch> for BootloaderError {
    fn from(e: ChecksumMismatch) -> Self {
        Self::ChecksumMismatch(e)
    }
}

/// Error identifier carried in the second byte of an `Error` response.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    FlashInitFailed = 0x02,
    EraseFailed = 0x03,
    WriteFailed = 0x04,
    ReadOutOfRange = 0x05,
    WriteOutOfRange = 0x06,
    WriteVerifyMismatch = 0x07,
    ChecksumMismatch = 0x7F,
    InvalidCommand = 0x80,
    InvalidState = 0x81,
    ReceiveTimeout = 0x82,
    DownloadFailed = 0x83,
    NoUserApp = 0x84,
}

impl ErrorCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        let code = match value {
            0x02 => Self::FlashInitFailed,
            0x03 => Self::EraseFailed,
            0x04 => Self::WriteFailed,
            0x05 => Self::ReadOutOfRange,
            0x06 => Self::WriteOutOfRange,
            0x07 => Self::WriteVerifyMismatch,
            0x7F => Self::ChecksumMismatch,
            0x80 => Self::InvalidCommand,
            0x81 => Self::InvalidState,
            0x82 => Self::ReceiveTimeout,
            0x83 => Self::DownloadFailed,
            0x84 => Self::NoUserApp,
            _ => return None,
        };
        Some(code)
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<FlashError> for ErrorCode {
    fn from(e: FlashError) -> Self {
        match e {
            FlashError::InitFailed => Self::FlashInitFailed,
            FlashError::EraseFailed | FlashError::EraseOutOfRange => Self::EraseFailed,
            FlashError::WriteOutOfRange => Self::WriteOutOfRange,
            FlashError::WriteVerifyMismatch => Self::WriteVerifyMismatch,
            FlashError::WriteFailed => Self::WriteFailed,
            FlashError::ReadOutOfRange => Self::ReadOutOfRange,
        }
    }
}

impl From<BootloaderError> for ErrorCode {
    fn from(e: BootloaderError) -> Self {
        match e {
            BootloaderError::Flash(flash) => flash.into(),
            BootloaderError::InvalidCommand => Self::InvalidCommand,
            BootloaderError::InvalidState => Self::InvalidState,
            BootloaderError::ChecksumMismatch(_) => Self::ChecksumMismatch,
            BootloaderError::DownloadFailed => Self::DownloadFailed,
            BootloaderError::NoUserApp => Self::NoUserApp,
            BootloaderError::ReceiveTimeout => Self::ReceiveTimeout,
        }
    }
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InitFailed => "flash unlock failed",
            Self::EraseFailed => "sector erase failed",
            Self::EraseOutOfRange => "sector outside application region",
            Self::WriteOutOfRange => "write outside application window",
            Self::WriteVerifyMismatch => "written word reads back differently",
            Self::WriteFailed => "word program failed",
            Self::ReadOutOfRange => "read outside flash",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for BootloaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flash(e) => write!(f, "flash: {e}"),
            Self::InvalidCommand => f.write_str("invalid command"),
            Self::InvalidState => f.write_str("invalid bootloader state"),
            Self::ChecksumMismatch(m) => write!(
                f,
                "checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
                m.expected, m.actual
            ),
            Self::DownloadFailed => f.write_str("firmware download failed"),
            Self::NoUserApp => f.write_str("no user application"),
            Self::ReceiveTimeout => f.write_str("receive timeout"),
        }
    }
}
