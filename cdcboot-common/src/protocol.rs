// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Fixed-layout frames exchanged between the host and the bootloader.
//!
//! Commands are 7-byte frames, responses are 3-byte frames, and firmware data
//! travels as headerless 64-byte packets once a download has been accepted.
//! Multi-byte fields are little-endian.

use crate::error::ErrorCode;
use crate::flash::WORD_SIZE;

// --- Frame geometry ---

pub const COMMAND_FRAME_SIZE: usize = 7;
pub const RESPONSE_FRAME_SIZE: usize = 3;

/// Firmware bytes carried by one data packet.
pub const PACKET_SIZE: usize = 64;
pub const PACKET_WORDS: usize = PACKET_SIZE / WORD_SIZE as usize;

// --- Identifiers ---

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandId {
    Ack = 0x10,
    Packet = 0x20,
    PacketAck = 0x30,
    PacketNack = 0x40,
    Error = 0x50,
    Execute = 0x60,
    EraseApp = 0x70,
    DownloadFw = 0x80,
}

impl CommandId {
    pub fn from_u8(value: u8) -> Option<Self> {
        let id = match value {
            0x10 => Self::Ack,
            0x20 => Self::Packet,
            0x30 => Self::PacketAck,
            0x40 => Self::PacketNack,
            0x50 => Self::Error,
            0x60 => Self::Execute,
            0x70 => Self::EraseApp,
            0x80 => Self::DownloadFw,
            _ => return None,
        };
        Some(id)
    }
}

// --- Commands (host -> bootloader) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Execute,
    EraseApp,
    DownloadFw { packets: u16, checksum: u32 },
    /// The data-packet identifier. Data packets never travel as commands, so
    /// receiving this in a command slot is a protocol error.
    Packet,
    /// Any byte that is not a command this bootloader accepts.
    Unrecognized(u8),
}

impl Command {
    /// Decode a command frame. Never fails: missing trailing bytes read as
    /// zero and unknown identifiers become `Unrecognized`.
    pub fn decode(frame: &[u8]) -> Self {
        let mut raw = [0u8; COMMAND_FRAME_SIZE];
        let n = frame.len().min(COMMAND_FRAME_SIZE);
        raw[..n].copy_from_slice(&frame[..n]);

        match CommandId::from_u8(raw[0]) {
            Some(CommandId::Execute) => Self::Execute,
            Some(CommandId::EraseApp) => Self::EraseApp,
            Some(CommandId::DownloadFw) => Self::DownloadFw {
                packets: u16::from_le_bytes([raw[1], raw[2]]),
                checksum: u32::from_le_bytes([raw[3], raw[4], raw[5], raw[6]]),
            },
            Some(CommandId::Packet) => Self::Packet,
            _ => Self::Unrecognized(raw[0]),
        }
    }

    pub fn encode(&self) -> [u8; COMMAND_FRAME_SIZE] {
        let mut frame = [0u8; COMMAND_FRAME_SIZE];
        match *self {
            Self::Execute => frame[0] = CommandId::Execute as u8,
            Self::EraseApp => frame[0] = CommandId::EraseApp as u8,
            Self::DownloadFw { packets, checksum } => {
                frame[0] = CommandId::DownloadFw as u8;
                frame[1..3].copy_from_slice(&packets.to_le_bytes());
                frame[3..7].copy_from_slice(&checksum.to_le_bytes());
            }
            Self::Packet => frame[0] = CommandId::Packet as u8,
            Self::Unrecognized(id) => frame[0] = id,
        }
        frame
    }

    /// Identifier byte echoed back in an `Ack`.
    pub fn id(&self) -> u8 {
        match *self {
            Self::Execute => CommandId::Execute as u8,
            Self::EraseApp => CommandId::EraseApp as u8,
            Self::DownloadFw { .. } => CommandId::DownloadFw as u8,
            Self::Packet => CommandId::Packet as u8,
            Self::Unrecognized(id) => id,
        }
    }
}

// --- Responses (bootloader -> host) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Command accepted; carries the acknowledged command identifier.
    Ack(CommandId),
    PacketAck(u16),
    PacketNack(u16),
    Error(ErrorCode),
}

impl Response {
    pub fn encode(&self) -> [u8; RESPONSE_FRAME_SIZE] {
        let mut frame = [0u8; RESPONSE_FRAME_SIZE];
        match *self {
            Self::Ack(cmd) => {
                frame[0] = CommandId::Ack as u8;
                frame[1] = cmd as u8;
            }
            Self::PacketAck(seq) => {
                frame[0] = CommandId::PacketAck as u8;
                frame[1..3].copy_from_slice(&seq.to_le_bytes());
            }
            Self::PacketNack(seq) => {
                frame[0] = CommandId::PacketNack as u8;
                frame[1..3].copy_from_slice(&seq.to_le_bytes());
            }
            Self::Error(code) => {
                frame[0] = CommandId::Error as u8;
                frame[1] = code.as_u8();
            }
        }
        frame
    }

    /// Decode a response frame, `None` if it is not one of the four kinds.
    pub fn decode(frame: &[u8]) -> Option<Self> {
        let &[id, b1, b2] = frame.get(..RESPONSE_FRAME_SIZE)? else {
            return None;
        };

        match CommandId::from_u8(id)? {
            CommandId::Ack => CommandId::from_u8(b1).map(Self::Ack),
            CommandId::PacketAck => Some(Self::PacketAck(u16::from_le_bytes([b1, b2]))),
            CommandId::PacketNack => Some(Self::PacketNack(u16::from_le_bytes([b1, b2]))),
            CommandId::Error => ErrorCode::from_u8(b1).map(Self::Error),
            _ => None,
        }
    }
}
