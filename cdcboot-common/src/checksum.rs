// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Image checksum shared by the sender and the bootloader.
//!
//! CRC-32/MPEG-2 (poly 0x04C11DB7, init 0xFFFFFFFF, no reflection, no final
//! XOR) over 32-bit words, each word fed most significant byte first. This is
//! what a word-fed STM32-style CRC unit computes, so a target with such a unit
//! can answer through [`FlashDriver::hardware_crc`] instead.

use crc::{Crc, CRC_32_MPEG_2};

use crate::flash::{FlashDriver, Word, WORD_SIZE};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Checksum of `word_count` words of flash starting at `address`.
///
/// No state is carried between calls; the result depends only on the flash
/// contents at the time of the call.
pub fn checksum<D: FlashDriver>(driver: &mut D, address: u32, word_count: u32) -> u32 {
    if let Some(crc) = driver.hardware_crc(address, word_count) {
        return crc;
    }

    let words = (0..word_count).map(|i| driver.read_word(address + i * WORD_SIZE));
    checksum_words(words)
}

pub fn checksum_words(words: impl IntoIterator<Item = Word>) -> u32 {
    let mut digest = CRC32.digest();
    for word in words {
        digest.update(&word.to_be_bytes());
    }
    digest.finalize()
}

/// Sender-side checksum of a raw image as it will sit in flash
/// (little-endian words). A trailing partial word is zero-padded.
pub fn checksum_image(image: &[u8]) -> u32 {
    checksum_words(image.chunks(WORD_SIZE as usize).map(|chunk| {
        let mut word = [0u8; WORD_SIZE as usize];
        word[..chunk.len()].copy_from_slice(chunk);
        Word::from_le_bytes(word)
    }))
}
