// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash region manager: bounds, verify-on-write, erase and lock discipline.

mod common;

use cdcboot_common::FlashError;
use common::{flash_region, APP_END, APP_START, ERASED, TEST_PARTITION};

#[test]
fn test_init_is_idempotent() {
    let mut flash = flash_region();

    assert_eq!(flash.init(), Ok(()));
    assert_eq!(flash.init(), Ok(()));
    assert_eq!(flash.driver().status_clears, 2);
    assert!(flash.driver().locked);
}

#[test]
fn test_init_reports_unlock_failure() {
    let mut flash = flash_region();
    flash.driver_mut().unlock_fails = true;

    assert_eq!(flash.init(), Err(FlashError::InitFailed));
    assert_eq!(flash.driver().status_clears, 0);
}

#[test]
fn test_write_words_programs_and_relocks() {
    let mut flash = flash_region();
    let words = [0x2002_0000, 0x0800_0901, 0xDEAD_BEEF];

    assert_eq!(flash.write_words(APP_START, &words), Ok(()));

    assert_eq!(flash.driver().word_at(APP_START), 0x2002_0000);
    assert_eq!(flash.driver().word_at(APP_START + 4), 0x0800_0901);
    assert_eq!(flash.driver().word_at(APP_START + 8), 0xDEAD_BEEF);
    assert_eq!(flash.driver().programs, 3);
    assert!(flash.driver().locked);
}

#[test]
fn test_write_may_end_exactly_at_window_end() {
    let mut flash = flash_region();

    assert_eq!(flash.write_words(APP_END - 8, &[1, 2]), Ok(()));
    assert_eq!(flash.driver().word_at(APP_END - 4), 2);
}

#[test]
fn test_write_out_of_range_writes_nothing() {
    let cases: [(u32, usize); 6] = [
        (APP_START - 4, 1),            // below the window, in the bootloader
        (TEST_PARTITION.flash_base, 1), // bootloader base
        (APP_END - 4, 2),              // runs past the end
        (APP_END, 1),                  // starts at the end
        (APP_START + 2, 1),            // unaligned
        (u32::MAX - 3, 2),             // address arithmetic overflow
    ];

    for (address, count) in cases {
        let mut flash = flash_region();
        let before = flash.driver().words.clone();

        let words = vec![0u32; count];
        assert_eq!(
            flash.write_words(address, &words),
            Err(FlashError::WriteOutOfRange),
            "address 0x{address:08x}, {count} words"
        );
        assert_eq!(flash.driver().programs, 0);
        assert_eq!(flash.driver().words, before);
        assert!(flash.driver().locked);
    }
}

#[test]
fn test_verify_mismatch_stops_after_offending_word() {
    let mut flash = flash_region();
    // Word 2 is not erased: programming can only clear bits, so the readback
    // of 0xFFFF_0000 comes back as 0x0000_0000.
    flash.driver_mut().set_word(APP_START + 8, 0x0000_0000);

    let words = [0x1111_1111, 0x2222_2222, 0xFFFF_0000, 0x4444_4444, 0x5555_5555];
    assert_eq!(
        flash.write_words(APP_START, &words),
        Err(FlashError::WriteVerifyMismatch)
    );

    assert_eq!(flash.driver().programs, 3);
    assert_eq!(flash.driver().word_at(APP_START + 12), ERASED);
    assert!(flash.driver().locked);
}

#[test]
fn test_program_failure_keeps_earlier_words() {
    let mut flash = flash_region();
    flash.driver_mut().fail_program_at = Some(APP_START + 4);

    assert_eq!(
        flash.write_words(APP_START, &[0xAAAA_AAAA, 0xBBBB_BBBB, 0xCCCC_CCCC]),
        Err(FlashError::WriteFailed)
    );

    assert_eq!(flash.driver().programs, 2);
    assert_eq!(flash.driver().word_at(APP_START), 0xAAAA_AAAA);
    assert_eq!(flash.driver().word_at(APP_START + 8), ERASED);
    assert!(flash.driver().locked);
}

#[test]
fn test_write_fails_when_unlock_fails() {
    let mut flash = flash_region();
    flash.driver_mut().unlock_fails = true;

    assert_eq!(
        flash.write_words(APP_START, &[1]),
        Err(FlashError::WriteFailed)
    );
    assert_eq!(flash.driver().programs, 0);
}

#[test]
fn test_read_words_covers_whole_device() {
    let mut flash = flash_region();
    flash.driver_mut().set_word(TEST_PARTITION.flash_base, 0x1234_5678);
    flash.driver_mut().set_word(APP_END - 4, 0x0BAD_CAFE);

    let head = flash
        .read_words::<4>(TEST_PARTITION.flash_base, 2)
        .unwrap();
    assert_eq!(head.as_slice(), &[0x1234_5678, ERASED]);

    assert_eq!(flash.read_word(APP_END - 4), Ok(0x0BAD_CAFE));
}

#[test]
fn test_read_out_of_range_returns_nothing() {
    let flash = flash_region();
    let end = TEST_PARTITION.flash_end();

    assert_eq!(
        flash.read_words::<4>(TEST_PARTITION.flash_base - 4, 1),
        Err(FlashError::ReadOutOfRange)
    );
    assert_eq!(
        flash.read_words::<4>(end - 4, 2),
        Err(FlashError::ReadOutOfRange)
    );
    assert_eq!(
        flash.read_words::<4>(APP_START + 1, 1),
        Err(FlashError::ReadOutOfRange)
    );
    // More than the caller's buffer can hold
    assert_eq!(
        flash.read_words::<2>(APP_START, 3),
        Err(FlashError::ReadOutOfRange)
    );
}

#[test]
fn test_erase_sector_only_touches_target() {
    let mut flash = flash_region();
    let sector_words = (TEST_PARTITION.sector_size / 4) as usize;
    flash.driver_mut().words.fill(0);

    assert_eq!(flash.erase_sector(3), Ok(()));

    let words = &flash.driver().words;
    assert!(words[3 * sector_words..4 * sector_words]
        .iter()
        .all(|&w| w == ERASED));
    assert!(words[..3 * sector_words].iter().all(|&w| w == 0));
    assert!(words[4 * sector_words..].iter().all(|&w| w == 0));
    assert!(flash.driver().locked);
}

#[test]
fn test_erase_refuses_bootloader_and_missing_sectors() {
    let mut flash = flash_region();

    assert_eq!(flash.erase_sector(0), Err(FlashError::EraseOutOfRange));
    assert_eq!(flash.erase_sector(1), Err(FlashError::EraseOutOfRange));
    assert_eq!(flash.erase_sector(8), Err(FlashError::EraseOutOfRange));
    assert!(flash.driver().erases.is_empty());
}

#[test]
fn test_erase_failure_is_reported_without_retry() {
    let mut flash = flash_region();
    flash.driver_mut().fail_erase(4, 1);

    assert_eq!(flash.erase_sector(4), Err(FlashError::EraseFailed));
    assert_eq!(flash.driver().erases, vec![4]);
    assert!(flash.driver().locked);
}

#[test]
fn test_erase_application_region_ascending() {
    let mut flash = flash_region();
    flash.driver_mut().words.fill(0);

    assert_eq!(flash.erase_application_region(), Ok(()));
    assert_eq!(flash.driver().erases, vec![2, 3, 4, 5, 6, 7]);
    assert!(flash.driver().app_is_erased());
    assert_eq!(flash.driver().word_at(APP_START - 4), 0);
}

#[test]
fn test_erase_application_region_stops_at_first_failure() {
    let mut flash = flash_region();
    flash.driver_mut().fail_erase(4, 1);

    assert_eq!(
        flash.erase_application_region(),
        Err(FlashError::EraseFailed)
    );
    assert_eq!(flash.driver().erases, vec![2, 3, 4]);
    assert!(flash.driver().locked);
}
