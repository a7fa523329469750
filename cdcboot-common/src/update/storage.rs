// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use crate::error::FlashError;
use crate::flash::{FlashDriver, FlashRegion};
use crate::log;
use crate::partition::SectorId;

/// Attempts per sector before an application erase is reported failed.
pub const ERASE_ATTEMPTS: u8 = 3;

/// Erase the application region sector by sector, retrying transient
/// failures. Stops at the first sector that keeps failing.
pub(super) fn erase_application<D: FlashDriver>(
    flash: &mut FlashRegion<D>,
) -> Result<(), FlashError> {
    let sectors = flash.partition().app_sectors.clone();
    log::info!("Erasing application sectors {}..{}", sectors.start, sectors.end);

    for sector in sectors {
        erase_with_retry(flash, sector)?;
    }
    Ok(())
}

fn erase_with_retry<D: FlashDriver>(
    flash: &mut FlashRegion<D>,
    sector: SectorId,
) -> Result<(), FlashError> {
    let mut attempt = 1;
    loop {
        match flash.erase_sector(sector) {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= ERASE_ATTEMPTS => {
                log::error!("sector {} erase gave up after {} attempts", sector, attempt);
                return Err(e);
            }
            Err(_) => attempt += 1,
        }
    }
}

/// Clear the initial stack pointer so the slot no longer passes
/// `application_exists`. Programming only clears bits, so this works on a
/// sector that refuses to erase.
pub(super) fn invalidate_application<D: FlashDriver>(
    flash: &mut FlashRegion<D>,
) -> Result<(), FlashError> {
    let app_start = flash.partition().app_start;
    flash.write_words(app_start, &[0])
}
