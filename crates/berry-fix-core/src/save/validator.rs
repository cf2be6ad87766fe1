use log::{debug, info, warn};

use super::{ChunkSet, ChunkTable, Footer, SaveEngine, SaveStatus};
use crate::{
    flash::FlashDriver,
    layout::{SECTORS_PER_SLOT, slot_for_counter},
};

/// Result of scanning one slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlotScan {
    /// `Empty` when no sector carries the security magic, `Ok` when every
    /// chunk id validated, `Error` otherwise.
    pub status: SaveStatus,
    pub valid: ChunkSet,
    /// Counter of the last valid sector seen.
    pub counter: u32,
}

/// Authoritative generation chosen across both slots.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Resolution {
    pub status: SaveStatus,
    pub counter: u32,
}

impl<F: FlashDriver> SaveEngine<F> {
    pub fn validate_slot(&mut self, slot: u16, chunks: &ChunkTable<'_>) -> SlotScan {
        let base = slot * SECTORS_PER_SLOT;
        let mut authentic = false;
        let mut valid = ChunkSet::empty();
        let mut counter = 0;

        for position in 0..SECTORS_PER_SLOT {
            if !self.read_sector(base + position) {
                continue;
            }

            let footer = self.scratch.footer();
            if !footer.is_authentic() {
                continue;
            }
            authentic = true;

            if self.sector_matches(&footer, chunks) {
                counter = footer.counter;
                valid.insert(footer.id);
            } else {
                debug!(
                    "save-scan: checksum mismatch physical={} chunk={}",
                    base + position,
                    footer.id
                );
            }
        }

        let expected = chunks.all_ids();
        let status = if !authentic {
            SaveStatus::Empty
        } else if valid.bits() & expected.bits() == expected.bits() {
            SaveStatus::Ok
        } else {
            SaveStatus::Error
        };

        debug!(
            "save-scan: slot={} status={:?} valid=0x{:04x} counter={}",
            slot,
            status,
            valid.bits(),
            counter
        );

        SlotScan {
            status,
            valid,
            counter,
        }
    }

    /// Scans both slots and adopts the newest usable generation counter.
    pub fn resolve(&mut self, chunks: &ChunkTable<'_>) -> Resolution {
        let first = self.validate_slot(0, chunks);
        let second = self.validate_slot(1, chunks);

        let status = match (first.status, second.status) {
            (SaveStatus::Ok, SaveStatus::Ok) => {
                self.counter = newer_counter(first.counter, second.counter);
                SaveStatus::Ok
            }
            (SaveStatus::Ok, other) => {
                self.counter = first.counter;
                degraded(other)
            }
            (other, SaveStatus::Ok) => {
                self.counter = second.counter;
                degraded(other)
            }
            (SaveStatus::Empty, SaveStatus::Empty) => {
                self.counter = 0;
                self.rotation = 0;
                SaveStatus::Empty
            }
            _ => {
                self.counter = 0;
                self.rotation = 0;
                SaveStatus::Corrupt
            }
        };

        match status {
            SaveStatus::Ok | SaveStatus::Empty => info!(
                "save-scan: resolved status={:?} counter={}",
                status, self.counter
            ),
            _ => warn!(
                "save-scan: resolved status={:?} counter={} slot0={:?} slot1={:?}",
                status, self.counter, first.status, second.status
            ),
        }

        Resolution {
            status,
            counter: self.counter,
        }
    }

    /// Copies every valid sector of the current slot into its chunk.
    ///
    /// Chunks whose sector does not validate keep their in-memory contents.
    /// The slot position of any readable sector stamped with chunk id 0
    /// becomes the rotation offset, whether or not that sector validates.
    pub fn load(&mut self, chunks: &mut ChunkTable<'_>) -> ChunkSet {
        let base = slot_for_counter(self.counter) * SECTORS_PER_SLOT;
        let mut loaded = ChunkSet::empty();

        for position in 0..SECTORS_PER_SLOT {
            if !self.read_sector(base + position) {
                continue;
            }

            let footer = self.scratch.footer();
            if footer.id == 0 {
                self.rotation = position;
            }

            if !footer.is_authentic() || !self.sector_matches(&footer, chunks) {
                continue;
            }

            if let Some(dest) = chunks.get_mut(footer.id) {
                let len = dest.len();
                dest.copy_from_slice(&self.scratch.data()[..len]);
                loaded.insert(footer.id);
            }
        }

        debug!(
            "save-load: slot={} loaded=0x{:04x} rotation={}",
            slot_for_counter(self.counter),
            loaded.bits(),
            self.rotation
        );
        loaded
    }

    /// Resolves the authoritative slot and restores its chunks.
    pub fn load_save(&mut self, chunks: &mut ChunkTable<'_>) -> SaveStatus {
        if !self.flash_present {
            return SaveStatus::NoFlash;
        }

        let resolution = self.resolve(chunks);
        self.load(chunks);
        resolution.status
    }

    fn read_sector(&mut self, physical: u16) -> bool {
        let image = self.scratch.as_bytes_mut();
        let flash = &mut self.flash;

        match critical_section::with(|_| flash.read(physical, 0, image)) {
            Ok(()) => true,
            Err(err) => {
                warn!("save-scan: read failed physical={} err={:?}", physical, err);
                false
            }
        }
    }

    fn sector_matches(&self, footer: &Footer, chunks: &ChunkTable<'_>) -> bool {
        chunks
            .size(footer.id)
            .is_some_and(|size| self.scratch.payload_checksum(size) == footer.checksum)
    }
}

fn degraded(other: SaveStatus) -> SaveStatus {
    if other == SaveStatus::Error {
        SaveStatus::Error
    } else {
        SaveStatus::Ok
    }
}

// Plain comparison, except `u32::MAX` followed by `0` where `0` is newer.
fn newer_counter(first: u32, second: u32) -> u32 {
    let wrapped_pair = (first == u32::MAX && second == 0) || (first == 0 && second == u32::MAX);
    let second_is_newer = if wrapped_pair {
        first.wrapping_add(1) < second.wrapping_add(1)
    } else {
        first < second
    };

    if second_is_newer { second } else { first }
}
