use heapless::Vec;
use log::{debug, info, warn};

use super::{ChunkTable, MAX_CHUNKS, SaveEngine, SaveMode, SaveStatus};
use crate::{
    config::CommitStrategy,
    flash::FlashDriver,
    layout::{
        ChunkId, SECTOR_ID_SAVEBLOCK1_END, SECTOR_ID_SAVEBLOCK2, SECTOR_SECURITY_OFFSET,
        physical_sector,
    },
};

/// A sector that failed to program during a write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SectorFault {
    pub chunk_id: ChunkId,
    pub physical: u16,
}

/// Outcome of a full-generation write.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteReport {
    pub status: SaveStatus,
    pub failed: Vec<SectorFault, MAX_CHUNKS>,
}

impl WriteReport {
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

impl<F: FlashDriver> SaveEngine<F> {
    /// Writes every chunk as a new generation into the other slot.
    ///
    /// Rotation and counter advance before the first sector is programmed.
    /// A failed sector does not stop the remaining ones; if any failed, both
    /// values return to their previous state and the report is `Error`.
    pub fn write_generation(&mut self, chunks: &ChunkTable<'_>) -> WriteReport {
        let (last_rotation, last_counter) = (self.rotation, self.counter);
        self.advance_generation();
        debug!(
            "save-write: begin generation counter={} rotation={} chunks={}",
            self.counter,
            self.rotation,
            chunks.len()
        );

        let mut failed = Vec::new();
        for chunk_id in 0..chunks.len() as ChunkId {
            if let Err(fault) = self.write_chunk(chunk_id, chunks) {
                // Capacity matches the chunk table, so this cannot overflow.
                let _ = failed.push(fault);
            }
        }

        if failed.is_empty() {
            info!(
                "save-write: committed generation counter={} rotation={}",
                self.counter, self.rotation
            );
            WriteReport {
                status: SaveStatus::Ok,
                failed,
            }
        } else {
            warn!(
                "save-write: rolled back generation counter={} failed_sectors={}",
                self.counter,
                failed.len()
            );
            self.rotation = last_rotation;
            self.counter = last_counter;
            WriteReport {
                status: SaveStatus::Error,
                failed,
            }
        }
    }

    /// Rewrites one chunk in the current generation without advancing it.
    pub fn write_single(&mut self, chunk_id: ChunkId, chunks: &ChunkTable<'_>) -> SaveStatus {
        match self.write_chunk(chunk_id, chunks) {
            Ok(()) => SaveStatus::Ok,
            Err(_) => SaveStatus::Error,
        }
    }

    /// Saves per `mode`; `Ok` only when no sector is marked damaged afterwards.
    pub fn try_save(&mut self, mode: SaveMode, chunks: &ChunkTable<'_>) -> SaveStatus {
        match mode {
            SaveMode::Full => {
                self.write_generation(chunks);
            }
            SaveMode::SaveBlocks => {
                for chunk_id in SECTOR_ID_SAVEBLOCK2..=SECTOR_ID_SAVEBLOCK1_END {
                    self.write_single(chunk_id, chunks);
                }
            }
            SaveMode::SaveBlock2 => {
                self.write_single(SECTOR_ID_SAVEBLOCK2, chunks);
            }
        }

        if self.damaged.any() {
            SaveStatus::Error
        } else {
            SaveStatus::Ok
        }
    }

    fn write_chunk(
        &mut self,
        chunk_id: ChunkId,
        chunks: &ChunkTable<'_>,
    ) -> Result<(), SectorFault> {
        let physical = physical_sector(chunk_id, self.rotation, self.counter);
        let fault = SectorFault { chunk_id, physical };
        let Some(data) = chunks.get(chunk_id) else {
            warn!("save-write: unknown chunk chunk={}", chunk_id);
            return Err(fault);
        };

        self.scratch.stamp(chunk_id, self.counter, data);

        let result = match self.config.strategy {
            CommitStrategy::ProgramAndVerify => self.program_sector(physical),
            CommitStrategy::CommitByte => self.replace_sector(physical),
        };

        match result {
            Ok(()) => {
                debug!(
                    "save-write: sector ok physical={} chunk={} counter={}",
                    physical, chunk_id, self.counter
                );
                self.damaged.mark_ok(physical);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "save-write: sector failed physical={} chunk={} err={:?}",
                    physical, chunk_id, err
                );
                self.damaged.mark_damaged(physical);
                Err(fault)
            }
        }
    }

    fn program_sector(&mut self, physical: u16) -> Result<(), F::Error> {
        let image = self.scratch.as_bytes();
        let flash = &mut self.flash;
        critical_section::with(|_| flash.program_and_verify(physical, image))
    }

    // Erase, then everything but the first security byte, then that byte.
    fn replace_sector(&mut self, physical: u16) -> Result<(), F::Error> {
        let image = self.scratch.as_bytes();
        let flash = &mut self.flash;

        critical_section::with(|_| flash.erase_sector(physical))?;

        critical_section::with(|_| {
            for (offset, byte) in image.iter().enumerate().take(SECTOR_SECURITY_OFFSET) {
                flash.program_byte(physical, offset, *byte)?;
            }
            Ok::<(), F::Error>(())
        })?;

        critical_section::with(|_| {
            for (offset, byte) in image.iter().enumerate().skip(SECTOR_SECURITY_OFFSET + 1) {
                flash.program_byte(physical, offset, *byte)?;
            }
            Ok::<(), F::Error>(())
        })?;

        critical_section::with(|_| {
            let commit = image[SECTOR_SECURITY_OFFSET];
            flash.program_byte(physical, SECTOR_SECURITY_OFFSET, commit)
        })
    }
}
