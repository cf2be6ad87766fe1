//! Bit-exact flash layout shared by the save writer and validator.

/// Payload bytes stored in every sector.
pub const SECTOR_DATA_SIZE: usize = 3968;
/// Trailer reserved after the payload. Only the last 12 bytes are used.
pub const SECTOR_FOOTER_SIZE: usize = 128;
/// Physical flash sector size.
pub const SECTOR_SIZE: usize = SECTOR_DATA_SIZE + SECTOR_FOOTER_SIZE;

/// Footer layout, little endian:
/// - `id: u16`
/// - `checksum: u16`
/// - `security: u32`
/// - `counter: u32`
pub const FOOTER_USED_BYTES: usize = 12;
pub const FOOTER_ID_OFFSET: usize = SECTOR_SIZE - FOOTER_USED_BYTES;
pub const FOOTER_CHECKSUM_OFFSET: usize = FOOTER_ID_OFFSET + 2;
pub const SECTOR_SECURITY_OFFSET: usize = FOOTER_CHECKSUM_OFFSET + 2;
pub const FOOTER_COUNTER_OFFSET: usize = SECTOR_SECURITY_OFFSET + 4;

/// Marks a sector as fully written by the save engine.
pub const SECTOR_SECURITY_NUM: u32 = 0x0801_2025;

pub const NUM_SAVE_SLOTS: u16 = 2;
pub const SECTORS_PER_SLOT: u16 = 14;
/// Physical sectors on the flash chip, save slots plus reserved sectors.
pub const SECTORS_COUNT: u16 = 32;
/// First physical sector after both save slots.
pub const RESERVED_SECTORS_START: u16 = NUM_SAVE_SLOTS * SECTORS_PER_SLOT;

pub const SECTOR_ID_SAVEBLOCK2: u16 = 0;
pub const SECTOR_ID_SAVEBLOCK1_START: u16 = 1;
pub const SECTOR_ID_SAVEBLOCK1_END: u16 = 4;
pub const SECTOR_ID_PKMN_STORAGE_START: u16 = 5;
pub const SECTOR_ID_PKMN_STORAGE_END: u16 = 13;

// Sectors 28..=31 belong to other subsystems and are never written here.
pub const SECTOR_ID_HOF_1: u16 = 28;
pub const SECTOR_ID_HOF_2: u16 = 29;
pub const SECTOR_ID_TRAINER_HILL: u16 = 30;
pub const SECTOR_ID_RECORDED_BATTLE: u16 = 31;

/// Logical chunk id, stable for the lifetime of a build.
pub type ChunkId = u16;

/// Save slot targeted by a generation counter.
#[inline]
pub const fn slot_for_counter(counter: u32) -> u16 {
    (counter % NUM_SAVE_SLOTS as u32) as u16
}

/// Maps a chunk id to its physical sector for the given rotation and generation.
#[inline]
pub const fn physical_sector(chunk_id: ChunkId, rotation: u16, counter: u32) -> u16 {
    let in_slot = (chunk_id as u32 + rotation as u32) % SECTORS_PER_SLOT as u32;
    in_slot as u16 + SECTORS_PER_SLOT * slot_for_counter(counter)
}
