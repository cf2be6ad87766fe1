//! In-memory copies of the three save structures backed by the flash slots.

use berry_fix_core::{
    rtc::Time,
    save::{ChunkTable, ChunkTableError},
};

pub const SAVE_BLOCK2_SIZE: usize = 0x890;
pub const SAVE_BLOCK1_SIZE: usize = 0x3AC0;
pub const POKEMON_STORAGE_SIZE: usize = 0x83D0;

/// Offsets of the stored clock values inside SaveBlock2.
pub const LOCAL_TIME_OFFSET: usize = 0x98;
pub const LAST_BERRY_TREE_UPDATE: usize = 0xA0;

/// Event variables live in SaveBlock1 as little-endian `u16`s.
pub const VARS_OFFSET: usize = 0x1340;
pub const VARS_COUNT: usize = 256;
pub const VARS_START: u16 = 0x4000;
pub const SPECIAL_VARS_START: u16 = 0x8000;

/// Day number on which the Pacifidlog TM was last handed out.
pub const VAR_PACIFIDLOG_TM_RECEIVED_DAY: u16 = 0x4049;

/// Event variable id with no backing storage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnknownVar(pub u16);

/// SaveBlock2, SaveBlock1 and the box storage, in chunk order.
#[derive(Clone)]
pub struct SaveBlocks {
    save_block2: [u8; SAVE_BLOCK2_SIZE],
    save_block1: [u8; SAVE_BLOCK1_SIZE],
    pokemon_storage: [u8; POKEMON_STORAGE_SIZE],
}

impl Default for SaveBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SaveBlocks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SaveBlocks")
            .field("local_time_offset", &self.local_time_offset())
            .field("last_berry_tree_update", &self.last_berry_tree_update())
            .field(
                "pacifidlog_tm_day",
                &self.var(VAR_PACIFIDLOG_TM_RECEIVED_DAY),
            )
            .finish_non_exhaustive()
    }
}

impl SaveBlocks {
    pub const fn new() -> Self {
        Self {
            save_block2: [0; SAVE_BLOCK2_SIZE],
            save_block1: [0; SAVE_BLOCK1_SIZE],
            pokemon_storage: [0; POKEMON_STORAGE_SIZE],
        }
    }

    /// Splits the blocks into the 14 sector-sized chunks of one save slot:
    /// SaveBlock2 (1), SaveBlock1 (4), box storage (9).
    pub fn chunk_table(&mut self) -> Result<ChunkTable<'_>, ChunkTableError> {
        let mut table = ChunkTable::new();
        table.push_split(&mut self.save_block2)?;
        table.push_split(&mut self.save_block1)?;
        table.push_split(&mut self.pokemon_storage)?;
        Ok(table)
    }

    pub fn save_block2(&self) -> &[u8] {
        &self.save_block2
    }

    pub fn save_block1(&self) -> &[u8] {
        &self.save_block1
    }

    pub fn pokemon_storage(&self) -> &[u8] {
        &self.pokemon_storage
    }

    pub fn var(&self, id: u16) -> Option<u16> {
        let offset = var_offset(id)?;
        let bytes = [self.save_block1[offset], self.save_block1[offset + 1]];
        Some(u16::from_le_bytes(bytes))
    }

    pub fn set_var(&mut self, id: u16, value: u16) -> Result<(), UnknownVar> {
        let offset = var_offset(id).ok_or(UnknownVar(id))?;
        self.save_block1[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Difference between the clock and the player's in-game time.
    pub fn local_time_offset(&self) -> Time {
        self.time_at(LOCAL_TIME_OFFSET)
    }

    pub fn set_local_time_offset(&mut self, time: &Time) {
        self.set_time_at(LOCAL_TIME_OFFSET, time);
    }

    pub fn last_berry_tree_update(&self) -> Time {
        self.time_at(LAST_BERRY_TREE_UPDATE)
    }

    pub fn set_last_berry_tree_update(&mut self, time: &Time) {
        self.set_time_at(LAST_BERRY_TREE_UPDATE, time);
    }

    fn time_at(&self, offset: usize) -> Time {
        let mut bytes = [0u8; Time::ENCODED_LEN];
        bytes.copy_from_slice(&self.save_block2[offset..offset + Time::ENCODED_LEN]);
        Time::from_le_bytes(&bytes)
    }

    fn set_time_at(&mut self, offset: usize, time: &Time) {
        // Keep the padding byte as stored.
        let bytes = time.to_le_bytes();
        let len = Time::ENCODED_LEN - 1;
        self.save_block2[offset..offset + len].copy_from_slice(&bytes[..len]);
    }
}

fn var_offset(id: u16) -> Option<usize> {
    if !(VARS_START..SPECIAL_VARS_START).contains(&id) {
        return None;
    }

    let index = (id - VARS_START) as usize;
    (index < VARS_COUNT).then_some(VARS_OFFSET + index * 2)
}
