//! Logical chunk table: one in-memory buffer per slot sector.

use heapless::Vec;

use crate::layout::{ChunkId, SECTOR_DATA_SIZE, SECTORS_PER_SLOT};

pub const MAX_CHUNKS: usize = SECTORS_PER_SLOT as usize;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkTableError {
    /// A slot has room for [`MAX_CHUNKS`] chunks.
    TooManyChunks,
    /// Chunk buffers must fit one sector payload.
    ChunkTooLarge { len: usize },
}

/// Borrowed chunk buffers indexed by [`ChunkId`].
///
/// A chunk's size is its buffer length. Ids are assigned in push order.
#[derive(Debug, Default)]
pub struct ChunkTable<'a> {
    chunks: Vec<&'a mut [u8], MAX_CHUNKS>,
}

impl<'a> ChunkTable<'a> {
    pub const fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn push(&mut self, data: &'a mut [u8]) -> Result<ChunkId, ChunkTableError> {
        if data.len() > SECTOR_DATA_SIZE {
            return Err(ChunkTableError::ChunkTooLarge { len: data.len() });
        }

        let id = self.chunks.len() as ChunkId;
        self.chunks
            .push(data)
            .map_err(|_| ChunkTableError::TooManyChunks)?;
        Ok(id)
    }

    /// Splits a save structure into consecutive sector-sized chunks.
    pub fn push_split(&mut self, block: &'a mut [u8]) -> Result<(), ChunkTableError> {
        for chunk in block.chunks_mut(SECTOR_DATA_SIZE) {
            self.push(chunk)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, id: ChunkId) -> bool {
        (id as usize) < self.chunks.len()
    }

    pub fn get(&self, id: ChunkId) -> Option<&[u8]> {
        self.chunks.get(id as usize).map(|chunk| &**chunk)
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut [u8]> {
        self.chunks.get_mut(id as usize).map(|chunk| &mut **chunk)
    }

    pub fn size(&self, id: ChunkId) -> Option<usize> {
        self.chunks.get(id as usize).map(|chunk| chunk.len())
    }

    /// Set containing every id of this table.
    pub fn all_ids(&self) -> ChunkSet {
        ChunkSet::first(self.chunks.len())
    }
}

/// Set of chunk ids, one bit per id.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChunkSet(u32);

impl ChunkSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// `{0, 1, .., count - 1}`.
    pub const fn first(count: usize) -> Self {
        if count >= 32 {
            Self(u32::MAX)
        } else {
            Self((1u32 << count) - 1)
        }
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, id: ChunkId) {
        if let Some(bit) = 1u32.checked_shl(id as u32) {
            self.0 |= bit;
        }
    }

    pub const fn contains(self, id: ChunkId) -> bool {
        match 1u32.checked_shl(id as u32) {
            Some(bit) => self.0 & bit != 0,
            None => false,
        }
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
