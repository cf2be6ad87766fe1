//! Redundant two-slot save storage on sector-erasable flash.

mod chunk;
mod damage;
mod engine;
mod sector;
mod validator;
mod writer;

pub use chunk::{ChunkSet, ChunkTable, ChunkTableError, MAX_CHUNKS};
pub use damage::DamagedSectors;
pub use engine::SaveEngine;
pub use sector::{Footer, SectorBuffer, checksum};
pub use validator::{Resolution, SlotScan};
pub use writer::{SectorFault, WriteReport};

/// Status codes reported to the program loop.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveStatus {
    Empty = 0,
    Ok = 1,
    Corrupt = 2,
    NoFlash = 4,
    Error = 0xFF,
}

impl SaveStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Ok),
            2 => Some(Self::Corrupt),
            4 => Some(Self::NoFlash),
            0xFF => Some(Self::Error),
            _ => None,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Which chunks a save request persists.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SaveMode {
    /// Every chunk, as a new generation.
    #[default]
    Full,
    /// SaveBlock2 and SaveBlock1 chunks in place.
    SaveBlocks,
    /// Only the SaveBlock2 chunk in place.
    SaveBlock2,
}
