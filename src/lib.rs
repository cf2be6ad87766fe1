#![cfg_attr(not(test), no_std)]

//! Repairs the stuck real-time clock of a cartridge save and the event data
//! that depends on it.
//!
//! Storage and clock primitives come from [`berry_fix_core`]; this crate
//! ties them to the game's save block layout.

pub mod repair;
pub mod save_blocks;

pub use berry_fix_core::{CommitStrategy, SaveMode, SaveStatus, StoreConfig};
pub use repair::{RepairError, RepairReport, RepairSession, UpdateMessage, needs_no_reset};
pub use save_blocks::SaveBlocks;
