#![cfg_attr(not(test), no_std)]

//! Dual-slot save storage and real-time clock repair primitives.
//!
//! Hardware is reached only through the [`flash::FlashDriver`] and
//! [`rtc::ClockDriver`] ports, so every engine here runs against the
//! in-memory mocks in tests.

pub mod config;
pub mod flash;
pub mod layout;
pub mod rtc;
pub mod save;

pub use config::{CommitStrategy, StoreConfig};
pub use save::{SaveEngine, SaveMode, SaveStatus};
