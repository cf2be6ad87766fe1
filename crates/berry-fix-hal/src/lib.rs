#![cfg_attr(not(test), no_std)]

//! Device adapters for the berry-fix save engine.

pub mod storage;
