//! Per-physical-sector program/verify failure record.

/// One bit per physical sector. Lives for the current power session only.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DamagedSectors(u32);

impl DamagedSectors {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn any(self) -> bool {
        self.0 != 0
    }

    pub fn mark_damaged(&mut self, sector: u16) {
        self.0 |= sector_bit(sector);
    }

    pub fn mark_ok(&mut self, sector: u16) {
        self.0 &= !sector_bit(sector);
    }

    pub const fn is_damaged(self, sector: u16) -> bool {
        self.0 & sector_bit(sector) != 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

// Sectors past the mask width have no bit.
const fn sector_bit(sector: u16) -> u32 {
    match 1u32.checked_shl(sector as u32) {
        Some(bit) => bit,
        None => 0,
    }
}
