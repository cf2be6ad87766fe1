use super::FlashDriver;
use crate::layout::{SECTOR_SIZE, SECTORS_COUNT};

const ERASED: u8 = 0xFF;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MockFlashError {
    NotPresent,
    SectorOutOfRange(u16),
    OutOfBounds,
    VerifyFailed(u16),
    PowerLost,
}

/// RAM-backed flash chip with NOR semantics and failure injection.
///
/// Erase sets bytes to `0xFF`, programming can only clear bits.
pub struct MemoryFlash {
    sectors: [[u8; SECTOR_SIZE]; SECTORS_COUNT as usize],
    present: bool,
    failing: u32,
    byte_budget: Option<usize>,
    sector_programs: usize,
}

impl Default for MemoryFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MemoryFlash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryFlash")
            .field("present", &self.present)
            .field("failing", &self.failing)
            .field("byte_budget", &self.byte_budget)
            .field("sector_programs", &self.sector_programs)
            .finish()
    }
}

impl MemoryFlash {
    /// Fully erased chip.
    pub fn new() -> Self {
        Self {
            sectors: [[ERASED; SECTOR_SIZE]; SECTORS_COUNT as usize],
            present: true,
            failing: 0,
            byte_budget: None,
            sector_programs: 0,
        }
    }

    /// No chip answers identification.
    pub fn absent() -> Self {
        let mut flash = Self::new();
        flash.present = false;
        flash
    }

    /// Every later program of `sector` fails verification.
    pub fn fail_sector(&mut self, sector: u16) {
        if sector < SECTORS_COUNT {
            self.failing |= 1 << sector;
        }
    }

    pub fn heal_sector(&mut self, sector: u16) {
        if sector < SECTORS_COUNT {
            self.failing &= !(1 << sector);
        }
    }

    /// Allows `bytes` more programmed bytes, then every program fails.
    pub fn cut_power_after(&mut self, bytes: usize) {
        self.byte_budget = Some(bytes);
    }

    pub fn restore_power(&mut self) {
        self.byte_budget = None;
    }

    /// Flips every bit of one stored byte, bypassing NOR rules.
    pub fn corrupt_byte(&mut self, sector: u16, offset: usize) {
        if let Some(byte) = self
            .sectors
            .get_mut(sector as usize)
            .and_then(|image| image.get_mut(offset))
        {
            *byte = !*byte;
        }
    }

    pub fn sector(&self, sector: u16) -> Option<&[u8; SECTOR_SIZE]> {
        self.sectors.get(sector as usize)
    }

    /// Overwrites a sector image directly.
    pub fn write_raw(&mut self, sector: u16, image: &[u8; SECTOR_SIZE]) {
        if let Some(target) = self.sectors.get_mut(sector as usize) {
            target.copy_from_slice(image);
        }
    }

    /// Successful full-sector programs since creation.
    pub fn sector_programs(&self) -> usize {
        self.sector_programs
    }

    fn check(&self, sector: u16) -> Result<(), MockFlashError> {
        if !self.present {
            return Err(MockFlashError::NotPresent);
        }
        if sector >= SECTORS_COUNT {
            return Err(MockFlashError::SectorOutOfRange(sector));
        }
        Ok(())
    }

    fn is_failing(&self, sector: u16) -> bool {
        self.failing & (1 << sector) != 0
    }
}

impl FlashDriver for MemoryFlash {
    type Error = MockFlashError;

    fn identify(&mut self) -> Result<(), Self::Error> {
        if self.present {
            Ok(())
        } else {
            Err(MockFlashError::NotPresent)
        }
    }

    fn read(&mut self, sector: u16, offset: usize, dest: &mut [u8]) -> Result<(), Self::Error> {
        self.check(sector)?;
        let image = &self.sectors[sector as usize];
        let end = offset
            .checked_add(dest.len())
            .filter(|end| *end <= SECTOR_SIZE)
            .ok_or(MockFlashError::OutOfBounds)?;
        dest.copy_from_slice(&image[offset..end]);
        Ok(())
    }

    fn program_and_verify(
        &mut self,
        sector: u16,
        image: &[u8; SECTOR_SIZE],
    ) -> Result<(), Self::Error> {
        self.check(sector)?;
        let target = &mut self.sectors[sector as usize];
        target.fill(ERASED);

        if self.failing & (1 << sector) != 0 {
            return Err(MockFlashError::VerifyFailed(sector));
        }

        if let Some(budget) = self.byte_budget.as_mut() {
            if *budget < SECTOR_SIZE {
                // Torn write: only the head of the image reached the chip.
                target[..*budget].copy_from_slice(&image[..*budget]);
                *budget = 0;
                return Err(MockFlashError::PowerLost);
            }
            *budget -= SECTOR_SIZE;
        }

        target.copy_from_slice(image);
        self.sector_programs += 1;
        Ok(())
    }

    fn erase_sector(&mut self, sector: u16) -> Result<(), Self::Error> {
        self.check(sector)?;
        self.sectors[sector as usize].fill(ERASED);
        Ok(())
    }

    fn program_byte(&mut self, sector: u16, offset: usize, byte: u8) -> Result<(), Self::Error> {
        self.check(sector)?;
        if offset >= SECTOR_SIZE {
            return Err(MockFlashError::OutOfBounds);
        }
        if self.is_failing(sector) {
            return Err(MockFlashError::VerifyFailed(sector));
        }
        if let Some(budget) = self.byte_budget.as_mut() {
            if *budget == 0 {
                return Err(MockFlashError::PowerLost);
            }
            *budget -= 1;
        }

        self.sectors[sector as usize][offset] &= byte;
        Ok(())
    }
}
