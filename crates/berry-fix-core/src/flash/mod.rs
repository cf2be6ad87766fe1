//! Flash device port consumed by the save engine.

pub mod mock;

use crate::layout::SECTOR_SIZE;

/// Sector-addressed flash driver.
///
/// Implementations are expected to be blocking: every call returns only once
/// the hardware operation finished. The save engine wraps each call in a
/// critical section.
pub trait FlashDriver {
    type Error: core::fmt::Debug;

    /// Confirms a supported flash chip is present.
    fn identify(&mut self) -> Result<(), Self::Error>;

    /// Reads `dest.len()` bytes starting `offset` bytes into `sector`.
    fn read(&mut self, sector: u16, offset: usize, dest: &mut [u8]) -> Result<(), Self::Error>;

    /// Erases `sector`, programs the full image and reads it back.
    fn program_and_verify(
        &mut self,
        sector: u16,
        image: &[u8; SECTOR_SIZE],
    ) -> Result<(), Self::Error>;

    fn erase_sector(&mut self, sector: u16) -> Result<(), Self::Error>;

    /// Programs one byte of an erased sector. Drivers whose device cannot
    /// write a word more than once per erase return an error.
    fn program_byte(&mut self, sector: u16, offset: usize, byte: u8) -> Result<(), Self::Error>;
}

impl<T: FlashDriver + ?Sized> FlashDriver for &mut T {
    type Error = T::Error;

    fn identify(&mut self) -> Result<(), Self::Error> {
        (**self).identify()
    }

    fn read(&mut self, sector: u16, offset: usize, dest: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(sector, offset, dest)
    }

    fn program_and_verify(
        &mut self,
        sector: u16,
        image: &[u8; SECTOR_SIZE],
    ) -> Result<(), Self::Error> {
        (**self).program_and_verify(sector, image)
    }

    fn erase_sector(&mut self, sector: u16) -> Result<(), Self::Error> {
        (**self).erase_sector(sector)
    }

    fn program_byte(&mut self, sector: u16, offset: usize, byte: u8) -> Result<(), Self::Error> {
        (**self).program_byte(sector, offset, byte)
    }
}
