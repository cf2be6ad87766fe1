use berry_fix_core::{
    flash::FlashDriver,
    layout::{SECTOR_SIZE, SECTORS_COUNT},
};
use embedded_storage::nor_flash::{MultiwriteNorFlash, NorFlash};
use log::{debug, warn};

const WORD_SIZE: usize = 4;
const VERIFY_CHUNK: usize = 256;
const ERASED: u8 = 0xFF;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NorFlashDriverError<E> {
    Device(E),
    /// Device geometry cannot express 4 KiB sectors or word programming, or
    /// a byte program was asked of a device that forbids rewriting a word.
    Unsupported,
    TooSmall { capacity: usize },
    SectorOutOfRange(u16),
    OutOfBounds,
    VerifyFailed(u16),
}

/// [`FlashDriver`] over an `embedded-storage` NOR flash.
///
/// The 32 save sectors are laid out back to back starting `base` bytes into
/// the device. Single-byte programming rewrites the containing word, so it is
/// only available on drivers built with [`NorFlashDriver::new_multiwrite`];
/// other devices support whole-sector programming only.
#[derive(Debug)]
pub struct NorFlashDriver<F> {
    flash: F,
    base: u32,
    multiwrite: bool,
}

impl<F: NorFlash> NorFlashDriver<F> {
    pub const fn new(flash: F, base: u32) -> Self {
        Self {
            flash,
            base,
            multiwrite: false,
        }
    }

    pub fn inner(&self) -> &F {
        &self.flash
    }

    pub fn release(self) -> F {
        self.flash
    }

    /// Whether [`FlashDriver::program_byte`] is available.
    pub const fn supports_byte_program(&self) -> bool {
        self.multiwrite
    }

    fn sector_addr(&self, sector: u16) -> Result<u32, NorFlashDriverError<F::Error>> {
        if sector >= SECTORS_COUNT {
            return Err(NorFlashDriverError::SectorOutOfRange(sector));
        }
        Ok(self.base + sector as u32 * SECTOR_SIZE as u32)
    }

    fn geometry_supported(&self) -> bool {
        WORD_SIZE.is_multiple_of(F::WRITE_SIZE)
            && WORD_SIZE.is_multiple_of(F::READ_SIZE)
            && SECTOR_SIZE.is_multiple_of(F::ERASE_SIZE)
            && (self.base as usize).is_multiple_of(F::ERASE_SIZE)
    }

    fn verify(
        &mut self,
        addr: u32,
        sector: u16,
        image: &[u8],
    ) -> Result<(), NorFlashDriverError<F::Error>> {
        let mut readback = [0u8; VERIFY_CHUNK];

        for (index, expected) in image.chunks(VERIFY_CHUNK).enumerate() {
            let offset = addr + (index * VERIFY_CHUNK) as u32;
            let window = &mut readback[..expected.len()];
            self.flash
                .read(offset, window)
                .map_err(NorFlashDriverError::Device)?;

            if *window != *expected {
                warn!(
                    "nor-flash: verify mismatch sector={} offset=0x{:x}",
                    sector,
                    index * VERIFY_CHUNK
                );
                return Err(NorFlashDriverError::VerifyFailed(sector));
            }
        }

        Ok(())
    }
}

impl<F: MultiwriteNorFlash> NorFlashDriver<F> {
    /// Driver for a device that allows a programmed word to be written
    /// again before the next erase.
    pub const fn new_multiwrite(flash: F, base: u32) -> Self {
        Self {
            flash,
            base,
            multiwrite: true,
        }
    }
}

impl<F: NorFlash> FlashDriver for NorFlashDriver<F> {
    type Error = NorFlashDriverError<F::Error>;

    fn identify(&mut self) -> Result<(), Self::Error> {
        if !self.geometry_supported() {
            return Err(NorFlashDriverError::Unsupported);
        }

        let capacity = self.flash.capacity();
        let needed = self.base as usize + SECTORS_COUNT as usize * SECTOR_SIZE;
        if capacity < needed {
            return Err(NorFlashDriverError::TooSmall { capacity });
        }

        debug!(
            "nor-flash: identified capacity={} base=0x{:x} erase={} write={} multiwrite={}",
            capacity,
            self.base,
            F::ERASE_SIZE,
            F::WRITE_SIZE,
            self.multiwrite
        );
        Ok(())
    }

    fn read(&mut self, sector: u16, offset: usize, dest: &mut [u8]) -> Result<(), Self::Error> {
        let addr = self.sector_addr(sector)?;
        if offset + dest.len() > SECTOR_SIZE {
            return Err(NorFlashDriverError::OutOfBounds);
        }
        if !offset.is_multiple_of(F::READ_SIZE) || !dest.len().is_multiple_of(F::READ_SIZE) {
            return Err(NorFlashDriverError::Unsupported);
        }

        self.flash
            .read(addr + offset as u32, dest)
            .map_err(NorFlashDriverError::Device)
    }

    fn program_and_verify(
        &mut self,
        sector: u16,
        image: &[u8; SECTOR_SIZE],
    ) -> Result<(), Self::Error> {
        self.erase_sector(sector)?;

        let addr = self.sector_addr(sector)?;
        self.flash
            .write(addr, image)
            .map_err(NorFlashDriverError::Device)?;
        self.verify(addr, sector, image)
    }

    fn erase_sector(&mut self, sector: u16) -> Result<(), Self::Error> {
        let addr = self.sector_addr(sector)?;
        self.flash
            .erase(addr, addr + SECTOR_SIZE as u32)
            .map_err(NorFlashDriverError::Device)
    }

    /// Writes the whole containing word, padding the other bytes with the
    /// erased value so they are left as they are.
    fn program_byte(&mut self, sector: u16, offset: usize, byte: u8) -> Result<(), Self::Error> {
        if !self.multiwrite {
            return Err(NorFlashDriverError::Unsupported);
        }

        let addr = self.sector_addr(sector)?;
        if offset >= SECTOR_SIZE {
            return Err(NorFlashDriverError::OutOfBounds);
        }

        let aligned = offset - offset % WORD_SIZE;
        let mut word = [ERASED; WORD_SIZE];
        word[offset % WORD_SIZE] = byte;

        self.flash
            .write(addr + aligned as u32, &word)
            .map_err(NorFlashDriverError::Device)
    }
}
