use log::{info, warn};

use super::{DamagedSectors, SectorBuffer};
use crate::{
    config::StoreConfig,
    flash::FlashDriver,
    layout::{RESERVED_SECTORS_START, SECTORS_PER_SLOT},
};

/// Save engine state for one flash chip.
///
/// Owns the generation counter, the rotation offset, the damaged-sector mask
/// and the single scratch sector. Every operation borrows the engine mutably,
/// so two operations can never share the scratch buffer.
#[derive(Debug)]
pub struct SaveEngine<F> {
    pub(super) flash: F,
    pub(super) config: StoreConfig,
    pub(super) counter: u32,
    pub(super) rotation: u16,
    pub(super) damaged: DamagedSectors,
    pub(super) scratch: SectorBuffer,
    pub(super) flash_present: bool,
}

impl<F: FlashDriver> SaveEngine<F> {
    pub fn new(flash: F, config: StoreConfig) -> Self {
        Self {
            flash,
            config,
            counter: 0,
            rotation: 0,
            damaged: DamagedSectors::new(),
            scratch: SectorBuffer::new(),
            flash_present: false,
        }
    }

    /// Probes the chip. Loading reports `NoFlash` until this succeeds.
    pub fn identify_flash(&mut self) -> bool {
        let result = critical_section::with(|_| self.flash.identify());
        self.flash_present = match result {
            Ok(()) => true,
            Err(err) => {
                warn!("save: flash identification failed err={:?}", err);
                false
            }
        };
        self.flash_present
    }

    pub fn flash_present(&self) -> bool {
        self.flash_present
    }

    /// Current generation counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Current rotation offset within a slot.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    pub fn damaged(&self) -> DamagedSectors {
        self.damaged
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Releases the owned driver.
    pub fn release(self) -> F {
        self.flash
    }

    pub fn reset_counters(&mut self) {
        self.counter = 0;
        self.rotation = 0;
        self.damaged.clear();
    }

    /// Erases both save slots. Reserved sectors are left alone.
    pub fn erase_all(&mut self) -> Result<(), F::Error> {
        for sector in 0..RESERVED_SECTORS_START {
            critical_section::with(|_| self.flash.erase_sector(sector))?;
        }
        info!("save: erased save slots sectors={}", RESERVED_SECTORS_START);
        Ok(())
    }

    pub(super) fn advance_generation(&mut self) {
        self.rotation = (self.rotation + 1) % SECTORS_PER_SLOT;
        self.counter = self.counter.wrapping_add(1);
    }
}
