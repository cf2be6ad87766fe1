//! Clock repair flow over a loaded save.
//!
//! A session owns the save engine, the clock reader and the in-memory save
//! blocks. The step methods can be driven one per frame; [`RepairSession::update`]
//! runs them all in order.

use berry_fix_core::{
    StoreConfig,
    flash::FlashDriver,
    rtc::{
        ClockDriver, ClockErrors, Correction, DefectWindow, RtcReader, Time, difference, is_due,
    },
    save::{ChunkTableError, SaveEngine, SaveMode, SaveStatus},
};
use heapless::Vec;
use log::{info, warn};

use crate::save_blocks::{SaveBlocks, UnknownVar, VAR_PACIFIDLOG_TM_RECEIVED_DAY};

/// Message boxes shown while repairing.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateMessage {
    WillNowUpdate = 0,
    HasBeenUpdated = 1,
    UnableToUpdate = 2,
    NoNeedToUpdate = 3,
    Updating = 4,
}

impl UpdateMessage {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether the flow ends on this message.
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::WillNowUpdate | Self::Updating)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepairError<E> {
    NoFlash,
    Save(SaveStatus),
    ChunkTable(ChunkTableError),
    UnknownVar(u16),
    ClockUnusable(ClockErrors),
    /// The clock returned a date or time that is not valid BCD.
    InvalidClockReading,
    /// The clock is behind the last berry tree update.
    ClockBehind,
    Clock(E),
}

impl<E> From<ChunkTableError> for RepairError<E> {
    fn from(err: ChunkTableError) -> Self {
        Self::ChunkTable(err)
    }
}

impl<E> From<UnknownVar> for RepairError<E> {
    fn from(err: UnknownVar) -> Self {
        Self::UnknownVar(err.0)
    }
}

/// Messages shown by [`RepairSession::update`], in order. The last one is
/// final.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RepairReport {
    pub shown: Vec<UpdateMessage, 4>,
    pub correction: Option<Correction>,
}

impl RepairReport {
    fn show(&mut self, message: UpdateMessage) {
        info!("repair: show {:?}", message);
        // At most three messages are ever shown.
        let _ = self.shown.push(message);
    }

    pub fn final_message(&self) -> Option<UpdateMessage> {
        self.shown.last().copied()
    }
}

/// True when the stored TM receipt day is not ahead of the clock's day.
pub fn needs_no_reset(blocks: &SaveBlocks, utc: &Time) -> bool {
    blocks
        .var(VAR_PACIFIDLOG_TM_RECEIVED_DAY)
        .is_some_and(|day| day as i32 <= utc.days as i32)
}

pub struct RepairSession<F, C> {
    engine: SaveEngine<F>,
    rtc: RtcReader<C>,
    blocks: SaveBlocks,
}

impl<F: FlashDriver, C: ClockDriver> RepairSession<F, C> {
    pub fn new(flash: F, clock: C, config: StoreConfig) -> Self {
        Self {
            engine: SaveEngine::new(flash, config),
            rtc: RtcReader::new(clock),
            blocks: SaveBlocks::new(),
        }
    }

    pub fn blocks(&self) -> &SaveBlocks {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut SaveBlocks {
        &mut self.blocks
    }

    pub fn engine(&self) -> &SaveEngine<F> {
        &self.engine
    }

    pub fn release(self) -> (F, C) {
        (self.engine.release(), self.rtc.release())
    }

    pub fn identify(&mut self) -> Result<(), RepairError<C::Error>> {
        if self.engine.identify_flash() {
            Ok(())
        } else {
            Err(RepairError::NoFlash)
        }
    }

    /// Restores the save blocks from flash. Anything short of a clean `Ok`
    /// slot is refused.
    pub fn load(&mut self) -> Result<(), RepairError<C::Error>> {
        let mut table = self.blocks.chunk_table()?;
        match self.engine.load_save(&mut table) {
            SaveStatus::Ok => Ok(()),
            status => Err(RepairError::Save(status)),
        }
    }

    pub fn check_clock(&mut self) -> Result<(), RepairError<C::Error>> {
        if self.rtc.probe() {
            Ok(())
        } else {
            Err(RepairError::ClockUnusable(self.rtc.errors()))
        }
    }

    pub fn defect_window(&mut self) -> Result<DefectWindow, RepairError<C::Error>> {
        let sample = self.rtc.read().map_err(RepairError::Clock)?;
        Ok(DefectWindow::of(&sample.date_time))
    }

    pub fn fix_date(&mut self) -> Result<Correction, RepairError<C::Error>> {
        self.rtc.fix_date().map_err(RepairError::Clock)
    }

    /// Clock time less the saved local offset.
    pub fn utc_time(&mut self) -> Result<Time, RepairError<C::Error>> {
        let offset = self.blocks.local_time_offset();
        self.rtc
            .utc_time(&offset)
            .map_err(RepairError::Clock)?
            .ok_or(RepairError::InvalidClockReading)
    }

    /// Whether the clock has not gone back past the last berry tree update.
    pub fn berry_update_due(&mut self) -> Result<bool, RepairError<C::Error>> {
        let utc = self.utc_time()?;
        let elapsed = difference(&self.blocks.last_berry_tree_update(), &utc);
        Ok(is_due(&elapsed))
    }

    pub fn try_save(&mut self, mode: SaveMode) -> Result<SaveStatus, RepairError<C::Error>> {
        let table = self.blocks.chunk_table()?;
        Ok(self.engine.try_save(mode, &table))
    }

    /// Resets the TM receipt day when it is ahead of the clock and saves.
    pub fn run(&mut self) -> Result<UpdateMessage, RepairError<C::Error>> {
        let utc = self.utc_time()?;
        if needs_no_reset(&self.blocks, &utc) {
            return Ok(UpdateMessage::NoNeedToUpdate);
        }
        if utc.days < 0 {
            warn!("repair: clock before local offset utc_days={}", utc.days);
            return Ok(UpdateMessage::UnableToUpdate);
        }

        self.blocks.set_var(VAR_PACIFIDLOG_TM_RECEIVED_DAY, 1)?;
        match self.try_save(SaveMode::Full)? {
            SaveStatus::Ok => Ok(UpdateMessage::HasBeenUpdated),
            status => {
                warn!("repair: save failed status={:?}", status);
                Ok(UpdateMessage::UnableToUpdate)
            }
        }
    }

    /// Flash and save checks, then clock checks, then the repair itself.
    pub fn update(&mut self) -> RepairReport {
        let mut report = RepairReport::default();
        let message = match self.update_steps(&mut report) {
            Ok(message) => message,
            Err(err) => {
                warn!("repair: unable to update err={:?}", err);
                UpdateMessage::UnableToUpdate
            }
        };
        report.show(message);
        report
    }

    fn update_steps(
        &mut self,
        report: &mut RepairReport,
    ) -> Result<UpdateMessage, RepairError<C::Error>> {
        self.identify()?;
        self.load()?;
        self.check_clock()?;
        if !self.berry_update_due()? {
            return Err(RepairError::ClockBehind);
        }

        let utc = self.utc_time()?;
        if self.defect_window()? == DefectWindow::Clear && needs_no_reset(&self.blocks, &utc) {
            return Ok(UpdateMessage::NoNeedToUpdate);
        }

        report.show(UpdateMessage::WillNowUpdate);
        let correction = self.fix_date()?;
        report.correction = Some(correction);

        report.show(UpdateMessage::Updating);
        match self.run()? {
            UpdateMessage::NoNeedToUpdate if correction.changed() => {
                Ok(UpdateMessage::HasBeenUpdated)
            }
            message => Ok(message),
        }
    }
}

#[cfg(test)]
mod tests;
