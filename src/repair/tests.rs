use super::*;
use berry_fix_core::{
    flash::mock::MemoryFlash,
    rtc::{RawDateTime, STATUS_24_HOUR, STATUS_POWER_FAILURE, mock::MockClock},
};

fn clock_at(year: u8, month: u8, day: u8) -> MockClock {
    MockClock::new(RawDateTime::from_binary(year, month, day, 10, 20, 30))
}

/// Writes one clean generation holding `blocks` set up by `setup`.
fn seed_flash(flash: &mut MemoryFlash, setup: impl FnOnce(&mut SaveBlocks)) {
    let mut blocks = SaveBlocks::new();
    setup(&mut blocks);

    let mut engine = SaveEngine::new(&mut *flash, StoreConfig::default());
    assert!(engine.identify_flash());
    let table = blocks.chunk_table().unwrap();
    assert!(engine.write_generation(&table).is_ok());
}

fn receipt_day(day: u16) -> impl FnOnce(&mut SaveBlocks) {
    move |blocks| blocks.set_var(VAR_PACIFIDLOG_TM_RECEIVED_DAY, day).unwrap()
}

fn loaded_session(
    flash: &mut MemoryFlash,
    clock: MockClock,
) -> RepairSession<&mut MemoryFlash, MockClock> {
    let mut session = RepairSession::new(flash, clock, StoreConfig::default());
    session.identify().unwrap();
    session.load().unwrap();
    session
}

/// Receipt day in whatever generation the flash resolves to.
fn stored_receipt_day(flash: &mut MemoryFlash) -> Option<u16> {
    let mut blocks = SaveBlocks::new();
    let mut engine = SaveEngine::new(flash, StoreConfig::default());
    assert!(engine.identify_flash());

    let mut table = blocks.chunk_table().unwrap();
    let status = engine.load_save(&mut table);
    assert!(
        matches!(status, SaveStatus::Ok | SaveStatus::Error),
        "{status:?}"
    );
    drop(table);

    blocks.var(VAR_PACIFIDLOG_TM_RECEIVED_DAY)
}

#[test]
fn receipt_day_check_compares_against_utc_days() {
    let mut blocks = SaveBlocks::new();
    blocks.set_var(VAR_PACIFIDLOG_TM_RECEIVED_DAY, 366).unwrap();

    assert!(needs_no_reset(&blocks, &Time::new(366, 0, 0, 0)));
    assert!(needs_no_reset(&blocks, &Time::new(400, 0, 0, 0)));
    assert!(!needs_no_reset(&blocks, &Time::new(365, 23, 59, 59)));

    blocks.set_var(VAR_PACIFIDLOG_TM_RECEIVED_DAY, 0).unwrap();
    assert!(!needs_no_reset(&blocks, &Time::new(-1, 0, 0, 0)));
}

#[test]
fn consistent_receipt_day_is_left_alone() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(5));

    let mut session = loaded_session(&mut flash, clock_at(2, 1, 1));
    assert_eq!(session.run(), Ok(UpdateMessage::NoNeedToUpdate));

    let (flash, _) = session.release();
    assert_eq!(flash.sector_programs(), 14);
}

#[test]
fn receipt_day_ahead_of_clock_is_reset_and_saved() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(1000));

    let mut session = loaded_session(&mut flash, clock_at(2, 1, 1));
    assert_eq!(session.utc_time(), Ok(Time::new(366, 10, 20, 30)));
    assert_eq!(session.run(), Ok(UpdateMessage::HasBeenUpdated));
    assert_eq!(session.engine().counter(), 2);
    drop(session);

    assert_eq!(stored_receipt_day(&mut flash), Some(1));
}

#[test]
fn clock_before_local_offset_is_not_repaired() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, |blocks| {
        blocks.set_var(VAR_PACIFIDLOG_TM_RECEIVED_DAY, 1000).unwrap();
        blocks.set_local_time_offset(&Time::new(500, 0, 0, 0));
    });

    let mut session = loaded_session(&mut flash, clock_at(2, 1, 1));
    assert_eq!(session.run(), Ok(UpdateMessage::UnableToUpdate));
    assert_eq!(
        session.blocks().var(VAR_PACIFIDLOG_TM_RECEIVED_DAY),
        Some(1000)
    );
    drop(session);

    assert_eq!(stored_receipt_day(&mut flash), Some(1000));
}

#[test]
fn failed_save_reports_unable_to_update() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(1000));
    // Chunk 0 of the next generation: rotation 2, slot 0.
    flash.fail_sector(2);

    let mut session = loaded_session(&mut flash, clock_at(2, 1, 1));
    assert_eq!(session.run(), Ok(UpdateMessage::UnableToUpdate));
    assert_eq!(session.engine().counter(), 1);
    drop(session);

    flash.heal_sector(2);
    assert_eq!(stored_receipt_day(&mut flash), Some(1000));
}

#[test]
fn garbage_clock_reading_is_an_error() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(1000));

    let mut clock = clock_at(2, 1, 1);
    clock.date_time.month = 0x1F;
    let mut session = loaded_session(&mut flash, clock);
    assert_eq!(session.run(), Err(RepairError::InvalidClockReading));
}

#[test]
fn update_on_healthy_clock_needs_nothing() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(5));

    let mut session = RepairSession::new(&mut flash, clock_at(2, 1, 1), StoreConfig::default());
    let report = session.update();

    assert_eq!(report.shown.as_slice(), &[UpdateMessage::NoNeedToUpdate]);
    assert_eq!(report.correction, None);
    let (_, clock) = session.release();
    assert_eq!(clock.writes(), 0);
}

#[test]
fn update_fast_forwards_stuck_2001_clock() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(1000));

    let mut session = RepairSession::new(&mut flash, clock_at(1, 1, 2), StoreConfig::default());
    let report = session.update();

    assert_eq!(
        report.shown.as_slice(),
        &[
            UpdateMessage::WillNowUpdate,
            UpdateMessage::Updating,
            UpdateMessage::HasBeenUpdated,
        ]
    );
    assert_eq!(report.correction, Some(Correction::FastForward));

    let (flash, clock) = session.release();
    let date = clock.date_time;
    assert_eq!((date.year(), date.month(), date.day()), (2, 1, 2));
    assert_eq!(stored_receipt_day(flash), Some(1));
}

#[test]
fn update_advances_2000_clock_without_touching_save() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(0));

    let mut session = RepairSession::new(&mut flash, clock_at(0, 3, 1), StoreConfig::default());
    let report = session.update();

    assert_eq!(report.final_message(), Some(UpdateMessage::HasBeenUpdated));
    assert_eq!(
        report.correction,
        Some(Correction::YearAdvanced { day_advanced: true })
    );

    let (flash, clock) = session.release();
    let date = clock.date_time;
    assert_eq!((date.year(), date.month(), date.day()), (1, 3, 2));
    assert_eq!(flash.sector_programs(), 14);
}

#[test]
fn update_without_flash_is_unable() {
    let mut flash = MemoryFlash::absent();
    let mut session = RepairSession::new(&mut flash, clock_at(1, 1, 2), StoreConfig::default());

    let report = session.update();
    assert_eq!(report.shown.as_slice(), &[UpdateMessage::UnableToUpdate]);
    assert_eq!(session.release().1.writes(), 0);
}

#[test]
fn update_with_blank_save_is_unable() {
    let mut flash = MemoryFlash::new();
    let mut session = RepairSession::new(&mut flash, clock_at(1, 1, 2), StoreConfig::default());

    assert_eq!(session.identify(), Ok(()));
    assert_eq!(session.load(), Err(RepairError::Save(SaveStatus::Empty)));
    assert_eq!(
        session.update().final_message(),
        Some(UpdateMessage::UnableToUpdate)
    );
}

#[test]
fn update_refuses_clock_that_lost_power() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, receipt_day(1000));

    let clock = clock_at(1, 1, 2).with_status(STATUS_24_HOUR | STATUS_POWER_FAILURE);
    let mut session = RepairSession::new(&mut flash, clock, StoreConfig::default());

    assert_eq!(
        session.update().shown.as_slice(),
        &[UpdateMessage::UnableToUpdate]
    );
    assert_eq!(session.release().1.writes(), 0);
}

#[test]
fn update_refuses_clock_behind_berry_growth() {
    let mut flash = MemoryFlash::new();
    seed_flash(&mut flash, |blocks| {
        blocks.set_var(VAR_PACIFIDLOG_TM_RECEIVED_DAY, 1000).unwrap();
        blocks.set_last_berry_tree_update(&Time::new(400, 0, 0, 0));
    });

    let mut session = RepairSession::new(&mut flash, clock_at(2, 1, 1), StoreConfig::default());
    session.identify().unwrap();
    session.load().unwrap();
    assert_eq!(session.berry_update_due(), Ok(false));

    let report = session.update();
    assert_eq!(report.final_message(), Some(UpdateMessage::UnableToUpdate));
    assert_eq!(
        session.blocks().var(VAR_PACIFIDLOG_TM_RECEIVED_DAY),
        Some(1000)
    );
}

#[test]
fn message_codes_match_message_box_order() {
    assert_eq!(UpdateMessage::WillNowUpdate.code(), 0);
    assert_eq!(UpdateMessage::HasBeenUpdated.code(), 1);
    assert_eq!(UpdateMessage::UnableToUpdate.code(), 2);
    assert_eq!(UpdateMessage::NoNeedToUpdate.code(), 3);
    assert_eq!(UpdateMessage::Updating.code(), 4);
    assert!(!UpdateMessage::Updating.is_final());
    assert!(UpdateMessage::NoNeedToUpdate.is_final());
}
