//! Settings store against a fault-injecting block device.

use irrigator::config::{DEFAULT_MOISTURE_THRESHOLD, FLASH_FILL_BYTE, MAX_CHANNELS, STORAGE_MAGIC};
use irrigator::error::{FlashError, StoreError};
use irrigator::store::{RECORD_SIZE, SettingsRecord, SettingsStore};

use crate::mock_hw::MockBlockDevice;

#[test]
fn corrupted_magic_resets_to_defaults_once() {
    let bad = SettingsRecord {
        magic: STORAGE_MAGIC ^ 1,
        threshold: [1, 2, 3],
    };
    let mut store = SettingsStore::new(MockBlockDevice::with_image(&bad.encode()));
    store.load().unwrap();
    assert_eq!(store.record().threshold, [DEFAULT_MOISTURE_THRESHOLD; MAX_CHANNELS]);
    assert_eq!(store.device().programs, 1);

    // Second load sees a valid record and writes nothing.
    store.load().unwrap();
    assert_eq!(store.record().threshold, [DEFAULT_MOISTURE_THRESHOLD; MAX_CHANNELS]);
    assert_eq!(store.device().programs, 1);
}

#[test]
fn valid_record_loads_without_writing() {
    let good = SettingsRecord {
        magic: STORAGE_MAGIC,
        threshold: [100, 200, 300],
    };
    let mut store = SettingsStore::new(MockBlockDevice::with_image(&good.encode()));
    store.load().unwrap();
    assert_eq!(*store.record(), good);
    assert_eq!(store.device().erases, 0);
}

#[test]
fn save_pads_the_whole_block() {
    let mut store = SettingsStore::new(MockBlockDevice::blank());
    store.device_mut().block.fill(0);
    store.set_threshold(1, 42);
    store.save().unwrap();
    let block = &store.device().block;
    assert_eq!(SettingsRecord::decode(block).map(|r| r.threshold[1]), Some(42));
    assert!(block[RECORD_SIZE..].iter().all(|&b| b == FLASH_FILL_BYTE));
}

#[test]
fn verify_mismatch_is_reported() {
    let mut store = SettingsStore::new(MockBlockDevice::blank());
    store.device_mut().drop_program = true;
    assert_eq!(store.save(), Err(StoreError::VerifyMismatch));
}

#[test]
fn erase_failure_is_reported_and_memory_kept() {
    let mut store = SettingsStore::new(MockBlockDevice::blank());
    store.device_mut().fail_erase = true;
    store.set_threshold(0, 5);
    assert_eq!(store.save(), Err(StoreError::Flash(FlashError::Erase(-1))));
    assert_eq!(store.record().threshold[0], 5);
}

#[test]
fn load_reports_failure_of_default_write() {
    let mut store = SettingsStore::new(MockBlockDevice::blank());
    store.device_mut().drop_program = true;
    assert_eq!(store.load(), Err(StoreError::VerifyMismatch));
    assert_eq!(*store.record(), SettingsRecord::defaults());
}

#[test]
fn undersized_block_rejects_record() {
    let mut dev = MockBlockDevice::blank();
    dev.block.truncate(RECORD_SIZE - 1);
    let mut store = SettingsStore::new(dev);
    assert_eq!(
        store.save(),
        Err(StoreError::RecordTooLarge {
            size: RECORD_SIZE,
            block: RECORD_SIZE - 1
        })
    );
}
