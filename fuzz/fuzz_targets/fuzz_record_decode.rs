//! Fuzz target: `SettingsStore::load` over an arbitrary flash image
//!
//! Whatever the block holds, loading must leave thresholds in range and a
//! valid record both in memory and on the (simulated) partition.
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use irrigator::adapters::flash::FlashPartition;
use irrigator::config::{ERASE_BLOCK_SIZE, FLASH_FILL_BYTE, MAX_SENSOR_VALUE};
use irrigator::store::{SettingsRecord, SettingsStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut image = vec![FLASH_FILL_BYTE; ERASE_BLOCK_SIZE];
    let n = data.len().min(ERASE_BLOCK_SIZE);
    image[..n].copy_from_slice(&data[..n]);

    let mut store = SettingsStore::new(FlashPartition::from_image(&image));
    assert!(store.load().is_ok(), "simulated flash never fails");
    assert!(store.record().is_valid());
    assert!(store.record().threshold.iter().all(|&t| t <= MAX_SENSOR_VALUE));

    let persisted = SettingsRecord::decode(store.device().image()).expect("block holds a record");
    assert!(persisted.is_valid());
});
