//! Fuzz target: `decode_config` + `Roster::plan_reconcile`
//!
//! Arbitrary broker payloads must either be rejected or produce a roster
//! within bounds, with every output left on owned by an actuating channel.
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use irrigator::adapters::mqtt::decode_config;
use irrigator::app::commands::AppCommand;
use irrigator::config::{MAX_DEVICES, MAX_SENSOR_VALUE};
use irrigator::roster::Roster;
use irrigator::store::SettingsRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(AppCommand::Reconcile { specs, .. }) = decode_config(data) else {
        return;
    };
    assert!(specs.len() <= MAX_DEVICES);

    let plan = Roster::local(&SettingsRecord::defaults()).plan_reconcile(&specs);
    assert!(plan.roster.len() <= MAX_DEVICES);
    assert!(plan
        .roster
        .channels()
        .iter()
        .all(|c| c.threshold <= MAX_SENSOR_VALUE && !c.is_actuating));
    // Fresh channels start idle, so nothing may be switched on.
    assert!(plan.transitions.iter().all(|t| !t.on));
});
