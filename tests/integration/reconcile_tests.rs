//! Remote roster reconciliation through the service: pin ordering,
//! state continuity and the no-orphaned-output guarantee.

use irrigator::adapters::mqtt::decode_config;
use irrigator::config::{LOCAL_CHANNELS, MAX_DEVICES};
use irrigator::roster::{ActuateTarget, ChannelSpec, SenseSource};

use crate::mock_hw::started_app;

fn spec(id: i32, sense: u8, target: u8, threshold: i32) -> ChannelSpec {
    ChannelSpec {
        id,
        sense_source: SenseSource(sense),
        actuate_target: ActuateTarget(target),
        threshold,
    }
}

#[test]
fn retargeted_running_channel_moves_its_output() {
    let (mut app, mut hw, mut sink) = started_app();
    app.reconcile(&[spec(5, 6, 21, 100)], &mut hw, &mut sink);
    hw.set_reading(6, 900);
    app.sample_and_control(&mut hw, &mut sink);
    assert!(hw.is_on(21));

    hw.calls.clear();
    app.reconcile(&[spec(5, 6, 38, 100)], &mut hw, &mut sink);

    let ch = app.roster().find(5).copied().unwrap();
    assert!(ch.is_actuating);
    assert_eq!(ch.last_value, 900);
    assert_eq!(hw.calls, [(21, false), (38, true)]);
    assert_eq!(hw.on_pins(), [38]);
}

#[test]
fn removed_channel_output_is_off_before_swap() {
    let (mut app, mut hw, mut sink) = started_app();
    app.reconcile(&[spec(1, 6, 21, 100), spec(2, 7, 38, 100)], &mut hw, &mut sink);
    hw.set_reading(6, 900);
    hw.set_reading(7, 900);
    app.sample_and_control(&mut hw, &mut sink);
    assert_eq!(hw.on_pins(), [21, 38]);

    app.reconcile(&[spec(2, 7, 38, 100)], &mut hw, &mut sink);
    assert_eq!(hw.on_pins(), [38]);
    assert!(app.roster().find(1).is_none());
}

#[test]
fn new_channel_is_forced_off_even_if_pin_was_high() {
    let (mut app, mut hw, mut sink) = started_app();
    hw.outputs.insert(39, true);
    app.reconcile(&[spec(9, 6, 39, 500)], &mut hw, &mut sink);
    assert!(!hw.is_on(39));
    assert!(!app.roster().channels()[0].is_actuating);
}

#[test]
fn local_outputs_are_released_on_first_remote_config() {
    let (mut app, mut hw, mut sink) = started_app();
    hw.set_reading(LOCAL_CHANNELS[0].adc_gpio, 1000);
    app.sample_and_control(&mut hw, &mut sink);
    assert!(hw.is_on(LOCAL_CHANNELS[0].pump_gpio));

    app.reconcile(&[spec(40, 6, 21, 100)], &mut hw, &mut sink);
    assert!(hw.on_pins().is_empty());
}

#[test]
fn oversize_payload_is_truncated() {
    let (mut app, mut hw, mut sink) = started_app();
    let specs: Vec<ChannelSpec> = (0..(MAX_DEVICES as i32 + 4))
        .map(|i| spec(i + 1, 6, 38, 100))
        .collect();
    app.reconcile(&specs, &mut hw, &mut sink);
    assert_eq!(app.roster().len(), MAX_DEVICES);
    assert!(app.roster().find(MAX_DEVICES as i32 + 1).is_none());
}

#[test]
fn control_after_reconcile_uses_new_thresholds() {
    let (mut app, mut hw, mut sink) = started_app();
    app.reconcile(&[spec(3, 6, 21, 200)], &mut hw, &mut sink);
    hw.set_reading(6, 201);
    sink.clear();
    app.sample_and_control(&mut hw, &mut sink);
    assert_eq!(sink.pump_events(), [(3, true)]);
}

#[test]
fn config_naming_a_flash_pin_never_drives_it() {
    let (mut app, mut hw, mut sink) = started_app();
    let cmd = decode_config(
        br#"{"devices":[
            {"id":1,"sensor_pin":6,"pump_pin":27,"threshold":100},
            {"id":2,"sensor_pin":7,"pump_pin":21,"threshold":100}
        ]}"#,
    )
    .unwrap();
    app.handle_command(cmd, 0, &mut hw, &mut sink);

    assert!(app.roster().find(1).is_none());
    assert!(app.roster().find(2).is_some());
    assert!(hw.calls.iter().all(|&(pin, _)| pin != 27));
}
