//! Keypad driver over the shared edge mask with scripted pin levels.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use irrigator::config::{
    DEBOUNCE_MS, DEFAULT_MOISTURE_THRESHOLD, LONG_PRESS_REPEAT_MS, LONG_PRESS_START_MS,
    THRESHOLD_SHORT_STEP,
};
use irrigator::drivers::keypad::{Key, KeyEvent, Keypad};
use irrigator::events::EdgeMask;

use crate::mock_hw::started_app;

#[derive(Clone)]
struct ScriptedPin(Rc<Cell<bool>>);

impl ErrorType for ScriptedPin {
    type Error = Infallible;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

struct Rig {
    levels: [Rc<Cell<bool>>; 4],
    edges: EdgeMask,
    keypad: Keypad<ScriptedPin>,
}

impl Rig {
    fn new() -> Self {
        let levels: [Rc<Cell<bool>>; 4] = Default::default();
        let pins = levels.clone().map(ScriptedPin);
        Self {
            levels,
            edges: EdgeMask::new(),
            keypad: Keypad::new(pins),
        }
    }

    /// Set the level and raise the edge, as the ISR would.
    fn set(&mut self, key: Key, pressed: bool) {
        self.levels[key.index()].set(pressed);
        self.edges.signal(key.index());
    }

    fn poll(&mut self, now: u32) -> Vec<KeyEvent> {
        self.keypad.poll(now, &self.edges).into_iter().collect()
    }
}

#[test]
fn press_release_emits_one_short_press() {
    let mut rig = Rig::new();
    rig.set(Key::Down, true);
    assert!(rig.poll(0).is_empty());
    rig.set(Key::Down, false);
    assert_eq!(rig.poll(DEBOUNCE_MS + 10), [KeyEvent::ShortPress(Key::Down)]);
    assert!(rig.edges.is_empty());
}

#[test]
fn edge_inside_debounce_window_is_noise() {
    let mut rig = Rig::new();
    rig.set(Key::Left, true);
    rig.poll(0);
    rig.set(Key::Left, false);
    assert!(rig.poll(20).is_empty());
    // Release at t=50 lands 30 ms after the bounce at t=20: still noise.
    rig.set(Key::Left, false);
    assert!(rig.poll(50).is_empty());
    rig.set(Key::Left, false);
    assert_eq!(rig.poll(100), [KeyEvent::ShortPress(Key::Left)]);
}

#[test]
fn held_key_repeats_and_release_is_silent() {
    let mut rig = Rig::new();
    rig.set(Key::Right, true);
    rig.poll(0);

    let mut repeats = 0;
    let mut t = 0;
    while t <= LONG_PRESS_START_MS + 5 * LONG_PRESS_REPEAT_MS {
        for ev in rig.poll(t) {
            assert_eq!(ev, KeyEvent::LongPressRepeat(Key::Right));
            repeats += 1;
        }
        t += 10;
    }
    assert_eq!(repeats, 5);

    rig.set(Key::Right, false);
    assert!(rig.poll(t).is_empty());
}

#[test]
fn keys_are_tracked_independently() {
    let mut rig = Rig::new();
    rig.set(Key::Up, true);
    rig.set(Key::Down, true);
    rig.poll(0);
    rig.set(Key::Up, false);
    let ev = rig.poll(60);
    assert_eq!(ev, [KeyEvent::ShortPress(Key::Up)]);
    assert!(rig.keypad.machine().is_pressed(Key::Down));
}

#[test]
fn tap_shorter_than_debounce_does_not_stick() {
    let mut rig = Rig::new();
    rig.set(Key::Left, true);
    rig.poll(0);
    // Release bounces inside the window and no further edge arrives.
    rig.set(Key::Left, false);
    assert!(rig.poll(30).is_empty());

    let mut events = Vec::new();
    for t in (100..=15_000).step_by(100) {
        events.extend(rig.poll(t));
    }
    assert_eq!(events, [KeyEvent::ShortPress(Key::Left)]);
    assert!(!rig.keypad.machine().is_pressed(Key::Left));
}

#[test]
fn bounced_tap_adjusts_threshold_once() {
    let (mut app, _hw, mut sink) = started_app();
    let mut rig = Rig::new();
    rig.set(Key::Left, true);
    rig.poll(0);
    rig.set(Key::Left, false);
    rig.poll(30);

    for t in (100..=15_000).step_by(100) {
        for ev in rig.poll(t) {
            app.handle_key(ev, t, &mut sink);
        }
        app.auto_save_if_needed(t);
    }

    let expected = DEFAULT_MOISTURE_THRESHOLD - THRESHOLD_SHORT_STEP as u16;
    assert_eq!(app.roster().channels()[0].threshold, expected);
    assert_eq!(app.store().record().threshold[0], expected);
    assert!(!app.is_settings_dirty());
}
