//! ISR-debounced four-key keypad with short press and long-press repeat.
//!
//! ## Hardware
//!
//! Four momentary switches between a common source pin (driven HIGH) and
//! inputs with pull-downs, so HIGH = pressed.  Each input fires an
//! any-edge interrupt that only sets its bit in
//! [`KEYPAD_EDGES`](crate::events::KEYPAD_EDGES); [`Keypad::poll`] drains
//! the mask from the main loop and runs the state machine below.
//!
//! ## Gesture detection
//!
//! | Gesture      | Condition                                   | Event             |
//! |--------------|---------------------------------------------|-------------------|
//! | Short press  | Accepted release before the long threshold  | `ShortPress`      |
//! | Long repeat  | Held >= 1000 ms, then every 100 ms          | `LongPressRepeat` |
//!
//! Edges closer than 40 ms to the previous edge on the same key are
//! contact bounce: the level change is ignored, but the edge still
//! restarts the debounce window.  Releasing a long press emits nothing.

use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::{debug, warn};

use crate::config::{DEBOUNCE_MS, LONG_PRESS_REPEAT_MS, LONG_PRESS_START_MS};
use crate::events::EdgeMask;

pub const KEY_COUNT: usize = 4;

/// Worst case per poll: one short press plus one repeat per key.
pub const MAX_EVENTS_PER_POLL: usize = KEY_COUNT * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
}

impl Key {
    pub const ALL: [Key; KEY_COUNT] = [Key::Left, Key::Right, Key::Up, Key::Down];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    ShortPress(Key),
    LongPressRepeat(Key),
}

pub type KeyEvents = Vec<KeyEvent, MAX_EVENTS_PER_POLL>;

/// Per-key tracking.  `long_started` implies `pressed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct KeyState {
    pressed: bool,
    long_started: bool,
    press_start_ms: u32,
    /// `None` until the first accepted edge.
    last_edge_ms: Option<u32>,
    last_repeat_ms: u32,
}

impl KeyState {
    fn release(&mut self) {
        self.pressed = false;
        self.long_started = false;
        self.press_start_ms = 0;
        self.last_repeat_ms = 0;
    }
}

/// Pure debounce + gesture machine; levels come from the caller.
#[derive(Debug, Clone, Default)]
pub struct InputStateMachine {
    keys: [KeyState; KEY_COUNT],
}

impl InputStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys[key.index()].pressed
    }

    pub fn is_long(&self, key: Key) -> bool {
        self.keys[key.index()].long_started
    }

    /// Keys the machine still holds whose input reads released and whose
    /// last edge is at least [`DEBOUNCE_MS`] old, as an edge mask.  Keys
    /// already in `pending` are skipped.
    ///
    /// A release that landed inside the debounce window raises no further
    /// edge; feeding this mask back into [`process`](Self::process) turns
    /// the settled level into an accepted release.
    pub fn settled_releases(
        &self,
        now_ms: u32,
        pending: u32,
        mut is_active: impl FnMut(usize) -> bool,
    ) -> u32 {
        let mut mask = 0;
        for (i, st) in self.keys.iter().enumerate() {
            if !st.pressed || pending & (1u32 << i) != 0 {
                continue;
            }
            let Some(last) = st.last_edge_ms else {
                continue;
            };
            if now_ms.wrapping_sub(last) >= DEBOUNCE_MS && !is_active(i) {
                debug!("keypad: key {} settled released without an edge", i);
                mask |= 1u32 << i;
            }
        }
        mask
    }

    /// Process one drained edge snapshot at `now_ms`.
    ///
    /// `is_active(i)` reports the current level of key `i` (true = pressed).
    /// Bits above [`KEY_COUNT`] are ignored.
    pub fn process(
        &mut self,
        now_ms: u32,
        pending: u32,
        mut is_active: impl FnMut(usize) -> bool,
    ) -> KeyEvents {
        let mut events = KeyEvents::new();

        for (i, key) in Key::ALL.iter().enumerate() {
            if pending & (1u32 << i) == 0 {
                continue;
            }
            let level = is_active(i);
            let st = &mut self.keys[i];

            if let Some(last) = st.last_edge_ms {
                if now_ms.wrapping_sub(last) < DEBOUNCE_MS {
                    // Bounce: ignore, but restart the window from this edge.
                    st.last_edge_ms = Some(now_ms);
                    continue;
                }
            }
            st.last_edge_ms = Some(now_ms);

            if level {
                st.pressed = true;
                st.long_started = false;
                st.press_start_ms = now_ms;
                st.last_repeat_ms = 0;
            } else {
                if st.pressed && !st.long_started {
                    debug!("keypad: short press {:?}", key);
                    let _ = events.push(KeyEvent::ShortPress(*key));
                }
                st.release();
            }
        }

        for (i, key) in Key::ALL.iter().enumerate() {
            let st = &mut self.keys[i];
            if !st.pressed {
                continue;
            }
            if st.long_started {
                if now_ms.wrapping_sub(st.last_repeat_ms) >= LONG_PRESS_REPEAT_MS {
                    st.last_repeat_ms = now_ms;
                    let _ = events.push(KeyEvent::LongPressRepeat(*key));
                }
            } else if now_ms.wrapping_sub(st.press_start_ms) >= LONG_PRESS_START_MS {
                debug!("keypad: long press start {:?}", key);
                st.long_started = true;
                st.last_repeat_ms = now_ms;
            }
        }

        events
    }
}

/// Keypad driver: four level inputs plus the gesture machine.
pub struct Keypad<P> {
    pins: [P; KEY_COUNT],
    machine: InputStateMachine,
}

impl<P: InputPin> Keypad<P> {
    pub fn new(pins: [P; KEY_COUNT]) -> Self {
        Self {
            pins,
            machine: InputStateMachine::new(),
        }
    }

    /// Drain `edges` and run one scan.  Call from the main loop only.
    ///
    /// Held keys without a pending edge are re-read, so a release lost to
    /// debouncing still ends the press.
    pub fn poll(&mut self, now_ms: u32, edges: &EdgeMask) -> KeyEvents {
        let pins = &mut self.pins;
        let mut level = |i: usize| match pins[i].is_high() {
            Ok(level) => level,
            Err(_) => {
                warn!("keypad: level read failed on key {}", i);
                false
            }
        };
        let mut pending = edges.drain();
        pending |= self.machine.settled_releases(now_ms, pending, &mut level);
        self.machine.process(now_ms, pending, level)
    }

    pub fn machine(&self) -> &InputStateMachine {
        &self.machine
    }
}
