//! Threshold actuation controller
//!
//! Start a pump when the reading rises strictly above its threshold, stop
//! it when the reading falls to or below.  No hysteresis band: a reading
//! sitting exactly on the threshold holds whatever state the channel is in.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink};
use crate::roster::Roster;

/// New actuation state for one channel, or `None` to hold.
pub fn decide(last_value: u16, threshold: u16, is_actuating: bool) -> Option<bool> {
    if !is_actuating && last_value > threshold {
        Some(true)
    } else if is_actuating && last_value <= threshold {
        Some(false)
    } else {
        None
    }
}

/// Applies [`decide`] across a roster and drives the outputs.
#[derive(Debug, Default)]
pub struct ActuationController {
    transitions: u32,
}

impl ActuationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// One control pass in roster order.  Returns the number of
    /// transitions made.
    pub fn tick(
        &mut self,
        roster: &mut Roster,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut changed = 0;
        for ch in roster.channels_mut() {
            let Some(on) = decide(ch.last_value, ch.threshold, ch.is_actuating) else {
                continue;
            };
            ch.is_actuating = on;
            hw.set_output(ch.actuate_target, on);
            sink.emit(&AppEvent::PumpStateChanged { id: ch.id, on });
            info!(
                "control: channel {} pump {} (value={} threshold={})",
                ch.id,
                if on { "ON" } else { "OFF" },
                ch.last_value,
                ch.threshold
            );
            changed += 1;
        }
        self.transitions = self.transitions.wrapping_add(changed as u32);
        changed
    }

    /// Transitions since boot (wraps).
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }
}
