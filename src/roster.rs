//! Channel roster: the set of monitored zones and its reconciliation.
//!
//! A roster starts in [`RosterMode::Local`], built from the statically
//! wired zones and the persisted thresholds.  The first remote
//! configuration switches it to [`RosterMode::Remote`] for good.
//!
//! Reconciliation is split in two.  [`Roster::plan_reconcile`] is pure: it
//! computes the next roster plus the ordered pin transitions needed to get
//! there.  The caller drives those transitions through its actuator and
//! only then swaps the roster in, so no reader ever sees a half-replaced
//! roster and no retired output is left on.

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::{LOCAL_CHANNELS, MAX_DEVICES, MAX_SENSOR_VALUE};
use crate::pins;
use crate::store::SettingsRecord;

/// Stable channel identifier (the remote `id` field).
pub type ChannelId = i32;

/// Upper bound on transitions in one plan: every old and every new target
/// driven off once, plus one "on" per retained channel.
pub const MAX_TRANSITIONS: usize = MAX_DEVICES * 3;

/// Logical moisture input (ADC-capable GPIO number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SenseSource(pub u8);

/// Logical pump output (GPIO number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActuateTarget(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub sense_source: SenseSource,
    pub actuate_target: ActuateTarget,
    pub threshold: u16,
    pub last_value: u16,
    pub is_actuating: bool,
}

/// One decoded remote descriptor.  `threshold` is raw and gets clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: ChannelId,
    pub sense_source: SenseSource,
    pub actuate_target: ActuateTarget,
    pub threshold: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterMode {
    /// Static zones; threshold edits are persisted.
    Local,
    /// Remotely managed; the remote side owns configuration.
    Remote,
}

/// One physical output change required by a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinTransition {
    pub target: ActuateTarget,
    pub on: bool,
}

/// Result of [`Roster::plan_reconcile`].
///
/// `transitions` lists every "off" before any "on".
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    pub roster: Roster,
    pub transitions: Vec<PinTransition, MAX_TRANSITIONS>,
}

pub fn clamp_threshold(value: i32) -> u16 {
    value.clamp(0, i32::from(MAX_SENSOR_VALUE)) as u16
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    channels: Vec<Channel, MAX_DEVICES>,
    mode: RosterMode,
}

impl Roster {
    /// The local two-zone roster, thresholds from `record`.
    ///
    /// Local ids are `-1..=-N`: remote plant ids are positive, and only
    /// positive ids are reported upstream.
    pub fn local(record: &SettingsRecord) -> Self {
        let mut channels = Vec::new();
        for (i, zone) in LOCAL_CHANNELS.iter().enumerate() {
            let threshold = record.threshold.get(i).copied().unwrap_or(0);
            let _ = channels.push(Channel {
                id: -(i as ChannelId + 1),
                sense_source: SenseSource(zone.adc_gpio),
                actuate_target: ActuateTarget(zone.pump_gpio),
                threshold: threshold.min(MAX_SENSOR_VALUE),
                last_value: 0,
                is_actuating: false,
            });
        }
        Self {
            channels,
            mode: RosterMode::Local,
        }
    }

    /// Empty remote roster (all outputs retired).
    pub fn empty_remote() -> Self {
        Self {
            channels: Vec::new(),
            mode: RosterMode::Remote,
        }
    }

    pub fn mode(&self) -> RosterMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    /// Bounds-checked lookup by roster position.
    pub fn select(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn find(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Clamp `value` into `[0, MAX_SENSOR_VALUE]` and store it.
    /// Returns the stored value, or `None` for an out-of-range index.
    pub fn set_threshold(&mut self, index: usize, value: i32) -> Option<u16> {
        let channel = self.channels.get_mut(index)?;
        channel.threshold = clamp_threshold(value);
        Some(channel.threshold)
    }

    /// Record a fresh sample (clamped to the sensor range).
    pub fn set_last_value(&mut self, index: usize, value: u16) {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.last_value = value.min(MAX_SENSOR_VALUE);
        }
    }

    /// Compute the roster that `specs` describes, plus the pin transitions
    /// that must be applied, in order, before it may replace `self`.
    pub fn plan_reconcile(&self, specs: &[ChannelSpec]) -> ReconcilePlan {
        let mut next: Vec<Channel, MAX_DEVICES> = Vec::new();

        for spec in specs.iter().take(MAX_DEVICES) {
            if next.iter().any(|c| c.id == spec.id) {
                debug!("roster: duplicate id {} dropped", spec.id);
                continue;
            }
            if !pins::is_pump_capable(spec.actuate_target.0) {
                warn!(
                    "roster: id {} names GPIO{} as pump output, dropped",
                    spec.id, spec.actuate_target.0
                );
                continue;
            }
            let previous = self.find(spec.id);
            let _ = next.push(Channel {
                id: spec.id,
                sense_source: spec.sense_source,
                actuate_target: spec.actuate_target,
                threshold: clamp_threshold(spec.threshold),
                last_value: previous.map_or(0, |c| c.last_value),
                is_actuating: previous.is_some_and(|c| c.is_actuating),
            });
        }
        if specs.len() > MAX_DEVICES {
            info!(
                "roster: {} descriptors truncated to {}",
                specs.len(),
                MAX_DEVICES
            );
        }

        let live = |target: ActuateTarget| {
            next.iter()
                .any(|c| c.is_actuating && c.actuate_target == target)
        };

        let mut offs: Vec<ActuateTarget, MAX_TRANSITIONS> = Vec::new();
        let mut push_off = |target: ActuateTarget| {
            if !live(target) && !offs.contains(&target) {
                let _ = offs.push(target);
            }
        };

        // Retired channels and the old target of retargeted ones.
        for old in &self.channels {
            match next.iter().find(|c| c.id == old.id) {
                Some(new) if new.actuate_target == old.actuate_target => {}
                _ => push_off(old.actuate_target),
            }
        }
        // Brand-new channels start from a known-off output.
        for new in &next {
            if self.find(new.id).is_none() {
                push_off(new.actuate_target);
            }
        }

        let mut transitions = Vec::new();
        for target in offs {
            let _ = transitions.push(PinTransition { target, on: false });
        }
        // A retargeted channel that was running keeps running on its new pin.
        for new in &next {
            let moved = self
                .find(new.id)
                .is_some_and(|old| old.actuate_target != new.actuate_target);
            let on = PinTransition {
                target: new.actuate_target,
                on: true,
            };
            if moved && new.is_actuating && !transitions.contains(&on) {
                let _ = transitions.push(on);
            }
        }

        ReconcilePlan {
            roster: Roster {
                channels: next,
                mode: RosterMode::Remote,
            },
            transitions,
        }
    }
}
