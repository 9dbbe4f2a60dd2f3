//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, publish over MQTT.

use crate::roster::{ChannelId, RosterMode};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started; every output is off.
    Started { channels: usize },

    /// A pump output changed state.
    PumpStateChanged { id: ChannelId, on: bool },

    /// Periodic moisture reading for one channel.
    SensorReport { id: ChannelId, value: u16 },

    /// A threshold was edited from the keypad.
    ThresholdChanged {
        id: ChannelId,
        threshold: u16,
        persisted: bool,
    },

    /// A remote configuration replaced the roster.
    RosterReconciled {
        mode: RosterMode,
        channels: usize,
        transitions: usize,
    },

    /// The display was switched on or off.
    DisplayPower(bool),
}
