//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! [`MqttEventSink`](super::mqtt::MqttEventSink) implements the same
//! trait for the broker; the main loop pairs the two.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { channels } => {
                info!("START | channels={} | outputs=OFF", channels);
            }
            AppEvent::PumpStateChanged { id, on } => {
                info!("PUMP | id={} on={}", id, on);
            }
            AppEvent::SensorReport { id, value } => {
                info!("SENSOR | id={} value={}", id, value);
            }
            AppEvent::ThresholdChanged {
                id,
                threshold,
                persisted,
            } => {
                info!(
                    "THRESH | id={} threshold={} | {}",
                    id,
                    threshold,
                    if *persisted { "saved" } else { "pending" }
                );
            }
            AppEvent::RosterReconciled {
                mode,
                channels,
                transitions,
            } => {
                info!(
                    "ROSTER | mode={:?} channels={} transitions={}",
                    mode, channels, transitions
                );
            }
            AppEvent::DisplayPower(on) => {
                info!("DISPLAY | {}", if *on { "ON" } else { "OFF" });
            }
        }
    }
}
