//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (moisture ADC, pump outputs, flash, broker, display)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::app::ui::MenuLine;
use crate::error::FlashError;
use crate::roster::{ActuateTarget, SenseSource};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain moisture readings.
pub trait SensorPort {
    /// Sample `source` on the 0..=MAX_SENSOR_VALUE scale.
    /// `None` when the source cannot be sampled.
    fn sample(&mut self, source: SenseSource) -> Option<u16>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to switch pump outputs.
pub trait ActuatorPort {
    fn set_output(&mut self, target: ActuateTarget, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / broker)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Fan out to two sinks, e.g. the log and the broker.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// An absent sink (e.g. broker never came up) drops every event.
impl<S: EventSink> EventSink for Option<S> {
    fn emit(&mut self, event: &super::events::AppEvent) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Block device port (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// One erase block of raw non-volatile storage.
///
/// `program` and `read` always cover the whole block; buffers of any
/// other length are rejected with [`FlashError::BadLength`].
pub trait BlockDevice {
    fn block_size(&self) -> usize;

    /// Return the block to its erased state.
    fn erase(&mut self) -> Result<(), FlashError>;

    /// Write `data` into a freshly erased block.
    fn program(&mut self, data: &[u8]) -> Result<(), FlashError>;

    fn read(&mut self, buf: &mut [u8]) -> Result<(), FlashError>;
}

// ───────────────────────────────────────────────────────────────
// Publisher port (driven adapter: domain → message broker)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget message delivery.  Retry is the transport's concern.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), crate::error::Error>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

/// Text-level display.  Pixel layout stays in the adapter.
pub trait DisplayPort {
    fn set_power(&mut self, on: bool);
    fn draw(&mut self, lines: &[MenuLine]);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.  Wraps at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}
