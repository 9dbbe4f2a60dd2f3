//! System configuration parameters
//!
//! Compile-time limits and timing constants for the irrigation controller,
//! plus the runtime [`SystemConfig`] that remote configuration may update.

use serde::{Deserialize, Serialize};

use crate::pins;

// --- Sensors / thresholds ---

/// Highest value a moisture reading or threshold may take (10-bit scale).
pub const MAX_SENSOR_VALUE: u16 = 1023;
/// Threshold written to every persisted slot when the record is reset.
pub const DEFAULT_MOISTURE_THRESHOLD: u16 = 800;
/// Threshold change per short Left/Right press.
pub const THRESHOLD_SHORT_STEP: i32 = 100;
/// Threshold change per long-press repeat on Left/Right.
pub const THRESHOLD_REPEAT_STEP: i32 = 10;

// --- Roster capacity ---

/// Number of threshold slots in the persisted record.
pub const MAX_CHANNELS: usize = 3;
/// Largest roster accepted from remote configuration.
pub const MAX_DEVICES: usize = 8;

// --- Keypad timing ---

pub const DEBOUNCE_MS: u32 = 40;
pub const LONG_PRESS_START_MS: u32 = 1000;
pub const LONG_PRESS_REPEAT_MS: u32 = 100;

// --- Loop timing ---

/// Main loop period: keypad drain, dispatch, redraw.
pub const SCAN_INTERVAL_MS: u32 = 100;
/// Deferred-save window after the first unsaved threshold change.
pub const SAVE_STORAGE_INTERVAL_MS: u32 = 5000;

const MIN_SAMPLE_INTERVAL_MS: u32 = SCAN_INTERVAL_MS;
const MAX_SAMPLE_INTERVAL_MS: u32 = 3_600_000;

// --- Persistent storage ---

/// Sentinel marking a settings record written by this firmware.
pub const STORAGE_MAGIC: u32 = 0xABCA_BCAB;
/// Physical erase-block size of the settings partition.
pub const ERASE_BLOCK_SIZE: usize = 4096;
/// Padding byte for the unused tail of the settings block.
pub const FLASH_FILL_BYTE: u8 = 0xFF;

/// A statically wired zone used by the local (keypad) roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalChannel {
    pub adc_gpio: u8,
    pub pump_gpio: u8,
}

/// Zones available without remote configuration.
pub const LOCAL_CHANNELS: [LocalChannel; 2] = [
    LocalChannel {
        adc_gpio: pins::MOISTURE_ADC_GPIOS[0],
        pump_gpio: pins::PUMP_GPIOS[0],
    },
    LocalChannel {
        adc_gpio: pins::MOISTURE_ADC_GPIOS[1],
        pump_gpio: pins::PUMP_GPIOS[1],
    },
];

/// Runtime tunables. Remote configuration may change these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Moisture sampling + actuation period (milliseconds)
    pub sample_interval_ms: u32,
    /// Sensor value report period (milliseconds)
    pub report_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: SCAN_INTERVAL_MS,
            report_interval_ms: 5000,
        }
    }
}

impl SystemConfig {
    /// Apply a remote `scan_interval`, clamped to the supported range.
    /// Returns the value actually stored.
    pub fn set_sample_interval(&mut self, interval_ms: i64) -> u32 {
        let clamped =
            interval_ms.clamp(i64::from(MIN_SAMPLE_INTERVAL_MS), i64::from(MAX_SAMPLE_INTERVAL_MS));
        self.sample_interval_ms = clamped as u32;
        self.sample_interval_ms
    }
}
