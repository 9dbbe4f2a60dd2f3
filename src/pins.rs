//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Remote configuration may name other pins at
//! runtime; these are the ones wired for the local two-zone build.

// ---------------------------------------------------------------------------
// Moisture sensors (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture probes, one per local zone.
pub const MOISTURE_ADC_GPIOS: [u8; 2] = [4, 5];

/// ADC1 native resolution is 12 bit; readings are scaled down to 10 bit.
pub const ADC_RAW_BITS: u32 = 12;

// ---------------------------------------------------------------------------
// Pump outputs (relay / MOSFET, active HIGH)
// ---------------------------------------------------------------------------

pub const PUMP_GPIOS: [u8; 2] = [1, 2];

/// Whether `gpio` may be driven as a pump output.
///
/// Excludes the ESP32-S3 strapping pins (0, 3, 45, 46), the keypad
/// (11–15), USB D-/D+ (19, 20), the SPI flash / octal PSRAM bus (26–37),
/// UART0 (43, 44) and numbers with no pad (22–25, 49+).
pub const fn is_pump_capable(gpio: u8) -> bool {
    matches!(gpio, 1..=10 | 16..=18 | 21 | 38..=42 | 47 | 48)
}

// ---------------------------------------------------------------------------
// Keypad (active HIGH, internal pull-down, common source pin driven HIGH)
// ---------------------------------------------------------------------------

/// Drives the shared side of the four switches.
pub const KEYPAD_SOURCE_GPIO: i32 = 11;

/// Left, Right, Up, Down — index order matches [`crate::drivers::keypad::Key`].
pub const KEYPAD_GPIOS: [i32; 4] = [12, 13, 14, 15];
