//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                | Connects to                  |
//! |------------|---------------------------|------------------------------|
//! | `hardware` | SensorPort, ActuatorPort  | ESP32 ADC1, pump GPIOs       |
//! | `flash`    | BlockDevice               | `settings` data partition    |
//! | `log_sink` | EventSink                 | Serial log output            |
//! | `mqtt`     | EventSink (over Publisher)| MQTT broker                  |
//! | `display`  | DisplayPort               | Serial log (menu text)       |
//! | `time`     | Clock                     | ESP32 system timer           |

pub mod display;
pub mod flash;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
