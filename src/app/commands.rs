//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (keypad,
//! broker) that the [`AppService`](super::service::AppService) interprets
//! and acts upon.

use heapless::Vec;

use crate::config::MAX_DEVICES;
use crate::drivers::keypad::KeyEvent;
use crate::roster::ChannelSpec;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// A debounced keypad gesture.
    Key(KeyEvent),

    /// A decoded remote configuration.
    Reconcile {
        specs: Vec<ChannelSpec, MAX_DEVICES>,
        /// Remote `scan_interval`, when present.
        sample_interval_ms: Option<i64>,
    },

    /// Persist pending threshold changes now.
    SaveSettings,
}
