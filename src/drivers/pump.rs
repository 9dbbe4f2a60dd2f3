//! Pump output driver (relay / MOSFET per zone, active HIGH).
//!
//! Pump targets are plain GPIO numbers chosen at runtime by the roster,
//! so the driver configures each pin lazily on first use and remembers
//! the last level it drove.
//!
//! ## Safety contract
//!
//! A pin this driver has never driven is assumed off.  The roster decides
//! when a pump may run; this driver is a dumb actuator.

use log::{trace, warn};

use crate::drivers::hw_init;
use crate::pins;

pub struct PumpDriver {
    configured: u64,
    on: u64,
}

impl PumpDriver {
    pub fn new() -> Self {
        Self {
            configured: 0,
            on: 0,
        }
    }

    /// Drive the pump on `pin`.  Pins that are not
    /// [pump-capable](pins::is_pump_capable) are never touched.
    pub fn set(&mut self, pin: u8, on: bool) {
        if !pins::is_pump_capable(pin) {
            warn!("pump: GPIO{} is not a pump output, ignored", pin);
            return;
        }
        let bit = 1u64 << pin;
        if self.configured & bit == 0 {
            if let Err(e) = hw_init::configure_output(pin) {
                warn!("pump: GPIO{} config failed: {}", pin, e);
                return;
            }
            self.configured |= bit;
        }

        hw_init::gpio_write(pin, on);
        if on {
            self.on |= bit;
        } else {
            self.on &= !bit;
        }
        trace!("pump: GPIO{} -> {}", pin, if on { "ON" } else { "OFF" });
    }

    pub fn is_on(&self, pin: u8) -> bool {
        pins::is_pump_capable(pin) && self.on & (1u64 << pin) != 0
    }
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}
