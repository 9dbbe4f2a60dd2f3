//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the pump driver and reads moisture through the ADC helpers,
//! exposing both through [`SensorPort`] and [`ActuatorPort`].  On
//! non-espidf targets the underlying calls hit the simulation stubs in
//! [`hw_init::sim`](crate::drivers::hw_init).

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::MAX_SENSOR_VALUE;
use crate::drivers::hw_init;
use crate::drivers::pump::PumpDriver;
use crate::pins::ADC_RAW_BITS;
use crate::roster::{ActuateTarget, SenseSource};

/// Bits dropped to bring a raw ADC reading onto the 10-bit sensor scale.
const ADC_SCALE_SHIFT: u32 = ADC_RAW_BITS - 10;

/// Raw ADC counts to the 0..=MAX_SENSOR_VALUE scale.
pub fn scale_raw(raw: u16) -> u16 {
    (raw >> ADC_SCALE_SHIFT).min(MAX_SENSOR_VALUE)
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    pump: PumpDriver,
}

impl HardwareAdapter {
    pub fn new(pump: PumpDriver) -> Self {
        Self { pump }
    }

    pub fn pump(&self) -> &PumpDriver {
        &self.pump
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn sample(&mut self, source: SenseSource) -> Option<u16> {
        hw_init::adc_read(source.0).map(scale_raw)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_output(&mut self, target: ActuateTarget, on: bool) {
        self.pump.set(target.0, on);
    }
}
