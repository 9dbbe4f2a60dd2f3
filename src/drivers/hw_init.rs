//! One-shot hardware peripheral initialization and raw pin access.
//!
//! Configures ADC1, the keypad inputs and their ISRs, and the local pump
//! outputs using raw ESP-IDF sys calls.  Called once from `main()` before
//! the control loop starts.  Host builds get simulation stubs: outputs
//! are remembered in memory and ADC reads return an injectable value.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_keypad_inputs()?;
    }
    for &pin in &pins::PUMP_GPIOS {
        configure_output(pin)?;
        gpio_write(pin, false);
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// ESP32-S3: ADC1 channel N is routed to GPIO N+1 (GPIO1..=GPIO10).
pub fn adc1_channel_for_gpio(gpio: u8) -> Option<u32> {
    if (1..=10).contains(&gpio) {
        Some(u32::from(gpio) - 1)
    } else {
        None
    }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    // Configure every ADC-capable pin so remote configuration may name any of them.
    for gpio in 1u8..=10 {
        let Some(channel) = adc1_channel_for_gpio(gpio) else {
            continue;
        };
        if pins::PUMP_GPIOS.contains(&gpio) {
            continue;
        }
        let ret = unsafe { adc_oneshot_config_channel(ADC1_HANDLE, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured");
    Ok(())
}

/// Raw 12-bit reading of the ADC1 pin `gpio`, or `None` for a pin ADC1
/// cannot sample.
#[cfg(target_os = "espidf")]
pub fn adc_read(gpio: u8) -> Option<u16> {
    let channel = adc1_channel_for_gpio(gpio)?;
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once during init_adc() before this
    // function is called; single-threaded main-loop access guaranteed.
    let ret = unsafe { adc_oneshot_read(ADC1_HANDLE, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc_read(gpio: u8) -> Option<u16> {
    adc1_channel_for_gpio(gpio)?;
    Some(sim::adc_value(gpio))
}

// ── GPIO Inputs (keypad) ──────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_keypad_inputs() -> Result<(), HwInitError> {
    let src = gpio_config_t {
        pin_bit_mask: 1u64 << pins::KEYPAD_SOURCE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&src) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(pins::KEYPAD_SOURCE_GPIO, 1) };

    for &pin in &pins::KEYPAD_GPIOS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: keypad inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::input_level(pin)
}

/// One keypad input as an `embedded-hal` pin.
#[derive(Debug, Clone, Copy)]
pub struct GpioInput(pub i32);

impl embedded_hal::digital::ErrorType for GpioInput {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

// ── GPIO Outputs (pumps) ──────────────────────────────────────

/// Put `pin` in push-pull output mode, driven LOW.
#[cfg(target_os = "espidf")]
pub fn configure_output(pin: u8) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: gpio_config only touches the pin named in the mask; main-loop only.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(i32::from(pin), 0) };
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_output(pin: u8) -> Result<(), HwInitError> {
    sim::set_output(pin, false);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: u8, high: bool) {
    // SAFETY: gpio_set_level writes to an output pin configured through
    // configure_output(). Main-loop only.
    unsafe {
        gpio_set_level(i32::from(pin), u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: u8, high: bool) {
    sim::set_output(pin, high);
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn keypad_gpio_isr(arg: *mut core::ffi::c_void) {
    // The handler argument carries the key index, not a pointer.
    crate::events::KEYPAD_EDGES.signal(arg as usize);
}

/// Install the per-pin GPIO ISR service and register the keypad handlers.
/// Call after init_peripherals() and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed. The handler only touches the edge mask.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for (index, &pin) in pins::KEYPAD_GPIOS.iter().enumerate() {
            let ret = gpio_isr_handler_add(pin, Some(keypad_gpio_isr), index as *mut core::ffi::c_void);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrInstallFailed(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    info!("hw_init: ISR service installed (keypad×{})", pins::KEYPAD_GPIOS.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Host simulation state ─────────────────────────────────────

/// In-memory pin state standing in for the GPIO matrix on host builds.
#[cfg(not(target_os = "espidf"))]
pub mod sim {
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct SimPins {
        outputs: HashMap<u8, bool>,
        inputs: HashMap<i32, bool>,
        adc: HashMap<u8, u16>,
    }

    static PINS: Mutex<Option<SimPins>> = Mutex::new(None);

    fn with<R>(f: impl FnOnce(&mut SimPins) -> R) -> R {
        let mut guard = PINS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f(guard.get_or_insert_with(SimPins::default))
    }

    pub fn set_output(pin: u8, high: bool) {
        with(|p| p.outputs.insert(pin, high));
    }

    /// Last level written to `pin`; `None` if never driven.
    pub fn output(pin: u8) -> Option<bool> {
        with(|p| p.outputs.get(&pin).copied())
    }

    pub fn set_input_level(pin: i32, high: bool) {
        with(|p| p.inputs.insert(pin, high));
    }

    pub fn input_level(pin: i32) -> bool {
        with(|p| p.inputs.get(&pin).copied().unwrap_or(false))
    }

    pub fn set_adc_value(gpio: u8, raw: u16) {
        with(|p| p.adc.insert(gpio, raw));
    }

    pub fn adc_value(gpio: u8) -> u16 {
        with(|p| p.adc.get(&gpio).copied().unwrap_or(0))
    }
}
