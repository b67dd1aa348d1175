//! One-shot GPIO initialization for the ultrasonic rangers.
//!
//! Configures every trigger as a push-pull output (driven LOW) and every
//! echo as a plain input, using raw ESP-IDF sys calls. Called once from
//! `main()` before any task starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::sensors::ultrasonic::PinPair;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    /// A pin number outside the 0..=63 bitmask range.
    InvalidPin(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "GPIO{} out of range", pin),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

/// Bitmasks for the trigger (output) and echo (input) pins.
pub fn pin_masks(pairs: &[PinPair]) -> Result<(u64, u64), HwInitError> {
    let mut outputs = 0u64;
    let mut inputs = 0u64;
    for pair in pairs {
        outputs |= bit(pair.trigger)?;
        inputs |= bit(pair.echo)?;
    }
    Ok((outputs, inputs))
}

fn bit(pin: i32) -> Result<u64, HwInitError> {
    if (0..64).contains(&pin) {
        Ok(1u64 << pin)
    } else {
        Err(HwInitError::InvalidPin(pin))
    }
}

#[cfg(target_os = "espidf")]
pub fn init_ultrasonic_pins(pairs: &[PinPair]) -> Result<(), HwInitError> {
    let (outputs, inputs) = pin_masks(pairs)?;

    let out_cfg = gpio_config_t {
        pin_bit_mask: outputs,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let in_cfg = gpio_config_t {
        pin_bit_mask: inputs,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };

    // SAFETY: called once from main() before any task touches these pins.
    unsafe {
        let ret = gpio_config(&out_cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        let ret = gpio_config(&in_cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        for pair in pairs {
            gpio_set_level(pair.trigger, 0);
        }
    }

    log::info!("hw_init: {} ultrasonic pin pair(s) configured", pairs.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_ultrasonic_pins(pairs: &[PinPair]) -> Result<(), HwInitError> {
    pin_masks(pairs)?;
    log::info!("hw_init(sim): {} pin pair(s), config skipped", pairs.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output in init_ultrasonic_pins().
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}
