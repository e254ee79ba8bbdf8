//! One-shot hardware peripheral initialization.
//!
//! Configures the BNC pulse inputs and attaches their edge interrupts to
//! the pulse arena using raw ESP-IDF sys calls. Called once from `main()`
//! before the pulse counter drivers are started.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::drivers::pulse_counter::{PulseChannel, pulse_isr_raw};
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAttachFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAttachFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any pulse driver is started.
    unsafe { init_pulse_inputs()? };
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── Pulse inputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_pulse_inputs() -> Result<(), HwInitError> {
    for channel in PulseChannel::ALL {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins::pulse_gpio(channel),
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    info!("hw_init: pulse inputs configured");
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Shared handler for every BNC input; `arg` carries the channel number.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn pulse_gpio_isr(arg: *mut core::ffi::c_void) {
    pulse_isr_raw(arg as usize as u8);
}

/// Install the per-pin GPIO ISR service and attach the pulse handlers.
/// Call after init_peripherals().
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed. The handler only increments an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for channel in PulseChannel::ALL {
            let gpio = pins::pulse_gpio(channel);
            // Detector outputs are open collector: a pulse pulls the line low.
            gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_NEGEDGE);
            let ret = gpio_isr_handler_add(
                gpio,
                Some(pulse_gpio_isr),
                channel.index() as *mut core::ffi::c_void,
            );
            if ret != ESP_OK {
                return Err(HwInitError::IsrAttachFailed(ret));
            }
            gpio_intr_enable(gpio);
        }

        info!("hw_init: ISR service installed (BNC A-D)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
