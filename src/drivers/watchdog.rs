//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the instrument if the measurement loop stalls. The timeout is
//! a multiple of the tick period so a slow configuration does not trip it.
//!
//! The main loop must call `feed()` once per tick.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Ticks that may be missed before the watchdog fires.
pub const MISSED_TICKS_BUDGET: u32 = 50;

/// Floor for the computed timeout.
pub const MIN_TIMEOUT_MS: u32 = 5_000;

/// Watchdog timeout for a given loop period.
pub const fn timeout_for_tick(tick_period_ms: u32) -> u32 {
    let t = tick_period_ms.saturating_mul(MISSED_TICKS_BUDGET);
    if t < MIN_TIMEOUT_MS { MIN_TIMEOUT_MS } else { t }
}

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self {
                    timeout_ms,
                    subscribed,
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): no-op ({} ms)", timeout_ms);
            Self { timeout_ms }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
