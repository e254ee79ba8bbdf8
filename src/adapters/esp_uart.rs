//! ESP-IDF UART adapter.
//!
//! Wraps a configured [`UartDriver`] behind [`UartPort`]. The driver is
//! created in `main` (pins and baud rate are board decisions); this type
//! only adds the lifecycle and the millisecond timeouts.

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::uart::UartDriver;
use esp_idf_svc::sys::{ESP_ERR_TIMEOUT, EspError};
use log::warn;

use crate::adapters::utils::remaining_ms;
use crate::app::ports::{UartId, UartPort};
use crate::error::{DeviceError, UartError};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};

pub struct EspUart<'d> {
    id: UartId,
    driver: UartDriver<'d>,
    slot: StateSlot,
}

impl<'d> EspUart<'d> {
    pub fn new(id: UartId, driver: UartDriver<'d>) -> Self {
        Self {
            id,
            driver,
            slot: StateSlot::new(),
        }
    }
}

fn ticks(timeout_ms: u32) -> u32 {
    TickType::new_millis(u64::from(timeout_ms)).ticks()
}

fn now_us() -> i64 {
    // SAFETY: esp_timer_get_time only reads the system timer.
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}

fn map_err(e: EspError) -> UartError {
    if e.code() == ESP_ERR_TIMEOUT {
        UartError::Timeout
    } else {
        UartError::Hal
    }
}

impl Component for EspUart<'_> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        // Drop anything that arrived while stopped.
        self.driver.clear_rx().map_err(|e| {
            warn!("{}: rx flush failed: {}", self.id, e);
            DeviceError::Uart(map_err(e))
        })
    }

    fn on_stop(&mut self) -> HookResult {
        self.driver
            .wait_tx_done(ticks(crate::device::wifi_recorder::UART_TX_TIMEOUT_MS))
            .map_err(|e| DeviceError::Uart(map_err(e)))
    }

    fn name(&self) -> &'static str {
        "esp-uart"
    }
}

impl UartPort for EspUart<'_> {
    fn id(&self) -> UartId {
        self.id
    }

    fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), UartError> {
        if !self.is_running() {
            return Err(UartError::NotRunning);
        }
        // One budget covers queueing the bytes and draining the FIFO.
        let started = now_us();
        let mut sent = 0;
        while sent < data.len() {
            if remaining_ms(started, now_us(), timeout_ms).is_none() {
                warn!("{}: tx timed out after {} of {} bytes", self.id, sent, data.len());
                return Err(UartError::Timeout);
            }
            sent += self.driver.write(&data[sent..]).map_err(map_err)?;
        }
        let left = remaining_ms(started, now_us(), timeout_ms).ok_or(UartError::Timeout)?;
        self.driver.wait_tx_done(ticks(left)).map_err(map_err)
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        if !self.is_running() {
            return Err(UartError::NotRunning);
        }
        match self.driver.read(buf, ticks(timeout_ms)) {
            Ok(n) => Ok(n),
            Err(e) if e.code() == ESP_ERR_TIMEOUT => Ok(0),
            Err(e) => Err(map_err(e)),
        }
    }
}
