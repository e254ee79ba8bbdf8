//! Binary telemetry to the WiFi companion module.
//!
//! The companion relays whatever arrives on its UART, so every
//! measurement goes out as one self-delimiting COBS frame (see
//! [`crate::link`]). No acknowledgement, no retry.

use crate::app::ports::{MeasurementRecorder, UartPort};
use crate::error::DeviceError;
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};
use crate::link::MeasurementFramer;
use crate::measurement::Measurement;

/// Upper bound on one frame transmission.
pub const UART_TX_TIMEOUT_MS: u32 = 1000;

pub struct WiFiRecorder<U> {
    uart: U,
    framer: MeasurementFramer,
    timeout_ms: u32,
    slot: StateSlot,
}

impl<U: UartPort> WiFiRecorder<U> {
    pub fn new(uart: U) -> Self {
        Self::with_timeout(uart, UART_TX_TIMEOUT_MS)
    }

    pub fn with_timeout(uart: U, timeout_ms: u32) -> Self {
        Self {
            uart,
            framer: MeasurementFramer::new(),
            timeout_ms,
            slot: StateSlot::new(),
        }
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}

impl<U: UartPort> Component for WiFiRecorder<U> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.uart.init()?;
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        self.uart.start()?;
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.uart.stop()?;
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.uart.reset()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wifi-recorder"
    }
}

impl<U: UartPort> MeasurementRecorder for WiFiRecorder<U> {
    fn notify(&mut self, measurement: &Measurement) -> Result<(), DeviceError> {
        let frame = self.framer.frame(measurement)?;
        self.uart.transmit(frame, self.timeout_ms)?;
        Ok(())
    }
}
