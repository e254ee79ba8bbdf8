//! Placeholder sink for COM-port telemetry.
//!
//! Takes part in the lifecycle and the fan-out but discards every
//! measurement.

use crate::app::ports::MeasurementRecorder;
use crate::error::DeviceError;
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};
use crate::measurement::Measurement;

#[derive(Default)]
pub struct UartRecorder {
    slot: StateSlot,
}

impl UartRecorder {
    pub const fn new() -> Self {
        Self {
            slot: StateSlot::new(),
        }
    }
}

impl Component for UartRecorder {
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
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "uart-recorder"
    }
}

impl MeasurementRecorder for UartRecorder {
    fn notify(&mut self, _measurement: &Measurement) -> Result<(), DeviceError> {
        Ok(())
    }
}
