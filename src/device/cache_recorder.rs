//! Latest-value cache for the HMI.
//!
//! Keeps the most recent value per [`DeviceId`] so the display can show
//! current readings without subscribing to the pipeline itself.

use crate::app::ports::MeasurementRecorder;
use crate::error::DeviceError;
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};
use crate::measurement::{DeviceId, Measurement, MeasurementValue};

#[derive(Default)]
pub struct CacheRecorder {
    latest: [Option<MeasurementValue>; DeviceId::COUNT],
    updates: u32,
    slot: StateSlot,
}

impl CacheRecorder {
    pub const fn new() -> Self {
        Self {
            latest: [None; DeviceId::COUNT],
            updates: 0,
            slot: StateSlot::new(),
        }
    }

    pub fn latest(&self, id: DeviceId) -> Option<MeasurementValue> {
        self.latest[id.index()]
    }

    /// Measurements accepted since the last reset.
    pub fn updates(&self) -> u32 {
        self.updates
    }
}

impl Component for CacheRecorder {
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

    fn on_reset(&mut self) -> HookResult {
        self.latest = [None; DeviceId::COUNT];
        self.updates = 0;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cache-recorder"
    }
}

impl MeasurementRecorder for CacheRecorder {
    fn notify(&mut self, measurement: &Measurement) -> Result<(), DeviceError> {
        self.latest[measurement.source.index()] = Some(measurement.value);
        self.updates = self.updates.wrapping_add(1);
        Ok(())
    }
}
