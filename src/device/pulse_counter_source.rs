//! Measurement source over one pulse counter channel.

use serde::{Deserialize, Serialize};

use crate::app::ports::MeasurementSource;
use crate::drivers::pulse_counter::{PulseChannel, PulseCounterDriver};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};
use crate::measurement::{DeviceId, Measurement, MeasurementValue};

/// How the count evolves between reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleMode {
    /// Count keeps running from `start()`.
    #[default]
    Cumulative,
    /// Count is cleared after every read, so each measurement covers one
    /// polling window.
    Windowed,
}

pub struct PulseCounterSource<'a> {
    driver: PulseCounterDriver<'a>,
    mode: SampleMode,
    slot: StateSlot,
}

impl<'a> PulseCounterSource<'a> {
    pub fn new(driver: PulseCounterDriver<'a>) -> Self {
        Self::with_mode(driver, SampleMode::Cumulative)
    }

    pub fn with_mode(driver: PulseCounterDriver<'a>, mode: SampleMode) -> Self {
        Self {
            driver,
            mode,
            slot: StateSlot::new(),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        match self.driver.channel() {
            PulseChannel::BncA => DeviceId::PulseCounter1,
            PulseChannel::BncB => DeviceId::PulseCounter2,
            PulseChannel::BncC => DeviceId::PulseCounter3,
            PulseChannel::BncD => DeviceId::PulseCounter4,
        }
    }

    pub fn driver(&self) -> &PulseCounterDriver<'a> {
        &self.driver
    }
}

impl Component for PulseCounterSource<'_> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.driver.init()?;
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        self.driver.start()?;
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.driver.stop()?;
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.driver.reset()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pulse-source"
    }
}

impl MeasurementSource for PulseCounterSource<'_> {
    fn is_measurement_available(&self) -> bool {
        self.driver.is_running()
    }

    fn get_measurement(&mut self) -> Measurement {
        let count = match self.mode {
            SampleMode::Cumulative => self.driver.read(),
            SampleMode::Windowed => self.driver.take(),
        };
        Measurement {
            source: self.device_id(),
            value: MeasurementValue::U32(count),
        }
    }
}
