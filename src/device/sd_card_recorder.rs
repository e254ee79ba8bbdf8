//! Text log of measurements on the SD card.
//!
//! One line per measurement, `<device id>,<value>\n`, appended to a single
//! file opened at `start()`. Every line is synced before `notify` returns.

use core::fmt::Write as _;

use heapless::String;
use log::warn;

use crate::app::ports::{FileMode, MeasurementRecorder, SdCardPort};
use crate::config::FileName;
use crate::error::{CodecError, DeviceError};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};
use crate::measurement::Measurement;

pub const DEFAULT_FILE_NAME: &str = "DAT01.TXT";

/// Default line buffer; a `u8` id and a `u32` value need at most 15 bytes.
pub const DEFAULT_LINE_CAPACITY: usize = 64;

pub struct SdCardRecorder<D, const N: usize = DEFAULT_LINE_CAPACITY> {
    card: D,
    file_name: FileName,
    slot: StateSlot,
}

impl<D: SdCardPort, const N: usize> SdCardRecorder<D, N> {
    pub fn new(card: D) -> Self {
        let mut file_name = FileName::new();
        let _ = file_name.push_str(DEFAULT_FILE_NAME);
        Self::with_file_name(card, file_name)
    }

    pub fn with_file_name(card: D, file_name: FileName) -> Self {
        Self {
            card,
            file_name,
            slot: StateSlot::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn card(&self) -> &D {
        &self.card
    }

    pub fn card_mut(&mut self) -> &mut D {
        &mut self.card
    }

    /// Render one line into a stack buffer. Fails rather than truncates.
    pub fn render(m: &Measurement) -> Result<String<N>, CodecError> {
        let mut line = String::<N>::new();
        writeln!(line, "{},{}", m.source as u8, m.value).map_err(|_| CodecError::BufferTooSmall)?;
        Ok(line)
    }
}

impl<D: SdCardPort, const N: usize> Component for SdCardRecorder<D, N> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.card.init()?;
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        // A failed open leaves the card running; a retry only reopens.
        if !self.card.is_running() {
            self.card.start()?;
        }
        self.card.open_file(&self.file_name, FileMode::Append)?;
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        if self.card.is_file_open() {
            self.card.close_file().inspect_err(|e| {
                warn!("sd-recorder: close of {} failed: {}", self.file_name, e);
            })?;
        }
        self.card.stop()?;
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.card.reset()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sd-recorder"
    }
}

impl<D: SdCardPort, const N: usize> MeasurementRecorder for SdCardRecorder<D, N> {
    fn notify(&mut self, measurement: &Measurement) -> Result<(), DeviceError> {
        let line = Self::render(measurement)?;
        self.card.write(line.as_bytes())?;
        Ok(())
    }
}
