//! Mock drivers, sources and recorders for integration tests.
//!
//! Every mock records what the pipeline did to it so tests can assert on
//! the full call history without touching real UART or SD hardware.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use pulsemeter::app::ports::{
    FileMode, MeasurementRecorder, MeasurementSource, SdCardPort, UartId, UartPort,
};
use pulsemeter::error::{DeviceError, SdCardError, UartError};
use pulsemeter::lifecycle::{Component, HookResult, Operation, SlotKey, StateSlot};
use pulsemeter::measurement::{DeviceId, Measurement, MeasurementValue};

// ── Shared journal ────────────────────────────────────────────

/// Ordered record of hook invocations across several mocks.
pub type Journal = Rc<RefCell<Vec<(&'static str, Operation)>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Hook bookkeeping shared by the member mocks.
#[derive(Default)]
struct Hooks {
    label: &'static str,
    journal: Option<Journal>,
    fail_on: Option<Operation>,
}

impl Hooks {
    fn run(&self, op: Operation) -> HookResult {
        if let Some(j) = &self.journal {
            j.borrow_mut().push((self.label, op));
        }
        if self.fail_on == Some(op) {
            return Err(DeviceError::Backend("injected hook failure"));
        }
        Ok(())
    }
}

macro_rules! component_via_hooks {
    ($ty:ty) => {
        impl Component for $ty {
            fn slot(&self) -> &StateSlot {
                &self.slot
            }
            fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
                &mut self.slot
            }
            fn on_init(&mut self) -> HookResult {
                self.hooks.run(Operation::Init)
            }
            fn on_start(&mut self) -> HookResult {
                self.hooks.run(Operation::Start)
            }
            fn on_stop(&mut self) -> HookResult {
                self.hooks.run(Operation::Stop)
            }
            fn on_reset(&mut self) -> HookResult {
                self.hooks.run(Operation::Reset)
            }
        }
    };
}

// ── MockSource ────────────────────────────────────────────────

pub struct MockSource {
    pub device: DeviceId,
    pub available: bool,
    pub value: MeasurementValue,
    pub taken: usize,
    hooks: Hooks,
    slot: StateSlot,
}

#[allow(dead_code)]
impl MockSource {
    pub fn new(label: &'static str, device: DeviceId, value: impl Into<MeasurementValue>) -> Self {
        Self {
            device,
            available: true,
            value: value.into(),
            taken: 0,
            hooks: Hooks {
                label,
                ..Hooks::default()
            },
            slot: StateSlot::new(),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing_on(mut self, op: Operation) -> Self {
        self.hooks.fail_on = Some(op);
        self
    }

    pub fn journaled(mut self, journal: &Journal) -> Self {
        self.hooks.journal = Some(journal.clone());
        self
    }
}

component_via_hooks!(MockSource);

impl MeasurementSource for MockSource {
    fn is_measurement_available(&self) -> bool {
        self.available
    }

    fn get_measurement(&mut self) -> Measurement {
        self.taken += 1;
        Measurement {
            source: self.device,
            value: self.value,
        }
    }
}

// ── MockRecorder ──────────────────────────────────────────────

pub struct MockRecorder {
    pub received: Vec<Measurement>,
    pub fail_notify: bool,
    hooks: Hooks,
    slot: StateSlot,
}

#[allow(dead_code)]
impl MockRecorder {
    pub fn new(label: &'static str) -> Self {
        Self {
            received: Vec::new(),
            fail_notify: false,
            hooks: Hooks {
                label,
                ..Hooks::default()
            },
            slot: StateSlot::new(),
        }
    }

    pub fn failing_notify(mut self) -> Self {
        self.fail_notify = true;
        self
    }

    pub fn failing_on(mut self, op: Operation) -> Self {
        self.hooks.fail_on = Some(op);
        self
    }

    pub fn journaled(mut self, journal: &Journal) -> Self {
        self.hooks.journal = Some(journal.clone());
        self
    }
}

component_via_hooks!(MockRecorder);

impl MeasurementRecorder for MockRecorder {
    fn notify(&mut self, measurement: &Measurement) -> Result<(), DeviceError> {
        // Attempts are recorded even when they fail.
        self.received.push(*measurement);
        if self.fail_notify {
            return Err(DeviceError::Backend("injected notify failure"));
        }
        Ok(())
    }
}

// ── MockUart ──────────────────────────────────────────────────

pub struct MockUart {
    id: UartId,
    pub sent: Vec<(Vec<u8>, u32)>,
    pub rx: VecDeque<u8>,
    pub tx_error: Option<UartError>,
    slot: StateSlot,
}

#[allow(dead_code)]
impl MockUart {
    pub fn new(id: UartId) -> Self {
        Self {
            id,
            sent: Vec::new(),
            rx: VecDeque::new(),
            tx_error: None,
            slot: StateSlot::new(),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl Component for MockUart {
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
}

impl UartPort for MockUart {
    fn id(&self) -> UartId {
        self.id
    }

    fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), UartError> {
        if !self.is_running() {
            return Err(UartError::NotRunning);
        }
        if let Some(e) = self.tx_error {
            return Err(e);
        }
        self.sent.push((data.to_vec(), timeout_ms));
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, UartError> {
        if !self.is_running() {
            return Err(UartError::NotRunning);
        }
        let n = buf.len().min(self.rx.len());
        for slot in buf.iter_mut().take(n) {
            if let Some(b) = self.rx.pop_front() {
                *slot = b;
            }
        }
        Ok(n)
    }
}

// ── MockSdCard ────────────────────────────────────────────────

pub struct MockSdCard {
    pub open_name: Option<String>,
    pub contents: Vec<u8>,
    pub write_calls: usize,
    pub fail_sync: bool,
    pub fail_open: bool,
    slot: StateSlot,
}

#[allow(dead_code)]
impl MockSdCard {
    pub fn new() -> Self {
        Self {
            open_name: None,
            contents: Vec::new(),
            write_calls: 0,
            fail_sync: false,
            fail_open: false,
            slot: StateSlot::new(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}

impl Default for MockSdCard {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for MockSdCard {
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
        self.open_name = None;
        Ok(())
    }
}

impl SdCardPort for MockSdCard {
    fn open_file(&mut self, name: &str, _mode: FileMode) -> Result<(), SdCardError> {
        if self.fail_open {
            return Err(SdCardError::FileOpenError);
        }
        if self.open_name.is_some() {
            return Err(SdCardError::FileAlreadyOpen);
        }
        self.open_name = Some(name.to_owned());
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), SdCardError> {
        if self.open_name.is_none() {
            return Err(SdCardError::NoFileOpen);
        }
        self.write_calls += 1;
        self.contents.extend_from_slice(data);
        if self.fail_sync {
            return Err(SdCardError::SyncError);
        }
        Ok(())
    }

    fn close_file(&mut self) -> Result<(), SdCardError> {
        self.open_name.take().map(|_| ()).ok_or(SdCardError::NoFileOpen)
    }

    fn is_file_open(&self) -> bool {
        self.open_name.is_some()
    }
}
