//! Host simulation bridge: drivers whose I/O is supplied by callbacks.
//!
//! A PC simulator (or a test) registers closures on [`SimUart`] and
//! [`SimSdCard`] and drives [`SimKeyboardDriver`] directly; the measurement
//! pipeline sees the same port traits it sees on target.
//!
//! Missing callbacks:
//! - lifecycle callback: logged with `error!`, the operation succeeds.
//! - data callback: logged with `error!`, the operation fails
//!   (`SdCardError::InvalidParameter` / `UartError::Hal`).

use log::error;

use crate::app::ports::{FileMode, KeyId, KeyboardPort, RawKeyState, SdCardPort, UartId, UartPort};
use crate::error::{DeviceError, SdCardError, UartError};
use crate::lifecycle::{Component, HookResult, Operation, SlotKey, StateSlot};

// ── HAL status ────────────────────────────────────────────────

/// Status code returned by simulated serial callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalStatus {
    Ok,
    Error,
    Busy,
    Timeout,
}

impl HalStatus {
    pub fn into_result(self) -> Result<(), UartError> {
        match self {
            Self::Ok => Ok(()),
            Self::Error => Err(UartError::Hal),
            Self::Busy => Err(UartError::Busy),
            Self::Timeout => Err(UartError::Timeout),
        }
    }
}

// ── Lifecycle callbacks ───────────────────────────────────────

/// Returns `true` on success.
pub type LifecycleFn = Box<dyn FnMut() -> bool>;

#[derive(Default)]
struct LifecycleCallbacks {
    init: Option<LifecycleFn>,
    start: Option<LifecycleFn>,
    stop: Option<LifecycleFn>,
    reset: Option<LifecycleFn>,
}

impl LifecycleCallbacks {
    fn set(&mut self, op: Operation, f: LifecycleFn) {
        match op {
            Operation::Init => self.init = Some(f),
            Operation::Start => self.start = Some(f),
            Operation::Stop => self.stop = Some(f),
            Operation::Reset => self.reset = Some(f),
            Operation::Tick => error!("sim: no lifecycle callback slot for {}", op),
        }
    }

    fn run(&mut self, owner: &str, op: Operation) -> HookResult {
        let slot = match op {
            Operation::Init => &mut self.init,
            Operation::Start => &mut self.start,
            Operation::Stop => &mut self.stop,
            Operation::Reset => &mut self.reset,
            Operation::Tick => return Ok(()),
        };
        match slot {
            Some(f) => {
                if f() {
                    Ok(())
                } else {
                    Err(DeviceError::Backend("simulation callback reported failure"))
                }
            }
            None => {
                error!("sim: {} has no {} callback registered", owner, op);
                Ok(())
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// UART
// ───────────────────────────────────────────────────────────────

/// `(uart, bytes, timeout_ms)`
pub type SerialTxFn = Box<dyn FnMut(UartId, &[u8], u32) -> HalStatus>;

/// Fills the buffer and returns the byte count, or the failing status.
pub type SerialRxFn = Box<dyn FnMut(UartId, &mut [u8], u32) -> Result<usize, HalStatus>>;

pub struct SimUart {
    id: UartId,
    tx: Option<SerialTxFn>,
    rx: Option<SerialRxFn>,
    lifecycle: LifecycleCallbacks,
    slot: StateSlot,
}

impl SimUart {
    pub fn new(id: UartId) -> Self {
        Self {
            id,
            tx: None,
            rx: None,
            lifecycle: LifecycleCallbacks::default(),
            slot: StateSlot::new(),
        }
    }

    pub fn register_tx(&mut self, f: impl FnMut(UartId, &[u8], u32) -> HalStatus + 'static) {
        self.tx = Some(Box::new(f));
    }

    pub fn register_rx(
        &mut self,
        f: impl FnMut(UartId, &mut [u8], u32) -> Result<usize, HalStatus> + 'static,
    ) {
        self.rx = Some(Box::new(f));
    }

    pub fn register_lifecycle(&mut self, op: Operation, f: impl FnMut() -> bool + 'static) {
        self.lifecycle.set(op, Box::new(f));
    }
}

impl Component for SimUart {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.lifecycle.run("sim-uart", Operation::Init)
    }

    fn on_start(&mut self) -> HookResult {
        self.lifecycle.run("sim-uart", Operation::Start)
    }

    fn on_stop(&mut self) -> HookResult {
        self.lifecycle.run("sim-uart", Operation::Stop)
    }

    fn on_reset(&mut self) -> HookResult {
        self.lifecycle.run("sim-uart", Operation::Reset)
    }

    fn name(&self) -> &'static str {
        "sim-uart"
    }
}

impl UartPort for SimUart {
    fn id(&self) -> UartId {
        self.id
    }

    fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), UartError> {
        if !self.is_running() {
            return Err(UartError::NotRunning);
        }
        match self.tx.as_mut() {
            Some(f) => f(self.id, data, timeout_ms).into_result(),
            None => {
                error!("sim: {} has no transmit callback registered", self.id);
                Err(UartError::Hal)
            }
        }
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        if !self.is_running() {
            return Err(UartError::NotRunning);
        }
        match self.rx.as_mut() {
            Some(f) => match f(self.id, buf, timeout_ms) {
                Ok(n) => Ok(n.min(buf.len())),
                Err(status) => Err(status.into_result().err().unwrap_or(UartError::Unknown)),
            },
            None => {
                error!("sim: {} has no receive callback registered", self.id);
                Err(UartError::Hal)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SD card
// ───────────────────────────────────────────────────────────────

pub type OpenFn = Box<dyn FnMut(&str, FileMode) -> Result<(), SdCardError>>;
pub type WriteFn = Box<dyn FnMut(&[u8]) -> Result<(), SdCardError>>;
pub type CloseFn = Box<dyn FnMut() -> Result<(), SdCardError>>;

pub struct SimSdCard {
    open: Option<OpenFn>,
    write: Option<WriteFn>,
    close: Option<CloseFn>,
    lifecycle: LifecycleCallbacks,
    file_open: bool,
    slot: StateSlot,
}

impl SimSdCard {
    pub fn new() -> Self {
        Self {
            open: None,
            write: None,
            close: None,
            lifecycle: LifecycleCallbacks::default(),
            file_open: false,
            slot: StateSlot::new(),
        }
    }

    pub fn register_open(
        &mut self,
        f: impl FnMut(&str, FileMode) -> Result<(), SdCardError> + 'static,
    ) {
        self.open = Some(Box::new(f));
    }

    pub fn register_write(&mut self, f: impl FnMut(&[u8]) -> Result<(), SdCardError> + 'static) {
        self.write = Some(Box::new(f));
    }

    pub fn register_close(&mut self, f: impl FnMut() -> Result<(), SdCardError> + 'static) {
        self.close = Some(Box::new(f));
    }

    pub fn register_lifecycle(&mut self, op: Operation, f: impl FnMut() -> bool + 'static) {
        self.lifecycle.set(op, Box::new(f));
    }
}

impl Default for SimSdCard {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SimSdCard {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.lifecycle.run("sim-sd", Operation::Init)
    }

    fn on_start(&mut self) -> HookResult {
        self.lifecycle.run("sim-sd", Operation::Start)
    }

    fn on_stop(&mut self) -> HookResult {
        self.lifecycle.run("sim-sd", Operation::Stop)?;
        self.file_open = false;
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.lifecycle.run("sim-sd", Operation::Reset)?;
        self.file_open = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sim-sd"
    }
}

impl SdCardPort for SimSdCard {
    fn open_file(&mut self, name: &str, mode: FileMode) -> Result<(), SdCardError> {
        if !self.is_running() {
            return Err(SdCardError::FilesystemNotMounted);
        }
        if self.file_open {
            return Err(SdCardError::FileAlreadyOpen);
        }
        let Some(f) = self.open.as_mut() else {
            error!("sim: sd card has no open callback registered");
            return Err(SdCardError::InvalidParameter);
        };
        f(name, mode)?;
        self.file_open = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), SdCardError> {
        if !self.file_open {
            return Err(SdCardError::NoFileOpen);
        }
        match self.write.as_mut() {
            Some(f) => f(data),
            None => {
                error!("sim: sd card has no write callback registered");
                Err(SdCardError::InvalidParameter)
            }
        }
    }

    fn close_file(&mut self) -> Result<(), SdCardError> {
        if !self.file_open {
            return Err(SdCardError::NoFileOpen);
        }
        let Some(f) = self.close.as_mut() else {
            error!("sim: sd card has no close callback registered");
            return Err(SdCardError::InvalidParameter);
        };
        f()?;
        self.file_open = false;
        Ok(())
    }

    fn is_file_open(&self) -> bool {
        self.file_open
    }
}

// ───────────────────────────────────────────────────────────────
// Keyboard
// ───────────────────────────────────────────────────────────────

/// Keypad whose keys are pressed from the simulator UI.
pub struct SimKeyboardDriver {
    physical: [bool; KeyId::COUNT],
    levels: [RawKeyState; KeyId::COUNT],
    slot: StateSlot,
}

impl SimKeyboardDriver {
    pub const fn new() -> Self {
        Self {
            physical: [false; KeyId::COUNT],
            levels: [RawKeyState::NotOperational; KeyId::COUNT],
            slot: StateSlot::new(),
        }
    }

    pub fn press(&mut self, key: KeyId) {
        self.physical[key.index()] = true;
    }

    pub fn release(&mut self, key: KeyId) {
        self.physical[key.index()] = false;
    }
}

impl Default for SimKeyboardDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SimKeyboardDriver {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.levels = [RawKeyState::NotPressed; KeyId::COUNT];
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.levels = [RawKeyState::NotOperational; KeyId::COUNT];
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sim-keyboard"
    }
}

impl KeyboardPort for SimKeyboardDriver {
    fn sample(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        for (level, pressed) in self.levels.iter_mut().zip(self.physical) {
            *level = if pressed {
                RawKeyState::Pressed
            } else {
                RawKeyState::NotPressed
            };
        }
        true
    }

    fn raw_state(&self, key: KeyId) -> RawKeyState {
        if !self.is_running() {
            return RawKeyState::NotOperational;
        }
        self.levels[key.index()]
    }
}
