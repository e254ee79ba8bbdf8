//! Port traits: the capability boundary between the measurement pipeline
//! and the hardware underneath it.
//!
//! ```text
//!   driver ──▶ port trait ──▶ source / recorder ──▶ MeasurementCoordinator
//! ```
//!
//! Every port is also a [`Component`], so the lifecycle guard is shared by
//! on-target drivers, host simulation drivers and test mocks alike. The
//! pipeline never names a concrete driver type.

use core::fmt;

use crate::error::{DeviceError, SdCardError, UartError};
use crate::lifecycle::Component;
use crate::measurement::Measurement;

// ───────────────────────────────────────────────────────────────
// UART port
// ───────────────────────────────────────────────────────────────

/// Logical UART assignment on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UartId {
    /// Input from an external measurement device.
    MeasurementReceiver = 0,
    /// Serial link to the WiFi companion module.
    TransmitViaWifi = 1,
    /// USB virtual COM port.
    TransmitViaUsb = 2,
}

impl UartId {
    pub const COUNT: usize = 3;
}

impl fmt::Display for UartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeasurementReceiver => write!(f, "uart-rx"),
            Self::TransmitViaWifi => write!(f, "uart-wifi"),
            Self::TransmitViaUsb => write!(f, "uart-usb"),
        }
    }
}

/// Byte-oriented serial channel with bounded waits.
pub trait UartPort: Component {
    fn id(&self) -> UartId;

    /// Send all of `data`, waiting at most `timeout_ms`.
    fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), UartError>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`.
    /// Returns the number of bytes read; 0 when nothing arrived.
    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError>;
}

// ───────────────────────────────────────────────────────────────
// SD card port
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Create if missing, keep existing contents, write at the end.
    Append,
    /// Create or truncate.
    Overwrite,
}

/// Single-file storage port. At most one file is open at a time.
pub trait SdCardPort: Component {
    fn open_file(&mut self, name: &str, mode: FileMode) -> Result<(), SdCardError>;

    /// Write all of `data` and sync it to the card before returning.
    fn write(&mut self, data: &[u8]) -> Result<(), SdCardError>;

    fn close_file(&mut self) -> Result<(), SdCardError>;

    fn is_file_open(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Keyboard port (raw samples)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyId {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl KeyId {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::Up),
            1 => Some(Self::Down),
            2 => Some(Self::Left),
            3 => Some(Self::Right),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Undebounced level of one key at the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKeyState {
    Pressed,
    NotPressed,
    /// The driver is not running or the line could not be read.
    NotOperational,
}

pub trait KeyboardPort: Component {
    /// Latch a new sample of every key. Returns false if not running.
    fn sample(&mut self) -> bool;

    fn raw_state(&self, key: KeyId) -> RawKeyState;
}

// ───────────────────────────────────────────────────────────────
// Measurement source / recorder capabilities
// ───────────────────────────────────────────────────────────────

/// Polled producer of measurements.
pub trait MeasurementSource: Component {
    /// Pull pending input from the underlying driver. Called once per
    /// coordinator tick before the availability check.
    fn poll(&mut self) {}

    /// Side-effect free; may be called without consuming.
    fn is_measurement_available(&self) -> bool;

    fn get_measurement(&mut self) -> Measurement;
}

/// Sink for measurements. A failed `notify` never blocks the next one.
pub trait MeasurementRecorder: Component {
    fn notify(&mut self, measurement: &Measurement) -> Result<(), DeviceError>;
}
