//! Unified error types for the PulseMeter firmware.
//!
//! A single `Error` enum that every subsystem can convert into, plus the
//! small closed status sets each driver family reports. All variants are
//! `Copy` so they travel through the coordinator's fan-out and the lifecycle
//! guard without allocation.

use core::fmt;

use crate::app::coordinator::CoordinatorError;
use crate::lifecycle::{LifecycleState, Operation};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A lifecycle operation was rejected or its hook failed.
    Lifecycle(LifecycleError),
    /// The coordinator aborted a lifecycle fan-out.
    Coordinator(CoordinatorError),
    /// A driver, source or recorder reported a failure.
    Device(DeviceError),
    /// Observer registration was refused.
    Registry(RegistryError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Pulse-counter channel number outside the arena.
    InvalidChannel(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
            Self::Coordinator(e) => write!(f, "coordinator: {e}"),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::InvalidChannel(ch) => write!(f, "invalid pulse channel {ch}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// Operation called from a state that does not allow it. The hook was
    /// not invoked.
    InvalidState { op: Operation, state: LifecycleState },
    /// The component's hook ran and reported failure. State is unchanged.
    HookFailed { op: Operation, cause: DeviceError },
}

impl LifecycleError {
    pub const fn operation(&self) -> Operation {
        match self {
            Self::InvalidState { op, .. } | Self::HookFailed { op, .. } => *op,
        }
    }

    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { op, state } => write!(f, "{op} not allowed in state {state}"),
            Self::HookFailed { op, cause } => write!(f, "{op} hook failed: {cause}"),
        }
    }
}

impl std::error::Error for LifecycleError {}

impl From<LifecycleError> for Error {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ---------------------------------------------------------------------------
// Device errors (hook and notify outcomes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    Uart(UartError),
    SdCard(SdCardError),
    Codec(CodecError),
    /// A wrapped driver rejected the operation from its current state.
    Dependency { op: Operation, state: LifecycleState },
    /// A backend failed without a more specific status.
    Backend(&'static str),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uart(e) => write!(f, "uart: {e}"),
            Self::SdCard(e) => write!(f, "sd card: {e}"),
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Dependency { op, state } => write!(f, "driver refused {op} in state {state}"),
            Self::Backend(msg) => write!(f, "backend: {msg}"),
        }
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

/// A wrapped driver's hook failure surfaces as the driver's own status.
impl From<LifecycleError> for DeviceError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::InvalidState { op, state } => Self::Dependency { op, state },
            LifecycleError::HookFailed { cause, .. } => cause,
        }
    }
}

// ---------------------------------------------------------------------------
// UART status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    /// The HAL reported a generic error.
    Hal,
    /// Peripheral busy with a previous transfer.
    Busy,
    /// The transfer did not finish within the caller's timeout.
    Timeout,
    /// Driver is not in `Running`.
    NotRunning,
    Unknown,
}

impl fmt::Display for UartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hal => write!(f, "HAL error"),
            Self::Busy => write!(f, "busy"),
            Self::Timeout => write!(f, "timeout"),
            Self::NotRunning => write!(f, "driver not running"),
            Self::Unknown => write!(f, "unknown error"),
        }
    }
}

impl From<UartError> for DeviceError {
    fn from(e: UartError) -> Self {
        Self::Uart(e)
    }
}

// ---------------------------------------------------------------------------
// SD card status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdCardError {
    InvalidParameter,
    FilesystemNotMounted,
    FileAlreadyOpen,
    FileOpenError,
    NoFileOpen,
    WriteError,
    /// Fewer bytes reached the card than were handed over.
    IncompleteWrite,
    SyncError,
    FileCloseError,
}

impl fmt::Display for SdCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::FilesystemNotMounted => write!(f, "filesystem not mounted"),
            Self::FileAlreadyOpen => write!(f, "a file is already open"),
            Self::FileOpenError => write!(f, "file open failed"),
            Self::NoFileOpen => write!(f, "no file open"),
            Self::WriteError => write!(f, "write failed"),
            Self::IncompleteWrite => write!(f, "incomplete write"),
            Self::SyncError => write!(f, "sync failed"),
            Self::FileCloseError => write!(f, "file close failed"),
        }
    }
}

impl From<SdCardError> for DeviceError {
    fn from(e: SdCardError) -> Self {
        Self::SdCard(e)
    }
}

// ---------------------------------------------------------------------------
// Codec errors (text rendering, record serialization, COBS)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Output does not fit the fixed buffer.
    BufferTooSmall,
    /// Encoded frame lacks its trailing zero delimiter.
    MissingDelimiter,
    /// A zero byte appeared inside an encoded frame body.
    UnexpectedZero,
    /// A COBS code byte points past the end of the frame.
    Truncated,
    /// Record length does not match its width tag.
    BadLength,
    UnknownWidth(u8),
    UnknownDevice(u8),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::MissingDelimiter => write!(f, "missing frame delimiter"),
            Self::UnexpectedZero => write!(f, "zero byte inside frame"),
            Self::Truncated => write!(f, "truncated frame"),
            Self::BadLength => write!(f, "record length mismatch"),
            Self::UnknownWidth(w) => write!(f, "unknown width tag {w}"),
            Self::UnknownDevice(d) => write!(f, "unknown device id {d}"),
        }
    }
}

impl From<CodecError> for DeviceError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Capacity ceiling reached.
    Full,
    /// Handle does not name a registered member.
    NotRegistered,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "capacity reached"),
            Self::NotRegistered => write!(f, "not registered"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Serialization failed or the output buffer is too small.
    Encode,
    /// Blob passed the integrity check but did not deserialize.
    Decode,
    /// Blob too short or CRC mismatch.
    Corrupted,
    /// JSON profile could not be parsed.
    Json,
    /// The backing store (NVS) failed.
    Storage,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "encode failed"),
            Self::Decode => write!(f, "decode failed"),
            Self::Corrupted => write!(f, "blob corrupted"),
            Self::Json => write!(f, "invalid JSON profile"),
            Self::Storage => write!(f, "storage I/O failed"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CoordinatorError> for Error {
    fn from(e: CoordinatorError) -> Self {
        Self::Coordinator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
