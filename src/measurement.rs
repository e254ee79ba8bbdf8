//! Measurement identity and value types.
//!
//! | Id | Channel          | Value width |
//! |----|------------------|-------------|
//! | 0  | Pulse counter 1  | u32         |
//! | 1  | Pulse counter 2  | u32         |
//! | 2  | Pulse counter 3  | u32         |
//! | 3  | Pulse counter 4  | u32         |
//! | 4  | UART receiver 1  | as received |
//!
//! Ids are contiguous from zero so they can index dense per-device arrays.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Measurement-producing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceId {
    PulseCounter1 = 0,
    PulseCounter2 = 1,
    PulseCounter3 = 2,
    PulseCounter4 = 3,
    Uart1 = 4,
}

impl DeviceId {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::PulseCounter1,
        Self::PulseCounter2,
        Self::PulseCounter3,
        Self::PulseCounter4,
        Self::Uart1,
    ];

    pub const fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::PulseCounter1),
            1 => Some(Self::PulseCounter2),
            2 => Some(Self::PulseCounter3),
            3 => Some(Self::PulseCounter4),
            4 => Some(Self::Uart1),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Integer payload of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementValue {
    U8(u8),
    U16(u16),
    U32(u32),
}

impl MeasurementValue {
    /// Width of the raw value in bytes.
    pub const fn width(self) -> u8 {
        match self {
            Self::U8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }

    pub const fn as_u32(self) -> u32 {
        match self {
            Self::U8(v) => v as u32,
            Self::U16(v) => v as u32,
            Self::U32(v) => v,
        }
    }
}

impl fmt::Display for MeasurementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl From<u8> for MeasurementValue {
    fn from(v: u8) -> Self {
        Self::U8(v)
    }
}

impl From<u16> for MeasurementValue {
    fn from(v: u16) -> Self {
        Self::U16(v)
    }
}

impl From<u32> for MeasurementValue {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub source: DeviceId,
    pub value: MeasurementValue,
}

impl Measurement {
    pub fn new(source: DeviceId, value: impl Into<MeasurementValue>) -> Self {
        Self {
            source,
            value: value.into(),
        }
    }
}
