//! Binary measurement record and its COBS frame.
//!
//! ```text
//! ┌──────────┬───────────┬──────────────────────┐
//! │ DeviceId │ Width tag │ Value (1/2/4 B, LE)  │
//! │ 1 B      │ 1 B       │                      │
//! └──────────┴───────────┴──────────────────────┘
//! ```
//!
//! The width tag is the value's size in bytes. One record is COBS-encoded
//! per frame and terminated by a single `0x00`.

use crate::error::CodecError;
use crate::link::cobs;
use crate::measurement::{DeviceId, Measurement, MeasurementValue};

const HEADER_LEN: usize = 2;

/// Largest record: header plus a `u32` value.
pub const RECORD_MAX_LEN: usize = HEADER_LEN + 4;

/// Largest COBS frame produced for one record, delimiter included.
pub const FRAME_MAX_LEN: usize = cobs::max_encoded_len(RECORD_MAX_LEN);

/// Write the record for `m` into `out`. Returns the record length.
pub fn serialize(m: &Measurement, out: &mut [u8]) -> Result<usize, CodecError> {
    let width = m.value.width() as usize;
    let total = HEADER_LEN + width;
    let Some(record) = out.get_mut(..total) else {
        return Err(CodecError::BufferTooSmall);
    };

    record[0] = m.source as u8;
    record[1] = width as u8;
    let body = &mut record[HEADER_LEN..];
    match m.value {
        MeasurementValue::U8(v) => body.copy_from_slice(&v.to_le_bytes()),
        MeasurementValue::U16(v) => body.copy_from_slice(&v.to_le_bytes()),
        MeasurementValue::U32(v) => body.copy_from_slice(&v.to_le_bytes()),
    }
    Ok(total)
}

/// Parse one record. The slice must be exactly one record long.
pub fn deserialize(record: &[u8]) -> Result<Measurement, CodecError> {
    let [id, width, body @ ..] = record else {
        return Err(CodecError::BadLength);
    };
    let source = DeviceId::from_index(*id).ok_or(CodecError::UnknownDevice(*id))?;
    let width = *width;
    if !matches!(width, 1 | 2 | 4) {
        return Err(CodecError::UnknownWidth(width));
    }
    let value = match body {
        [b] if width == 1 => MeasurementValue::U8(*b),
        [b0, b1] if width == 2 => MeasurementValue::U16(u16::from_le_bytes([*b0, *b1])),
        [b0, b1, b2, b3] if width == 4 => {
            MeasurementValue::U32(u32::from_le_bytes([*b0, *b1, *b2, *b3]))
        }
        _ => return Err(CodecError::BadLength),
    };
    Ok(Measurement { source, value })
}

/// Fixed record and frame buffers reused for every measurement.
pub struct MeasurementFramer {
    record: [u8; RECORD_MAX_LEN],
    frame: [u8; FRAME_MAX_LEN],
}

impl MeasurementFramer {
    pub const fn new() -> Self {
        Self {
            record: [0; RECORD_MAX_LEN],
            frame: [0; FRAME_MAX_LEN],
        }
    }

    /// Serialize and COBS-encode `m`. The returned frame ends in `0x00`
    /// and stays valid until the next call.
    pub fn frame(&mut self, m: &Measurement) -> Result<&[u8], CodecError> {
        let len = serialize(m, &mut self.record)?;
        let n = cobs::encode(&self.record[..len], &mut self.frame)?;
        Ok(&self.frame[..n])
    }
}

impl Default for MeasurementFramer {
    fn default() -> Self {
        Self::new()
    }
}
