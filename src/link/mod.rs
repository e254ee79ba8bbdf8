//! Serial link framing for measurement telemetry.
//!
//! Wire format, one frame per measurement:
//! ```text
//! ┌───────────────────────────────────────────┬──────┐
//! │ COBS( DeviceId | Width | Value LE )       │ 0x00 │
//! └───────────────────────────────────────────┴──────┘
//! ```
//!
//! The link to the WiFi companion is an unstructured byte stream, so the
//! zero byte is the only reserved value: a receiver that loses sync scans
//! for the next `0x00` and starts over.

pub mod cobs;
pub mod crc32;
pub mod reassembler;
pub mod record;

pub use reassembler::FrameReassembler;
pub use record::{FRAME_MAX_LEN, MeasurementFramer, RECORD_MAX_LEN};
