//! Instrument configuration
//!
//! All tunable parameters for the PulseMeter firmware. The persisted form
//! is a postcard blob followed by its CRC-32 (little-endian); host
//! simulation profiles are JSON.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::device::keyboard::LONG_PRESS_THRESHOLD_TICKS;
use crate::device::pulse_counter_source::SampleMode;
use crate::device::sd_card_recorder::DEFAULT_FILE_NAME;
use crate::device::wifi_recorder::UART_TX_TIMEOUT_MS;
use crate::error::ConfigError;
use crate::link::crc32;

/// 8.3 file names fit in 12 bytes.
pub const FILE_NAME_MAX: usize = 12;

pub type FileName = heapless::String<FILE_NAME_MAX>;

/// Upper bound of an encoded configuration blob, CRC included.
pub const BLOB_MAX_LEN: usize = 64;

const CRC_LEN: usize = 4;

const TICK_PERIOD_MIN_MS: u32 = 10;
const TICK_PERIOD_MAX_MS: u32 = 10_000;
const UART_TIMEOUT_MAX_MS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Ticks a key must be held past the first one to count as a long press.
    pub long_press_threshold_ticks: u8,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            long_press_threshold_ticks: LONG_PRESS_THRESHOLD_TICKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub sd_enabled: bool,
    /// Log file on the SD card, opened in append mode.
    pub sd_file_name: FileName,
    pub wifi_enabled: bool,
    /// Bound on one WiFi frame transmission (milliseconds).
    pub uart_tx_timeout_ms: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let mut sd_file_name = FileName::new();
        // DEFAULT_FILE_NAME is shorter than FILE_NAME_MAX.
        let _ = sd_file_name.push_str(DEFAULT_FILE_NAME);
        Self {
            sd_enabled: true,
            sd_file_name,
            wifi_enabled: true,
            uart_tx_timeout_ms: UART_TX_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub sample_mode: SampleMode,
    /// Bit n enables pulse channel n.
    pub enabled_channels: u8,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            sample_mode: SampleMode::Cumulative,
            enabled_channels: 0b1111,
        }
    }
}

/// Core instrument configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub keyboard: KeyboardConfig,
    pub recorder: RecorderConfig,
    pub pulse: PulseConfig,
    /// Main loop period (milliseconds)
    pub tick_period_ms: u32,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            keyboard: KeyboardConfig::default(),
            recorder: RecorderConfig::default(),
            pulse: PulseConfig::default(),
            tick_period_ms: 100,
        }
    }
}

impl InstrumentConfig {
    /// Clamp out-of-range values loaded from storage or a profile.
    pub fn sanitize(&mut self) {
        let clamped = self.tick_period_ms.clamp(TICK_PERIOD_MIN_MS, TICK_PERIOD_MAX_MS);
        if clamped != self.tick_period_ms {
            warn!("config: tick_period_ms {} clamped to {}", self.tick_period_ms, clamped);
            self.tick_period_ms = clamped;
        }
        if self.keyboard.long_press_threshold_ticks == 0 {
            warn!("config: long press threshold 0, using 1");
            self.keyboard.long_press_threshold_ticks = 1;
        }
        let timeout = self.recorder.uart_tx_timeout_ms.clamp(1, UART_TIMEOUT_MAX_MS);
        if timeout != self.recorder.uart_tx_timeout_ms {
            warn!(
                "config: uart timeout {} clamped to {}",
                self.recorder.uart_tx_timeout_ms, timeout
            );
            self.recorder.uart_tx_timeout_ms = timeout;
        }
        if self.recorder.sd_file_name.is_empty() {
            warn!("config: empty SD file name, using {}", DEFAULT_FILE_NAME);
            self.recorder.sd_file_name = RecorderConfig::default().sd_file_name;
        }
        self.pulse.enabled_channels &= 0b1111;
    }

    pub fn channel_enabled(&self, index: usize) -> bool {
        index < 8 && self.pulse.enabled_channels & (1 << index) != 0
    }

    /// Parse a JSON profile; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut cfg: Self = serde_json::from_str(text).map_err(|_| ConfigError::Json)?;
        cfg.sanitize();
        Ok(cfg)
    }
}

// ── Persisted blob ────────────────────────────────────────────

/// Serialize `cfg` into `out` as `postcard || crc32_le`. Returns bytes used.
pub fn encode_blob(cfg: &InstrumentConfig, out: &mut [u8]) -> Result<usize, ConfigError> {
    let body_cap = out.len().checked_sub(CRC_LEN).ok_or(ConfigError::Encode)?;
    let used = postcard::to_slice(cfg, &mut out[..body_cap])
        .map_err(|_| ConfigError::Encode)?
        .len();
    let crc = crc32::compute(&out[..used]);
    out[used..used + CRC_LEN].copy_from_slice(&crc.to_le_bytes());
    Ok(used + CRC_LEN)
}

/// Verify and parse a blob produced by [`encode_blob`].
pub fn decode_blob(blob: &[u8]) -> Result<InstrumentConfig, ConfigError> {
    if blob.len() <= CRC_LEN {
        return Err(ConfigError::Corrupted);
    }
    let (body, tail) = blob.split_at(blob.len() - CRC_LEN);
    let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
    if crc32::compute(body) != stored {
        return Err(ConfigError::Corrupted);
    }
    let mut cfg: InstrumentConfig = postcard::from_bytes(body).map_err(|_| ConfigError::Decode)?;
    cfg.sanitize();
    Ok(cfg)
}
