//! Fuzz target: `config::decode_blob`
//!
//! Stored configuration blobs come from flash and may be torn or stale.
//! Decoding must never panic, and an accepted blob is always sanitized.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsemeter::config::decode_blob;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = decode_blob(data) {
        assert!((10..=10_000).contains(&cfg.tick_period_ms));
        assert!(cfg.keyboard.long_press_threshold_ticks >= 1);
        assert!(!cfg.recorder.sd_file_name.is_empty());
        assert_eq!(cfg.pulse.enabled_channels & !0b1111, 0);
    }
});
