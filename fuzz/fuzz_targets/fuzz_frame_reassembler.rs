//! Fuzz target: `FrameReassembler::push`
//!
//! Feeds arbitrary byte streams through the receive-side reassembler and
//! checks that yielded frames are non-empty, zero-free and fit the buffer.
//!
//! cargo fuzz run fuzz_frame_reassembler

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsemeter::link::FrameReassembler;

fuzz_target!(|data: &[u8]| {
    let mut reassembler: FrameReassembler<16> = FrameReassembler::new();

    for &byte in data {
        if let Some(body) = reassembler.push(byte) {
            assert!(!body.is_empty(), "reassembler must not yield empty frames");
            assert!(body.len() <= 16, "frame exceeds buffer");
            assert!(!body.contains(&0), "delimiter leaked into frame body");
        }
        assert!(reassembler.pending() <= 16);
    }

    reassembler.reset();
    assert_eq!(reassembler.pending(), 0);
});
