//! Fuzz target: `cobs::decode` and `record::deserialize`
//!
//! Arbitrary frames must never panic the decoder, and anything it accepts
//! must re-encode to a frame that decodes to the same bytes.
//!
//! cargo fuzz run fuzz_cobs_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsemeter::link::{cobs, record};

fuzz_target!(|data: &[u8]| {
    let mut decoded = [0u8; 512];
    let Ok(n) = cobs::decode(data, &mut decoded) else {
        return;
    };

    let mut reencoded = [0u8; cobs::max_encoded_len(512)];
    let m = cobs::encode(&decoded[..n], &mut reencoded).expect("buffer sized for input");
    let mut again = [0u8; 512];
    let k = cobs::decode(&reencoded[..m], &mut again).expect("own encoding decodes");
    assert_eq!(&again[..k], &decoded[..n]);

    if let Ok(measurement) = record::deserialize(&decoded[..n]) {
        let mut buf = [0u8; record::RECORD_MAX_LEN];
        let len = record::serialize(&measurement, &mut buf).expect("record fits");
        assert_eq!(len, 2 + measurement.value.width() as usize);
    }
});
