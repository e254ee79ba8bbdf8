//! GPIO assignments for the PulseMeter main board that are used through
//! raw ESP-IDF calls.
//!
//! Peripherals driven through `esp-idf-hal` (keypad, UARTs) take their
//! typed pins in `main.rs`; everything configured by
//! [`crate::drivers::hw_init`] is listed here.

use crate::drivers::pulse_counter::PulseChannel;

// ---------------------------------------------------------------------------
// BNC pulse inputs (open-collector detector outputs, pulled up)
// ---------------------------------------------------------------------------

pub const PULSE_BNC_A_GPIO: i32 = 4;
pub const PULSE_BNC_B_GPIO: i32 = 5;
pub const PULSE_BNC_C_GPIO: i32 = 6;
pub const PULSE_BNC_D_GPIO: i32 = 7;

/// Input pin of a pulse channel.
pub const fn pulse_gpio(channel: PulseChannel) -> i32 {
    match channel {
        PulseChannel::BncA => PULSE_BNC_A_GPIO,
        PulseChannel::BncB => PULSE_BNC_B_GPIO,
        PulseChannel::BncC => PULSE_BNC_C_GPIO,
        PulseChannel::BncD => PULSE_BNC_D_GPIO,
    }
}
