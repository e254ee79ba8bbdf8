//! Hardware drivers and one-shot peripheral initialization.

pub mod hw_init;
pub mod keyboard;
pub mod pulse_counter;
pub mod watchdog;

pub use keyboard::GpioKeyboardDriver;
pub use pulse_counter::{PULSE_ARENA, PulseArena, PulseChannel, PulseCounterDriver};
