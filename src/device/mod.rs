//! Measurement sources, recorders and the keyboard debouncer.
//!
//! Each type here owns its driver (through a port trait) and implements
//! only the lifecycle hooks plus its capability trait.

pub mod cache_recorder;
pub mod keyboard;
pub mod pulse_counter_source;
pub mod sd_card_recorder;
pub mod uart_recorder;
pub mod uart_source;
pub mod wifi_recorder;

pub use cache_recorder::CacheRecorder;
pub use keyboard::{KeyAction, Keyboard, LONG_PRESS_THRESHOLD_TICKS};
pub use pulse_counter_source::{PulseCounterSource, SampleMode};
pub use sd_card_recorder::SdCardRecorder;
pub use uart_recorder::UartRecorder;
pub use uart_source::UartSource;
pub use wifi_recorder::WiFiRecorder;
