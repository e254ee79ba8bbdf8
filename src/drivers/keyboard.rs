//! Four-button keypad sampled through embedded-hal input pins.
//!
//! ## Hardware
//!
//! Active-low momentary switches with pull-ups, one GPIO per key in
//! [`KeyId`] order. The driver only latches levels; debouncing and
//! press classification live in [`crate::device::keyboard`].

use embedded_hal::digital::{Error as _, InputPin};
use log::debug;

use crate::app::ports::{KeyId, KeyboardPort, RawKeyState};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};

pub struct GpioKeyboardDriver<P> {
    pins: [P; KeyId::COUNT],
    levels: [RawKeyState; KeyId::COUNT],
    slot: StateSlot,
}

impl<P: InputPin> GpioKeyboardDriver<P> {
    /// `pins` are ordered Up, Down, Left, Right.
    pub fn new(pins: [P; KeyId::COUNT]) -> Self {
        Self {
            pins,
            levels: [RawKeyState::NotOperational; KeyId::COUNT],
            slot: StateSlot::new(),
        }
    }

    /// Give the pins back, e.g. to reconfigure them for deep sleep wake.
    pub fn release(self) -> [P; KeyId::COUNT] {
        self.pins
    }
}

impl<P: InputPin> Component for GpioKeyboardDriver<P> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.levels = [RawKeyState::NotPressed; KeyId::COUNT];
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.levels = [RawKeyState::NotOperational; KeyId::COUNT];
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gpio-keyboard"
    }
}

impl<P: InputPin> KeyboardPort for GpioKeyboardDriver<P> {
    fn sample(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        for (key, (pin, level)) in self.pins.iter_mut().zip(self.levels.iter_mut()).enumerate() {
            *level = match pin.is_low() {
                Ok(true) => RawKeyState::Pressed,
                Ok(false) => RawKeyState::NotPressed,
                Err(e) => {
                    debug!("keyboard: key {} read failed: {:?}", key, e.kind());
                    RawKeyState::NotOperational
                }
            };
        }
        true
    }

    fn raw_state(&self, key: KeyId) -> RawKeyState {
        if !self.is_running() {
            return RawKeyState::NotOperational;
        }
        self.levels[key.index()]
    }
}
