//! Per-key debounce and short/long press classification.
//!
//! Polled once per control tick on top of a raw [`KeyboardPort`].
//!
//! | Current            | raw = pressed            | raw = released          |
//! |--------------------|--------------------------|-------------------------|
//! | NotPressed         | PressStart (ticks = 0)   | NotPressed              |
//! | PressStart         | PressHold (ticks + 1)    | PressEndShort / Long    |
//! | PressHold          | PressHold (ticks + 1)    | PressEndShort / Long    |
//! | PressEndShort/Long | PressStart (ticks = 0)   | NotPressed              |
//!
//! A release with `ticks >= threshold` is a long press.

use crate::app::ports::{KeyId, KeyboardPort, RawKeyState};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};

pub const LONG_PRESS_THRESHOLD_TICKS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    NotPressed,
    PressStart,
    PressHold,
    PressEndShort,
    PressEndLong,
    /// Returned for an unknown key; never stored.
    Fail,
}

#[derive(Debug, Clone, Copy)]
struct KeyTracker {
    action: KeyAction,
    ticks: u8,
}

impl KeyTracker {
    const IDLE: Self = Self {
        action: KeyAction::NotPressed,
        ticks: 0,
    };

    fn step(&mut self, pressed: bool, threshold: u8) {
        use KeyAction as A;
        match (self.action, pressed) {
            (A::NotPressed | A::PressEndShort | A::PressEndLong, true) => {
                self.action = A::PressStart;
                self.ticks = 0;
            }
            (A::PressEndShort | A::PressEndLong, false) => self.action = A::NotPressed,
            (A::PressStart | A::PressHold, true) => {
                self.ticks = self.ticks.saturating_add(1);
                self.action = A::PressHold;
            }
            (A::PressStart | A::PressHold, false) => {
                self.action = if self.ticks >= threshold {
                    A::PressEndLong
                } else {
                    A::PressEndShort
                };
            }
            (A::NotPressed | A::Fail, false) | (A::Fail, true) => {}
        }
    }
}

pub struct Keyboard<K> {
    driver: K,
    keys: [KeyTracker; KeyId::COUNT],
    long_press_ticks: u8,
    slot: StateSlot,
}

impl<K: KeyboardPort> Keyboard<K> {
    pub fn new(driver: K) -> Self {
        Self::with_threshold(driver, LONG_PRESS_THRESHOLD_TICKS)
    }

    pub fn with_threshold(driver: K, long_press_ticks: u8) -> Self {
        Self {
            driver,
            keys: [KeyTracker::IDLE; KeyId::COUNT],
            long_press_ticks,
            slot: StateSlot::new(),
        }
    }

    /// Sample the raw driver and advance every key's state machine.
    /// Returns false, leaving all key states untouched, if the raw driver
    /// is not running.
    pub fn tick(&mut self) -> bool {
        if !self.driver.is_running() || !self.driver.sample() {
            return false;
        }
        for key in KeyId::ALL {
            let pressed = self.driver.raw_state(key) == RawKeyState::Pressed;
            self.keys[key.index()].step(pressed, self.long_press_ticks);
        }
        true
    }

    pub fn key_state(&self, key: KeyId) -> KeyAction {
        self.keys[key.index()].action
    }

    /// Lookup by raw index; anything past the last key is `Fail`.
    pub fn key_state_by_index(&self, index: usize) -> KeyAction {
        match KeyId::from_index(index) {
            Some(key) => self.key_state(key),
            None => KeyAction::Fail,
        }
    }

    pub fn driver(&self) -> &K {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut K {
        &mut self.driver
    }
}

impl<K: KeyboardPort> Component for Keyboard<K> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.keys = [KeyTracker::IDLE; KeyId::COUNT];
        self.driver.init()?;
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        self.driver.start()?;
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.driver.stop()?;
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.driver.reset()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "keyboard"
    }
}
