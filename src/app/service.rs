//! Instrument service: keyboard and measurement pipeline on one tick.
//!
//! [`InstrumentService`] owns the debounced keyboard and the
//! [`MeasurementCoordinator`]. The main loop calls `initialize()` and
//! `start()` once, then `tick()` at the configured period.
//!
//! ```text
//!  KeyboardPort ──▶ ┌────────────────────────────┐ ──▶ KeyEventSink (HMI)
//!                   │      InstrumentService     │
//!       sources ──▶ │  Keyboard · Coordinator    │ ──▶ recorders
//!                   └────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::app::coordinator::{MeasurementCoordinator, TickReport};
use crate::app::ports::{KeyId, KeyboardPort};
use crate::device::keyboard::{KeyAction, Keyboard};
use crate::error::Result;
use crate::lifecycle::Component;

/// Consumer of completed key presses (the HMI on target).
pub trait KeyEventSink {
    fn on_key(&mut self, key: KeyId, action: KeyAction);
}

/// Sink that only logs key presses.
pub struct LogKeySink;

impl KeyEventSink for LogKeySink {
    fn on_key(&mut self, key: KeyId, action: KeyAction) {
        match action {
            KeyAction::PressEndLong => info!("[KEY] {:?} long press", key),
            _ => info!("[KEY] {:?} short press", key),
        }
    }
}

pub struct InstrumentService<'a, K, const S: usize, const R: usize> {
    keyboard: Keyboard<K>,
    coordinator: MeasurementCoordinator<'a, S, R>,
    tick_count: u64,
}

impl<'a, K: KeyboardPort, const S: usize, const R: usize> InstrumentService<'a, K, S, R> {
    pub fn new(keyboard: Keyboard<K>, coordinator: MeasurementCoordinator<'a, S, R>) -> Self {
        Self {
            keyboard,
            coordinator,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn initialize(&mut self) -> Result<()> {
        self.keyboard.init()?;
        self.coordinator.initialize()?;
        info!("InstrumentService initialized");
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.keyboard.start()?;
        self.coordinator.start()?;
        self.tick_count = 0;
        info!("InstrumentService running");
        Ok(())
    }

    /// Stops the measurement pipeline even if the keyboard refuses to
    /// stop; the keyboard error is returned afterwards.
    pub fn stop(&mut self) -> Result<()> {
        let keyboard = self.keyboard.stop();
        if let Err(e) = keyboard {
            warn!("keyboard stop failed: {}", e);
        }
        self.coordinator.stop()?;
        keyboard?;
        info!("InstrumentService stopped after {} ticks", self.tick_count);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.keyboard.reset()?;
        self.coordinator.reset()?;
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Debounce the keyboard, report finished presses, then fan out
    /// measurements.
    pub fn tick(&mut self, sink: &mut impl KeyEventSink) -> Result<TickReport> {
        self.tick_count += 1;

        if self.keyboard.tick() {
            for key in KeyId::ALL {
                let action = self.keyboard.key_state(key);
                if matches!(action, KeyAction::PressEndShort | KeyAction::PressEndLong) {
                    sink.on_key(key, action);
                }
            }
        } else {
            debug!("tick {}: keyboard not sampled", self.tick_count);
        }

        let report = self.coordinator.tick()?;
        if !report.all_ok() {
            warn!(
                "tick {}: {} of {} deliveries failed",
                self.tick_count,
                report.failures,
                report.failures + report.deliveries
            );
        }
        Ok(report)
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn keyboard(&self) -> &Keyboard<K> {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut Keyboard<K> {
        &mut self.keyboard
    }

    pub fn coordinator(&self) -> &MeasurementCoordinator<'a, S, R> {
        &self.coordinator
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
