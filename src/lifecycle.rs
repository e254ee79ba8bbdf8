//! Component lifecycle shared by every driver, source and recorder.
//!
//! ```text
//!             init()              start()
//!  Resetting ────────► Initialized ────────► Running
//!      ▲                    │                   │
//!      │      reset()       │                   │ stop()
//!      └────────────────────┴───── Stopped ◄────┘
//!                   reset()
//! ```
//!
//! Components implement the four `on_*` hooks and hand out their
//! [`StateSlot`]. Mutable access to the slot requires a [`SlotKey`], which
//! only this module can build, so the provided [`Component`] methods are
//! the only code that ever writes the slot: a call from the wrong state is rejected with
//! [`LifecycleError::InvalidState`] before the hook runs, and a failing hook
//! leaves the state where it was.

use core::fmt;

use log::{debug, warn};

use crate::error::{DeviceError, LifecycleError};

// ── States and operations ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Resetting,
    Initialized,
    Running,
    Stopped,
}

impl LifecycleState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Resetting => "Resetting",
            Self::Initialized => "Initialized",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Guarded operations. `Tick` is never run through the guard; it only
/// appears in errors raised by periodic services that require `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    Start,
    Stop,
    Reset,
    Tick,
}

impl Operation {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::Tick => "tick",
        }
    }

    /// Whether the operation may be invoked from `state`.
    pub const fn is_legal_from(self, state: LifecycleState) -> bool {
        use LifecycleState as S;
        matches!(
            (self, state),
            (Self::Init, S::Resetting)
                | (Self::Start, S::Initialized)
                | (Self::Stop | Self::Tick, S::Running)
                | (Self::Reset, S::Stopped | S::Initialized | S::Resetting)
        )
    }

    /// State entered once the hook succeeds.
    pub const fn target(self, from: LifecycleState) -> LifecycleState {
        match self {
            Self::Init => LifecycleState::Initialized,
            Self::Start => LifecycleState::Running,
            Self::Stop => LifecycleState::Stopped,
            Self::Reset => LifecycleState::Resetting,
            Self::Tick => from,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── State slot ────────────────────────────────────────────────

/// Storage for a component's lifecycle state.
#[derive(Debug, Default)]
pub struct StateSlot {
    state: LifecycleState,
}

impl StateSlot {
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Resetting,
        }
    }

    pub const fn get(&self) -> LifecycleState {
        self.state
    }
}

/// Capability passed to [`Component::slot_mut`]. Not constructible outside
/// this module, so the guarded operations are the only callers.
///
/// ```compile_fail
/// use pulsemeter::lifecycle::SlotKey;
/// let key = SlotKey { _private: () };
/// ```
#[derive(Debug)]
pub struct SlotKey {
    _private: (),
}

/// Outcome of a component hook.
pub type HookResult = Result<(), DeviceError>;

// ── Component trait ───────────────────────────────────────────

pub trait Component {
    fn slot(&self) -> &StateSlot;
    fn slot_mut(&mut self, key: SlotKey) -> &mut StateSlot;

    fn on_init(&mut self) -> HookResult;
    fn on_start(&mut self) -> HookResult;
    fn on_stop(&mut self) -> HookResult;

    fn on_reset(&mut self) -> HookResult {
        Ok(())
    }

    /// Short label used in log lines.
    fn name(&self) -> &'static str {
        "component"
    }

    fn state(&self) -> LifecycleState {
        self.slot().get()
    }

    fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    fn init(&mut self) -> Result<(), LifecycleError> {
        run_guarded(self, Operation::Init)
    }

    fn start(&mut self) -> Result<(), LifecycleError> {
        run_guarded(self, Operation::Start)
    }

    fn stop(&mut self) -> Result<(), LifecycleError> {
        run_guarded(self, Operation::Stop)
    }

    /// Return to `Resetting`. Resetting an already reset component is a
    /// no-op that does not call the hook.
    fn reset(&mut self) -> Result<(), LifecycleError> {
        run_guarded(self, Operation::Reset)
    }
}

fn run_guarded<C: Component + ?Sized>(
    component: &mut C,
    op: Operation,
) -> Result<(), LifecycleError> {
    let state = component.state();
    if !op.is_legal_from(state) {
        warn!("{}: {} rejected in state {}", component.name(), op, state);
        return Err(LifecycleError::InvalidState { op, state });
    }
    if op == Operation::Reset && state == LifecycleState::Resetting {
        return Ok(());
    }

    let outcome = match op {
        Operation::Init => component.on_init(),
        Operation::Start => component.on_start(),
        Operation::Stop => component.on_stop(),
        Operation::Reset => component.on_reset(),
        Operation::Tick => Ok(()),
    };

    match outcome {
        Ok(()) => {
            let next = op.target(state);
            component.slot_mut(SlotKey { _private: () }).state = next;
            debug!("{}: {} -> {}", component.name(), state, next);
            Ok(())
        }
        Err(cause) => {
            warn!("{}: {} hook failed: {}", component.name(), op, cause);
            Err(LifecycleError::HookFailed { op, cause })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────
