//! Measurement coordinator: lifecycle and per-tick fan-out.
//!
//! ```text
//!   sources ──poll/get──▶ MeasurementCoordinator ──notify──▶ every recorder
//! ```
//!
//! ## Failure semantics
//!
//! - `initialize` / `start` / `stop` / `reset` run sources first, then
//!   recorders, and abort on the first member that fails. Members already
//!   handled keep their new state and nothing is rolled back; the error
//!   names the failing member and [`MeasurementCoordinator::source_states`] /
//!   [`MeasurementCoordinator::recorder_states`] expose the rest.
//! - `tick` is best effort: every recorder is notified of every
//!   measurement even if an earlier recorder failed.
//!
//! The coordinator only borrows its members; their owners must outlive it.

use core::fmt;

use heapless::Vec;
use log::{info, warn};

use crate::app::ports::{MeasurementRecorder, MeasurementSource};
use crate::error::{LifecycleError, RegistryError};
use crate::lifecycle::{Component, LifecycleState, Operation};

// ── Errors and reports ────────────────────────────────────────

/// Position of a member in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source(usize),
    Recorder(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(i) => write!(f, "source #{i}"),
            Self::Recorder(i) => write!(f, "recorder #{i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The coordinator itself is in the wrong state; no member was touched.
    InvalidState { op: Operation, state: LifecycleState },
    /// A member failed; members after it were not touched.
    Member {
        op: Operation,
        stage: Stage,
        error: LifecycleError,
    },
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { op, state } => write!(f, "{op} not allowed in state {state}"),
            Self::Member { op, stage, error } => write!(f, "{op} aborted at {stage}: {error}"),
        }
    }
}

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Measurements taken from sources.
    pub measurements: usize,
    /// Successful `notify` calls.
    pub deliveries: usize,
    /// Failed `notify` calls.
    pub failures: usize,
}

impl TickReport {
    /// Logical AND of every `notify` result this tick.
    pub fn all_ok(&self) -> bool {
        self.failures == 0
    }
}

/// Identifies a registered member for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberHandle(u16);

// ── Coordinator ───────────────────────────────────────────────

pub struct MeasurementCoordinator<'a, const S: usize, const R: usize> {
    sources: Vec<(MemberHandle, &'a mut dyn MeasurementSource), S>,
    recorders: Vec<(MemberHandle, &'a mut dyn MeasurementRecorder), R>,
    next_handle: u16,
    state: LifecycleState,
}

impl<'a, const S: usize, const R: usize> MeasurementCoordinator<'a, S, R> {
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
            recorders: Vec::new(),
            next_handle: 0,
            state: LifecycleState::Resetting,
        }
    }

    /// Build with a fixed member set. Exceeding `S` or `R` is a compile
    /// error.
    pub fn from_arrays<const N: usize, const M: usize>(
        sources: [&'a mut dyn MeasurementSource; N],
        recorders: [&'a mut dyn MeasurementRecorder; M],
    ) -> Self {
        const { assert!(N <= S && M <= R, "coordinator capacity exceeded") };
        let mut coordinator = Self::new();
        for source in sources {
            // Capacity checked at compile time above.
            let _ = coordinator.add_source(source);
        }
        for recorder in recorders {
            let _ = coordinator.add_recorder(recorder);
        }
        coordinator
    }

    fn allocate_handle(&mut self) -> MemberHandle {
        let handle = MemberHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        handle
    }

    // ── Registration ──────────────────────────────────────────

    pub fn add_source(
        &mut self,
        source: &'a mut dyn MeasurementSource,
    ) -> Result<MemberHandle, RegistryError> {
        if self.sources.is_full() {
            warn!("coordinator: source set full ({} of {})", self.sources.len(), S);
            return Err(RegistryError::Full);
        }
        let handle = self.allocate_handle();
        self.sources
            .push((handle, source))
            .map_err(|_| RegistryError::Full)?;
        Ok(handle)
    }

    pub fn add_recorder(
        &mut self,
        recorder: &'a mut dyn MeasurementRecorder,
    ) -> Result<MemberHandle, RegistryError> {
        if self.recorders.is_full() {
            warn!("coordinator: recorder set full ({} of {})", self.recorders.len(), R);
            return Err(RegistryError::Full);
        }
        let handle = self.allocate_handle();
        self.recorders
            .push((handle, recorder))
            .map_err(|_| RegistryError::Full)?;
        Ok(handle)
    }

    /// Unregister a source and hand its borrow back.
    pub fn remove_source(
        &mut self,
        handle: MemberHandle,
    ) -> Result<&'a mut dyn MeasurementSource, RegistryError> {
        let idx = self
            .sources
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or(RegistryError::NotRegistered)?;
        Ok(self.sources.remove(idx).1)
    }

    /// Unregister a recorder and hand its borrow back.
    pub fn remove_recorder(
        &mut self,
        handle: MemberHandle,
    ) -> Result<&'a mut dyn MeasurementRecorder, RegistryError> {
        let idx = self
            .recorders
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or(RegistryError::NotRegistered)?;
        Ok(self.recorders.remove(idx).1)
    }

    // ── Introspection ─────────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn recorder_count(&self) -> usize {
        self.recorders.len()
    }

    pub fn source_states(&self) -> impl Iterator<Item = LifecycleState> + '_ {
        self.sources.iter().map(|(_, s)| s.state())
    }

    pub fn recorder_states(&self) -> impl Iterator<Item = LifecycleState> + '_ {
        self.recorders.iter().map(|(_, r)| r.state())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn initialize(&mut self) -> Result<(), CoordinatorError> {
        self.fan_out(Operation::Init)
    }

    pub fn start(&mut self) -> Result<(), CoordinatorError> {
        self.fan_out(Operation::Start)
    }

    pub fn stop(&mut self) -> Result<(), CoordinatorError> {
        self.fan_out(Operation::Stop)
    }

    pub fn reset(&mut self) -> Result<(), CoordinatorError> {
        self.fan_out(Operation::Reset)
    }

    fn fan_out(&mut self, op: Operation) -> Result<(), CoordinatorError> {
        let state = self.state;
        if !op.is_legal_from(state) {
            warn!("coordinator: {} rejected in state {}", op, state);
            return Err(CoordinatorError::InvalidState { op, state });
        }

        for (i, (_, source)) in self.sources.iter_mut().enumerate() {
            apply(&mut **source, op).map_err(|error| abort(op, Stage::Source(i), error))?;
        }
        for (i, (_, recorder)) in self.recorders.iter_mut().enumerate() {
            apply(&mut **recorder, op).map_err(|error| abort(op, Stage::Recorder(i), error))?;
        }

        self.state = op.target(state);
        info!(
            "coordinator: {} ok ({} sources, {} recorders) -> {}",
            op,
            self.sources.len(),
            self.recorders.len(),
            self.state
        );
        Ok(())
    }

    // ── Tick ──────────────────────────────────────────────────

    /// Take at most one measurement from each available source and hand
    /// it to every recorder.
    pub fn tick(&mut self) -> Result<TickReport, CoordinatorError> {
        if !Operation::Tick.is_legal_from(self.state) {
            return Err(CoordinatorError::InvalidState {
                op: Operation::Tick,
                state: self.state,
            });
        }

        let mut report = TickReport::default();
        for (_, source) in self.sources.iter_mut() {
            source.poll();
            if !source.is_measurement_available() {
                continue;
            }
            let measurement = source.get_measurement();
            report.measurements += 1;

            for (i, (_, recorder)) in self.recorders.iter_mut().enumerate() {
                match recorder.notify(&measurement) {
                    Ok(()) => report.deliveries += 1,
                    Err(e) => {
                        report.failures += 1;
                        warn!(
                            "coordinator: recorder #{} ({}) dropped {:?}: {}",
                            i,
                            recorder.name(),
                            measurement.source,
                            e
                        );
                    }
                }
            }
        }
        Ok(report)
    }
}

impl<const S: usize, const R: usize> Default for MeasurementCoordinator<'_, S, R> {
    fn default() -> Self {
        Self::new()
    }
}

fn apply<C: Component + ?Sized>(member: &mut C, op: Operation) -> Result<(), LifecycleError> {
    match op {
        Operation::Init => member.init(),
        Operation::Start => member.start(),
        Operation::Stop => member.stop(),
        Operation::Reset => member.reset(),
        Operation::Tick => Ok(()),
    }
}

fn abort(op: Operation, stage: Stage, error: LifecycleError) -> CoordinatorError {
    warn!("coordinator: {} aborted at {}: {}", op, stage, error);
    CoordinatorError::Member { op, stage, error }
}
