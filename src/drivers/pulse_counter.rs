//! Interrupt-fed pulse counter channels.
//!
//! Each BNC input raises a GPIO interrupt per detector pulse. The ISR
//! increments one `AtomicU32` slot in the process-wide [`PULSE_ARENA`];
//! the main loop reads the slot through a [`PulseCounterDriver`].
//!
//! Contract: the arena is the shared owner, each slot has a single writer
//! (its channel's interrupt) and the main loop only loads or zeroes it.
//! `Relaxed` ordering is enough because no other memory is published
//! through the counter.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::Error;
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};

/// Physical pulse input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PulseChannel {
    BncA = 0,
    BncB = 1,
    BncC = 2,
    BncD = 3,
}

impl PulseChannel {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [Self::BncA, Self::BncB, Self::BncC, Self::BncD];

    pub const fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::BncA),
            1 => Some(Self::BncB),
            2 => Some(Self::BncC),
            3 => Some(Self::BncD),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for PulseChannel {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        Self::from_index(raw).ok_or(Error::InvalidChannel(raw))
    }
}

// ── Arena ─────────────────────────────────────────────────────

/// Fixed array of pulse counts, one slot per channel.
pub struct PulseArena {
    slots: [AtomicU32; PulseChannel::COUNT],
}

impl PulseArena {
    pub const fn new() -> Self {
        Self {
            slots: [
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
        }
    }

    #[inline(always)]
    pub fn increment(&self, channel: PulseChannel) {
        self.slots[channel.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self, channel: PulseChannel) -> u32 {
        self.slots[channel.index()].load(Ordering::Relaxed)
    }

    pub fn clear(&self, channel: PulseChannel) {
        self.slots[channel.index()].store(0, Ordering::Relaxed);
    }

    /// Read and zero a slot in one atomic step, so a pulse landing between
    /// the two is never lost.
    pub fn take(&self, channel: PulseChannel) -> u32 {
        self.slots[channel.index()].swap(0, Ordering::Relaxed)
    }

    /// Overwrite a slot. Used by the host simulation to inject counts.
    pub fn set(&self, channel: PulseChannel, value: u32) {
        self.slots[channel.index()].store(value, Ordering::Relaxed);
    }
}

impl Default for PulseArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide arena serviced by the GPIO interrupts.
/// `static` because ISR callbacks cannot capture state.
pub static PULSE_ARENA: PulseArena = PulseArena::new();

/// Interrupt entry: one pulse on `channel`. O(1), no allocation.
#[inline(always)]
pub fn pulse_isr(channel: PulseChannel) {
    PULSE_ARENA.increment(channel);
}

/// Interrupt entry for vector tables that pass a raw channel number.
/// Numbers outside the arena are dropped.
pub extern "C" fn pulse_isr_raw(channel: u8) {
    if let Some(ch) = PulseChannel::from_index(channel) {
        PULSE_ARENA.increment(ch);
    }
}

// ── Driver ────────────────────────────────────────────────────

/// Lifecycle-managed view of one arena slot.
pub struct PulseCounterDriver<'a> {
    arena: &'a PulseArena,
    channel: PulseChannel,
    slot: StateSlot,
}

impl PulseCounterDriver<'static> {
    /// Driver over the interrupt-serviced arena.
    pub fn new(channel: PulseChannel) -> Self {
        Self::with_arena(&PULSE_ARENA, channel)
    }
}

impl<'a> PulseCounterDriver<'a> {
    pub fn with_arena(arena: &'a PulseArena, channel: PulseChannel) -> Self {
        Self {
            arena,
            channel,
            slot: StateSlot::new(),
        }
    }

    /// Construct from a raw channel number, rejecting out-of-range ids.
    pub fn from_raw(arena: &'a PulseArena, raw: u8) -> Result<Self, Error> {
        let channel = PulseChannel::try_from(raw)?;
        Ok(Self::with_arena(arena, channel))
    }

    pub fn channel(&self) -> PulseChannel {
        self.channel
    }

    /// Current count. Does not reset the slot.
    pub fn read(&self) -> u32 {
        self.arena.load(self.channel)
    }

    pub fn clear_measurement(&self) {
        self.arena.clear(self.channel);
    }

    /// Count since the last take, zeroing the slot atomically.
    pub fn take(&self) -> u32 {
        self.arena.take(self.channel)
    }
}

impl Component for PulseCounterDriver<'_> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.arena.clear(self.channel);
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        self.arena.clear(self.channel);
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pulse-counter"
    }
}
