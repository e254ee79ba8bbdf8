//! Measurement source fed by an external device over UART.
//!
//! The sender uses the same COBS record framing as the WiFi link. Each
//! coordinator tick `poll()` drains received bytes until one record is
//! decoded, reading at most [`MAX_RX_CHUNKS_PER_POLL`] chunks; that record
//! is held until `get_measurement()` takes it, and unread bytes stay in the
//! receive buffer for the next tick.

use log::warn;

use crate::app::ports::{MeasurementSource, UartPort};
use crate::lifecycle::{Component, HookResult, SlotKey, StateSlot};
use crate::link::{FRAME_MAX_LEN, FrameReassembler, RECORD_MAX_LEN, cobs, record};
use crate::measurement::{DeviceId, Measurement, MeasurementValue};

const RX_CHUNK: usize = 32;

/// Bound on UART reads per `poll()`, so a line full of noise cannot hold
/// up the tick.
pub const MAX_RX_CHUNKS_PER_POLL: usize = 4;

/// Frames are buffered without their delimiter.
const FRAME_BODY_MAX: usize = FRAME_MAX_LEN - 1;

pub struct UartSource<U> {
    uart: U,
    device: DeviceId,
    rx: [u8; RX_CHUNK],
    rx_len: usize,
    rx_pos: usize,
    reassembler: FrameReassembler<FRAME_BODY_MAX>,
    pending: Option<MeasurementValue>,
    last: MeasurementValue,
    slot: StateSlot,
}

impl<U: UartPort> UartSource<U> {
    pub fn new(uart: U, device: DeviceId) -> Self {
        Self {
            uart,
            device,
            rx: [0; RX_CHUNK],
            rx_len: 0,
            rx_pos: 0,
            reassembler: FrameReassembler::new(),
            pending: None,
            last: MeasurementValue::U8(0),
            slot: StateSlot::new(),
        }
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    fn discard_input(&mut self) {
        self.rx_len = 0;
        self.rx_pos = 0;
        self.reassembler.reset();
        self.pending = None;
    }

    /// Feed buffered bytes until one record decodes. True once a value
    /// is pending.
    fn drain_buffered(&mut self) -> bool {
        while self.rx_pos < self.rx_len {
            let byte = self.rx[self.rx_pos];
            self.rx_pos += 1;
            let Some(body) = self.reassembler.push(byte) else {
                continue;
            };
            let mut decoded = [0u8; RECORD_MAX_LEN];
            let parsed = cobs::decode_body(body, &mut decoded)
                .and_then(|n| record::deserialize(&decoded[..n]));
            match parsed {
                Ok(m) => {
                    self.pending = Some(m.value);
                    return true;
                }
                Err(e) => warn!("{}: dropped frame: {}", self.uart.id(), e),
            }
        }
        false
    }
}

impl<U: UartPort> Component for UartSource<U> {
    fn slot(&self) -> &StateSlot {
        &self.slot
    }

    fn slot_mut(&mut self, _: SlotKey) -> &mut StateSlot {
        &mut self.slot
    }

    fn on_init(&mut self) -> HookResult {
        self.uart.init()?;
        Ok(())
    }

    fn on_start(&mut self) -> HookResult {
        self.discard_input();
        self.uart.start()?;
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        self.uart.stop()?;
        self.discard_input();
        Ok(())
    }

    fn on_reset(&mut self) -> HookResult {
        self.discard_input();
        self.uart.reset()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "uart-source"
    }
}

impl<U: UartPort> MeasurementSource for UartSource<U> {
    fn poll(&mut self) {
        if self.pending.is_some() || !self.uart.is_running() {
            return;
        }
        for _ in 0..MAX_RX_CHUNKS_PER_POLL {
            if self.drain_buffered() {
                return;
            }
            match self.uart.receive(&mut self.rx, 0) {
                Ok(0) => return,
                Ok(n) => {
                    self.rx_len = n;
                    self.rx_pos = 0;
                }
                Err(e) => {
                    warn!("{}: receive failed: {}", self.uart.id(), e);
                    return;
                }
            }
        }
        // The last chunk read may still hold a complete record.
        self.drain_buffered();
    }

    fn is_measurement_available(&self) -> bool {
        self.pending.is_some() && self.uart.is_running()
    }

    /// Takes the pending value; repeats the last one if nothing is pending
    /// (`U8(0)` before the first record).
    fn get_measurement(&mut self) -> Measurement {
        if let Some(value) = self.pending.take() {
            self.last = value;
        }
        Measurement {
            source: self.device,
            value: self.last,
        }
    }
}
