//! Host simulation bridge wired into the real sources and recorders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use pulsemeter::adapters::sim_bridge::{HalStatus, SimSdCard, SimUart};
use pulsemeter::app::coordinator::MeasurementCoordinator;
use pulsemeter::app::ports::{FileMode, MeasurementRecorder, MeasurementSource, SdCardPort, UartId};
use pulsemeter::device::{SdCardRecorder, UartSource, WiFiRecorder};
use pulsemeter::error::{DeviceError, SdCardError, UartError};
use pulsemeter::lifecycle::{Component, LifecycleState, Operation};
use pulsemeter::link::{MeasurementFramer, cobs, record};
use pulsemeter::measurement::{DeviceId, Measurement, MeasurementValue};

fn recording_sd_card() -> (SimSdCard, Rc<RefCell<Vec<u8>>>, Rc<RefCell<Vec<String>>>) {
    let written = Rc::new(RefCell::new(Vec::new()));
    let opened = Rc::new(RefCell::new(Vec::new()));
    let mut card = SimSdCard::new();
    let o = opened.clone();
    card.register_open(move |name, mode| {
        assert_eq!(mode, FileMode::Append);
        o.borrow_mut().push(name.to_owned());
        Ok(())
    });
    let w = written.clone();
    card.register_write(move |data| {
        w.borrow_mut().extend_from_slice(data);
        Ok(())
    });
    card.register_close(|| Ok(()));
    (card, written, opened)
}

#[test]
fn sd_recorder_over_sim_card() {
    let (card, written, opened) = recording_sd_card();
    let mut rec: SdCardRecorder<SimSdCard> = SdCardRecorder::new(card);
    rec.init().unwrap();
    rec.start().unwrap();
    rec.notify(&Measurement::new(DeviceId::PulseCounter2, 17u32)).unwrap();
    rec.stop().unwrap();

    assert_eq!(*opened.borrow(), vec!["DAT01.TXT".to_owned()]);
    assert_eq!(&*written.borrow(), b"1,17\n");
    assert!(!rec.card().is_file_open());
}

#[test]
fn sim_card_write_failure_propagates() {
    let mut card = SimSdCard::new();
    card.register_open(|_, _| Ok(()));
    card.register_write(|_| Err(SdCardError::SyncError));
    let mut rec: SdCardRecorder<SimSdCard> = SdCardRecorder::new(card);
    rec.init().unwrap();
    rec.start().unwrap();
    assert_eq!(
        rec.notify(&Measurement::new(DeviceId::PulseCounter1, 1u8)),
        Err(DeviceError::SdCard(SdCardError::SyncError))
    );
}

#[test]
fn sim_card_without_open_callback_fails_start() {
    let mut rec: SdCardRecorder<SimSdCard> = SdCardRecorder::new(SimSdCard::new());
    rec.init().unwrap();
    assert!(rec.start().is_err());
    assert_eq!(rec.state(), LifecycleState::Initialized);
}

#[test]
fn wifi_frames_reach_serial_callback() {
    let frames: Rc<RefCell<Vec<(UartId, Vec<u8>, u32)>>> = Rc::new(RefCell::new(Vec::new()));
    let f = frames.clone();
    let mut uart = SimUart::new(UartId::TransmitViaWifi);
    uart.register_tx(move |id, data, timeout| {
        f.borrow_mut().push((id, data.to_vec(), timeout));
        HalStatus::Ok
    });

    let mut rec = WiFiRecorder::with_timeout(uart, 250);
    rec.init().unwrap();
    rec.start().unwrap();
    rec.notify(&Measurement::new(DeviceId::Uart1, 0x1234u16)).unwrap();

    let frames = frames.borrow();
    let (id, frame, timeout) = &frames[0];
    assert_eq!(*id, UartId::TransmitViaWifi);
    assert_eq!(*timeout, 250);

    let mut decoded = [0u8; record::RECORD_MAX_LEN];
    let n = cobs::decode(frame, &mut decoded).unwrap();
    assert_eq!(
        record::deserialize(&decoded[..n]).unwrap(),
        Measurement::new(DeviceId::Uart1, 0x1234u16)
    );
}

#[test]
fn serial_busy_maps_to_uart_error() {
    let mut uart = SimUart::new(UartId::TransmitViaWifi);
    uart.register_tx(|_, _, _| HalStatus::Busy);
    let mut rec = WiFiRecorder::new(uart);
    rec.init().unwrap();
    rec.start().unwrap();
    assert_eq!(
        rec.notify(&Measurement::new(DeviceId::Uart1, 1u8)),
        Err(DeviceError::Uart(UartError::Busy))
    );
}

#[test]
fn uart_source_reads_from_rx_callback() {
    let queue: Rc<RefCell<VecDeque<u8>>> = Rc::new(RefCell::new(VecDeque::new()));
    let mut framer = MeasurementFramer::new();
    queue
        .borrow_mut()
        .extend(framer.frame(&Measurement::new(DeviceId::Uart1, 99u8)).unwrap().iter().copied());

    let q = queue.clone();
    let mut uart = SimUart::new(UartId::MeasurementReceiver);
    uart.register_rx(move |_, buf, _| {
        let mut q = q.borrow_mut();
        let n = buf.len().min(q.len());
        for (dst, src) in buf.iter_mut().zip(q.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    });

    let mut src = UartSource::new(uart, DeviceId::Uart1);
    src.init().unwrap();
    src.start().unwrap();
    src.poll();
    assert!(src.is_measurement_available());
    assert_eq!(src.get_measurement().value, MeasurementValue::U8(99));
    assert!(queue.borrow().is_empty());
}

#[test]
fn failing_lifecycle_callback_aborts_coordinator_start() {
    let mut uart = SimUart::new(UartId::TransmitViaWifi);
    uart.register_lifecycle(Operation::Start, || false);
    let mut rec = WiFiRecorder::new(uart);
    {
        let mut c: MeasurementCoordinator<'_, 1, 1> =
            MeasurementCoordinator::from_arrays([], [&mut rec]);
        c.initialize().unwrap();
        assert!(c.start().is_err());
    }
    assert_eq!(rec.state(), LifecycleState::Initialized);
    assert_eq!(rec.uart().state(), LifecycleState::Initialized);
}
