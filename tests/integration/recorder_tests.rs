//! Recorders and the UART source against mock drivers.

use pulsemeter::app::ports::{MeasurementRecorder, MeasurementSource, UartId};
use pulsemeter::device::{SdCardRecorder, UartSource, WiFiRecorder};
use pulsemeter::error::{DeviceError, SdCardError, UartError};
use pulsemeter::lifecycle::{Component, LifecycleState};
use pulsemeter::link::MeasurementFramer;
use pulsemeter::measurement::{DeviceId, Measurement, MeasurementValue};

use crate::mock_hw::{MockSdCard, MockUart};

type SdRecorder = SdCardRecorder<MockSdCard>;

fn started_sd(card: MockSdCard) -> SdRecorder {
    let mut rec = SdRecorder::new(card);
    rec.init().unwrap();
    rec.start().unwrap();
    rec
}

// ── SD card recorder ──────────────────────────────────────────

#[test]
fn sd_recorder_appends_one_line_per_measurement() {
    let mut rec = started_sd(MockSdCard::new());
    assert_eq!(rec.card().open_name.as_deref(), Some("DAT01.TXT"));

    rec.notify(&Measurement::new(DeviceId::PulseCounter1, 5u32)).unwrap();
    rec.notify(&Measurement::new(DeviceId::Uart1, 200u8)).unwrap();
    assert_eq!(rec.card().text(), "0,5\n4,200\n");
}

#[test]
fn sd_recorder_without_open_file_reports_no_file_open() {
    let mut card = MockSdCard::new();
    card.init().unwrap();
    let mut rec = SdRecorder::new(card);

    let err = rec.notify(&Measurement::new(DeviceId::PulseCounter2, 1u32)).unwrap_err();
    assert_eq!(err, DeviceError::SdCard(SdCardError::NoFileOpen));
    assert_eq!(rec.card().write_calls, 0);
    assert!(rec.card().contents.is_empty());
}

#[test]
fn sd_recorder_surfaces_sync_failure() {
    let mut card = MockSdCard::new();
    card.fail_sync = true;
    let mut rec = started_sd(card);

    let err = rec.notify(&Measurement::new(DeviceId::PulseCounter1, 1u32)).unwrap_err();
    assert_eq!(err, DeviceError::SdCard(SdCardError::SyncError));
}

#[test]
fn sd_recorder_start_fails_when_open_fails() {
    let mut card = MockSdCard::new();
    card.fail_open = true;
    let mut rec = SdRecorder::new(card);
    rec.init().unwrap();

    assert!(rec.start().is_err());
    assert_eq!(rec.state(), LifecycleState::Initialized);
    // The card itself came up; a retry only reopens the file.
    assert!(rec.card().is_running());
    rec.card_mut().fail_open = false;
    rec.start().unwrap();
    assert!(rec.card().open_name.is_some());
}

#[test]
fn sd_recorder_stop_closes_file() {
    let mut rec = started_sd(MockSdCard::new());
    rec.stop().unwrap();
    assert!(rec.card().open_name.is_none());
    assert_eq!(rec.card().state(), LifecycleState::Stopped);
}

// ── WiFi recorder ─────────────────────────────────────────────

fn started_wifi() -> WiFiRecorder<MockUart> {
    let mut rec = WiFiRecorder::new(MockUart::new(UartId::TransmitViaWifi));
    rec.init().unwrap();
    rec.start().unwrap();
    rec
}

#[test]
fn wifi_recorder_sends_one_cobs_frame() {
    let mut rec = started_wifi();
    rec.notify(&Measurement::new(DeviceId::PulseCounter1, 5u32)).unwrap();

    let (frame, timeout) = &rec.uart().sent[0];
    assert_eq!(frame, &[0x01, 0x03, 0x04, 0x05, 0x01, 0x01, 0x01, 0x00]);
    assert_eq!(*timeout, 1000);
    assert_eq!(frame.iter().filter(|&&b| b == 0).count(), 1);
}

#[test]
fn wifi_recorder_reports_transport_error() {
    let mut rec = started_wifi();
    rec.uart_mut().tx_error = Some(UartError::Timeout);
    let err = rec.notify(&Measurement::new(DeviceId::Uart1, 1u8)).unwrap_err();
    assert_eq!(err, DeviceError::Uart(UartError::Timeout));
    assert!(rec.uart().sent.is_empty());
}

#[test]
fn wifi_recorder_before_start_is_not_running() {
    let mut rec = WiFiRecorder::new(MockUart::new(UartId::TransmitViaWifi));
    let err = rec.notify(&Measurement::new(DeviceId::Uart1, 1u8)).unwrap_err();
    assert_eq!(err, DeviceError::Uart(UartError::NotRunning));
}

// ── UART source ───────────────────────────────────────────────

fn started_uart_source() -> UartSource<MockUart> {
    let mut src = UartSource::new(MockUart::new(UartId::MeasurementReceiver), DeviceId::Uart1);
    src.init().unwrap();
    src.start().unwrap();
    src
}

#[test]
fn uart_source_decodes_frames_one_per_poll() {
    let mut src = started_uart_source();
    let mut framer = MeasurementFramer::new();
    for v in [7u16, 300u16] {
        let frame = framer.frame(&Measurement::new(DeviceId::Uart1, v)).unwrap().to_vec();
        src.uart_mut().feed(&frame);
    }

    assert!(!src.is_measurement_available());
    src.poll();
    assert!(src.is_measurement_available());
    assert_eq!(src.get_measurement().value, MeasurementValue::U16(7));
    assert!(!src.is_measurement_available());

    src.poll();
    assert_eq!(src.get_measurement(), Measurement::new(DeviceId::Uart1, 300u16));
}

#[test]
fn uart_source_skips_garbage_and_resyncs() {
    let mut src = started_uart_source();
    let mut framer = MeasurementFramer::new();
    let frame = framer.frame(&Measurement::new(DeviceId::PulseCounter3, 42u8)).unwrap().to_vec();

    src.uart_mut().feed(&[0x05, 0xFF, 0x00]);
    src.uart_mut().feed(&frame);
    src.poll();

    let m = src.get_measurement();
    assert_eq!(m.source, DeviceId::Uart1, "measurements are attributed to the source");
    assert_eq!(m.value, MeasurementValue::U8(42));
}

#[test]
fn uart_source_with_partial_frame_waits() {
    let mut src = started_uart_source();
    let mut framer = MeasurementFramer::new();
    let frame = framer.frame(&Measurement::new(DeviceId::Uart1, 9u8)).unwrap().to_vec();
    let (head, tail) = frame.split_at(2);

    src.uart_mut().feed(head);
    src.poll();
    assert!(!src.is_measurement_available());

    src.uart_mut().feed(tail);
    src.poll();
    assert!(src.is_measurement_available());
}
