//! Instrument service: keyboard and measurement pipeline on one tick.

use pulsemeter::adapters::sim_bridge::SimKeyboardDriver;
use pulsemeter::app::coordinator::{CoordinatorError, MeasurementCoordinator};
use pulsemeter::app::ports::KeyId;
use pulsemeter::app::service::{InstrumentService, KeyEventSink};
use pulsemeter::device::{CacheRecorder, KeyAction, Keyboard, PulseCounterSource, SampleMode};
use pulsemeter::drivers::{PulseArena, PulseChannel, PulseCounterDriver};
use pulsemeter::error::{Error, LifecycleError};
use pulsemeter::lifecycle::{Component, LifecycleState, Operation};
use pulsemeter::measurement::{DeviceId, MeasurementValue};

use crate::mock_hw::{MockRecorder, MockSource};

#[derive(Default)]
struct RecordingSink {
    events: Vec<(KeyId, KeyAction)>,
}

impl KeyEventSink for RecordingSink {
    fn on_key(&mut self, key: KeyId, action: KeyAction) {
        self.events.push((key, action));
    }
}

type Service<'a> = InstrumentService<'a, SimKeyboardDriver, 4, 2>;

#[test]
fn pulses_reach_the_recorders() {
    let arena = PulseArena::new();
    let mut bnc_a = PulseCounterSource::with_mode(
        PulseCounterDriver::with_arena(&arena, PulseChannel::BncA),
        SampleMode::Windowed,
    );
    let mut bnc_b =
        PulseCounterSource::new(PulseCounterDriver::with_arena(&arena, PulseChannel::BncB));
    let mut cache = CacheRecorder::new();
    let mut sink = RecordingSink::default();

    {
        let coordinator =
            MeasurementCoordinator::from_arrays([&mut bnc_a, &mut bnc_b], [&mut cache]);
        let mut service: Service<'_> =
            InstrumentService::new(Keyboard::new(SimKeyboardDriver::new()), coordinator);
        service.initialize().unwrap();
        service.start().unwrap();

        for _ in 0..3 {
            arena.increment(PulseChannel::BncA);
        }
        arena.increment(PulseChannel::BncB);
        let report = service.tick(&mut sink).unwrap();
        assert_eq!(report.measurements, 2);
        assert!(report.all_ok());

        // Windowed channel was cleared by the read; cumulative one was not.
        assert_eq!(arena.load(PulseChannel::BncA), 0);
        assert_eq!(arena.load(PulseChannel::BncB), 1);
        arena.increment(PulseChannel::BncB);
        service.tick(&mut sink).unwrap();
        assert_eq!(service.tick_count(), 2);
    }

    assert_eq!(cache.latest(DeviceId::PulseCounter1), Some(MeasurementValue::U32(0)));
    assert_eq!(cache.latest(DeviceId::PulseCounter2), Some(MeasurementValue::U32(2)));
    assert_eq!(cache.updates(), 4);
    assert!(sink.events.is_empty());
}

#[test]
fn key_presses_reach_the_sink() {
    let mut sink = RecordingSink::default();
    let coordinator: MeasurementCoordinator<'_, 4, 2> = MeasurementCoordinator::new();
    let mut service: Service<'_> =
        InstrumentService::new(Keyboard::with_threshold(SimKeyboardDriver::new(), 2), coordinator);
    service.initialize().unwrap();
    service.start().unwrap();

    // Long press on Up: held for three ticks.
    service.keyboard_mut().driver_mut().press(KeyId::Up);
    for _ in 0..3 {
        service.tick(&mut sink).unwrap();
    }
    assert_eq!(service.keyboard().key_state(KeyId::Up), KeyAction::PressHold);
    service.keyboard_mut().driver_mut().release(KeyId::Up);
    service.tick(&mut sink).unwrap();

    // Short press on Right: one tick.
    service.keyboard_mut().driver_mut().press(KeyId::Right);
    service.tick(&mut sink).unwrap();
    service.keyboard_mut().driver_mut().release(KeyId::Right);
    service.tick(&mut sink).unwrap();
    service.tick(&mut sink).unwrap();

    assert_eq!(
        sink.events,
        vec![(KeyId::Up, KeyAction::PressEndLong), (KeyId::Right, KeyAction::PressEndShort)]
    );
    assert_eq!(service.keyboard().key_state(KeyId::Right), KeyAction::NotPressed);
}

#[test]
fn tick_before_start_is_rejected() {
    let mut sink = RecordingSink::default();
    let coordinator: MeasurementCoordinator<'_, 4, 2> = MeasurementCoordinator::new();
    let mut service: Service<'_> =
        InstrumentService::new(Keyboard::new(SimKeyboardDriver::new()), coordinator);
    service.initialize().unwrap();

    assert_eq!(
        service.tick(&mut sink).unwrap_err(),
        Error::Coordinator(CoordinatorError::InvalidState {
            op: Operation::Tick,
            state: LifecycleState::Initialized,
        })
    );
}

#[test]
fn failing_recorder_is_reported_not_fatal() {
    let mut source = MockSource::new("s", DeviceId::PulseCounter4, 1u8);
    let mut bad = MockRecorder::new("bad").failing_notify();
    let mut good = MockRecorder::new("good");
    let mut sink = RecordingSink::default();
    {
        let coordinator = MeasurementCoordinator::from_arrays([&mut source], [&mut bad, &mut good]);
        let mut service: Service<'_> =
            InstrumentService::new(Keyboard::new(SimKeyboardDriver::new()), coordinator);
        service.initialize().unwrap();
        service.start().unwrap();
        let report = service.tick(&mut sink).unwrap();
        assert_eq!(report.failures, 1);
        service.stop().unwrap();
        service.reset().unwrap();
        assert_eq!(service.coordinator().state(), LifecycleState::Resetting);
    }
    assert_eq!(good.received.len(), 1);
}

#[test]
fn keyboard_stop_failure_is_returned_after_pipeline_stops() {
    let mut source = MockSource::new("s", DeviceId::PulseCounter1, 1u8);
    {
        let coordinator = MeasurementCoordinator::from_arrays([&mut source], []);
        let mut service: Service<'_> =
            InstrumentService::new(Keyboard::new(SimKeyboardDriver::new()), coordinator);
        service.initialize().unwrap();
        service.start().unwrap();
        service.keyboard_mut().stop().unwrap();

        assert_eq!(
            service.stop().unwrap_err(),
            Error::Lifecycle(LifecycleError::InvalidState {
                op: Operation::Stop,
                state: LifecycleState::Stopped,
            })
        );
        assert_eq!(service.coordinator().state(), LifecycleState::Stopped);
    }
    assert_eq!(source.state(), LifecycleState::Stopped);
}
