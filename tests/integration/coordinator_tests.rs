//! Measurement coordinator: lifecycle fan-out and per-tick delivery.

use pulsemeter::app::coordinator::{CoordinatorError, MeasurementCoordinator, Stage, TickReport};
use pulsemeter::error::LifecycleError;
use pulsemeter::lifecycle::{Component, LifecycleState, Operation};
use pulsemeter::measurement::{DeviceId, Measurement, MeasurementValue};

use crate::mock_hw::{MockRecorder, MockSource, journal};

type Coordinator<'a> = MeasurementCoordinator<'a, 4, 4>;

#[test]
fn tick_delivers_available_measurements_to_every_recorder() {
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 5u32);
    let mut s2 = MockSource::new("s2", DeviceId::PulseCounter2, 9u32).unavailable();
    let mut r1 = MockRecorder::new("r1");
    let mut r2 = MockRecorder::new("r2");

    {
        let mut c: Coordinator<'_> =
            MeasurementCoordinator::from_arrays([&mut s1, &mut s2], [&mut r1, &mut r2]);
        c.initialize().unwrap();
        c.start().unwrap();
        let report = c.tick().unwrap();
        assert_eq!(
            report,
            TickReport {
                measurements: 1,
                deliveries: 2,
                failures: 0
            }
        );
        assert!(report.all_ok());
    }

    let expected = Measurement::new(DeviceId::PulseCounter1, 5u32);
    assert_eq!(r1.received, vec![expected]);
    assert_eq!(r2.received, vec![expected]);
    assert_eq!(s2.taken, 0, "unavailable source must not be read");
}

#[test]
fn failing_recorder_does_not_starve_the_next() {
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 5u32);
    let mut s2 = MockSource::new("s2", DeviceId::PulseCounter2, 9u32).unavailable();
    let mut r1 = MockRecorder::new("r1").failing_notify();
    let mut r2 = MockRecorder::new("r2");

    let report = {
        let mut c: Coordinator<'_> =
            MeasurementCoordinator::from_arrays([&mut s1, &mut s2], [&mut r1, &mut r2]);
        c.initialize().unwrap();
        c.start().unwrap();
        c.tick().unwrap()
    };

    assert!(!report.all_ok());
    assert_eq!(report.failures, 1);
    assert_eq!(report.deliveries, 1);
    assert_eq!(r1.received.len(), 1, "failing recorder was still attempted");
    assert_eq!(r2.received, vec![Measurement::new(DeviceId::PulseCounter1, 5u32)]);
}

#[test]
fn every_source_is_delivered_in_registration_order() {
    let mut a = MockSource::new("a", DeviceId::PulseCounter3, 1u8);
    let mut b = MockSource::new("b", DeviceId::Uart1, 0x0102u16);
    let mut r = MockRecorder::new("r");
    {
        let mut c: Coordinator<'_> = MeasurementCoordinator::new();
        c.add_source(&mut a).unwrap();
        c.add_source(&mut b).unwrap();
        c.add_recorder(&mut r).unwrap();
        c.initialize().unwrap();
        c.start().unwrap();
        c.tick().unwrap();
        c.tick().unwrap();
    }
    let values: Vec<_> = r.received.iter().map(|m| m.value).collect();
    assert_eq!(
        values,
        vec![
            MeasurementValue::U8(1),
            MeasurementValue::U16(0x0102),
            MeasurementValue::U8(1),
            MeasurementValue::U16(0x0102),
        ]
    );
}

#[test]
fn lifecycle_runs_sources_then_recorders() {
    let j = journal();
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 0u8).journaled(&j);
    let mut s2 = MockSource::new("s2", DeviceId::PulseCounter2, 0u8).journaled(&j);
    let mut r1 = MockRecorder::new("r1").journaled(&j);

    let mut c: Coordinator<'_> = MeasurementCoordinator::from_arrays([&mut s1, &mut s2], [&mut r1]);
    c.initialize().unwrap();
    assert_eq!(
        *j.borrow(),
        vec![("s1", Operation::Init), ("s2", Operation::Init), ("r1", Operation::Init)]
    );
    assert_eq!(c.state(), LifecycleState::Initialized);
}

#[test]
fn start_aborts_at_first_failing_member() {
    let j = journal();
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 0u8).journaled(&j);
    let mut r1 = MockRecorder::new("r1").journaled(&j).failing_on(Operation::Start);
    let mut r2 = MockRecorder::new("r2").journaled(&j);

    {
        let mut c: Coordinator<'_> =
            MeasurementCoordinator::from_arrays([&mut s1], [&mut r1, &mut r2]);
        c.initialize().unwrap();
        j.borrow_mut().clear();

        let err = c.start().unwrap_err();
        match err {
            CoordinatorError::Member { op, stage, error } => {
                assert_eq!(op, Operation::Start);
                assert_eq!(stage, Stage::Recorder(0));
                assert!(matches!(error, LifecycleError::HookFailed { op: Operation::Start, .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }

        // No rollback: the source already started, r2 was never touched.
        let sources: Vec<_> = c.source_states().collect();
        let recorders: Vec<_> = c.recorder_states().collect();
        assert_eq!(sources, vec![LifecycleState::Running]);
        assert_eq!(recorders, vec![LifecycleState::Initialized, LifecycleState::Initialized]);
        assert_eq!(c.state(), LifecycleState::Initialized);
        assert!(c.tick().is_err(), "coordinator must not tick after a failed start");
    }

    assert_eq!(*j.borrow(), vec![("s1", Operation::Start), ("r1", Operation::Start)]);
}

#[test]
fn coordinator_precondition_checked_before_members() {
    let j = journal();
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 0u8).journaled(&j);
    let mut c: Coordinator<'_> = MeasurementCoordinator::from_arrays([&mut s1], []);

    assert_eq!(
        c.start(),
        Err(CoordinatorError::InvalidState {
            op: Operation::Start,
            state: LifecycleState::Resetting
        })
    );
    assert!(j.borrow().is_empty());
}

#[test]
fn full_cycle_returns_to_resetting() {
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 0u8);
    let mut r1 = MockRecorder::new("r1");
    {
        let mut c: Coordinator<'_> = MeasurementCoordinator::from_arrays([&mut s1], [&mut r1]);
        c.initialize().unwrap();
        c.start().unwrap();
        c.stop().unwrap();
        c.reset().unwrap();
        assert_eq!(c.state(), LifecycleState::Resetting);
        c.initialize().unwrap();
    }
    assert_eq!(s1.state(), LifecycleState::Initialized);
    assert_eq!(r1.state(), LifecycleState::Initialized);
}

#[test]
fn removed_recorder_stops_receiving() {
    let mut s1 = MockSource::new("s1", DeviceId::PulseCounter1, 3u8);
    let mut r1 = MockRecorder::new("r1");
    let mut r2 = MockRecorder::new("r2");
    {
        let mut c: Coordinator<'_> = MeasurementCoordinator::new();
        c.add_source(&mut s1).unwrap();
        let h1 = c.add_recorder(&mut r1).unwrap();
        c.add_recorder(&mut r2).unwrap();
        c.initialize().unwrap();
        c.start().unwrap();
        c.tick().unwrap();
        let removed = c.remove_recorder(h1).unwrap();
        assert_eq!(removed.state(), LifecycleState::Running);
        c.tick().unwrap();
    }
    assert_eq!(r1.received.len(), 1);
    assert_eq!(r2.received.len(), 2);
}
