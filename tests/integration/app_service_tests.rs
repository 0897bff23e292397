//! Integration tests for the AppService → orchestrator → machine pipeline.
//!
//! These run on the host (x86_64) and verify the event and status traffic
//! around each command, without any real hardware.

use crate::mock_hw::{EventLog, MockMachine, StatusLog, test_config};

use vlm::app::commands::AppCommand;
use vlm::app::events::{AppEvent, OperationKind};
use vlm::app::service::{AppService, IDLE_BANNER};
use vlm::error::{Error, MotionError};
use vlm::location::BayLocation;
use vlm::orchestrator::CycleRequest;

fn make_app() -> (AppService, MockMachine, StatusLog, EventLog) {
    let mut app = AppService::new(test_config());
    let mut status = StatusLog::new();
    let mut events = EventLog::new();
    app.start(&mut status, &mut events);
    (app, MockMachine::new(), status, events)
}

fn loc(s: &str) -> BayLocation {
    s.parse().unwrap()
}

#[test]
fn start_publishes_banner_at_floor_one() {
    let (app, _, status, events) = make_app();
    assert_eq!(status.lines, [IDLE_BANNER]);
    assert_eq!(events.events, [AppEvent::Started { floor: 1 }]);
    assert_eq!(app.current_floor(), 1);
}

#[test]
fn restock_emits_started_and_completed() {
    let (mut app, mut hw, mut status, mut events) = make_app();

    let out = app
        .handle_command(AppCommand::Restock(loc("B04")), &mut hw, &mut status, &mut events)
        .unwrap();

    assert!(out.is_none());
    assert_eq!(
        &events.events[1..],
        [
            AppEvent::OperationStarted(OperationKind::Restock),
            AppEvent::OperationCompleted {
                kind: OperationKind::Restock,
                floor: 4
            },
        ]
    );
    assert_eq!(status.lines.last().map(String::as_str), Some(IDLE_BANNER));
    assert_eq!(app.operation_count(), 1);
}

#[test]
fn capturing_cycle_returns_identifiers() {
    let (mut app, mut hw, mut status, mut events) = make_app();
    hw.queue_scans(&["04a10f", "04a110", "04a111"]);

    let req = CycleRequest::new(&[loc("F02"), loc("B03")], &[2, 1])
        .unwrap()
        .capturing(10);
    let ids = app
        .handle_command(AppCommand::Cycle(req), &mut hw, &mut status, &mut events)
        .unwrap()
        .expect("capturing cycle returns ids");

    let got: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
    assert_eq!(got, ["04a10f", "04a110", "04a111"]);
    assert_eq!(app.stats().buffer_swaps, 1);
}

#[test]
fn non_capturing_cycle_returns_nothing() {
    let (mut app, mut hw, mut status, mut events) = make_app();
    hw.queue_scans(&["01"]);

    let req = CycleRequest::new(&[loc("F02")], &[1]).unwrap();
    let out = app
        .handle_command(AppCommand::Cycle(req), &mut hw, &mut status, &mut events)
        .unwrap();
    assert!(out.is_none());
    assert_eq!(app.stats().ids_captured, 1);
}

#[test]
fn stall_emits_failure_and_still_republishes_banner() {
    let (mut app, _, mut status, mut events) = make_app();
    let mut hw = MockMachine::jammed();

    let err = app
        .handle_command(AppCommand::Restock(loc("F05")), &mut hw, &mut status, &mut events)
        .unwrap_err();

    let stall = Error::Motion(MotionError::Stall { target: 5 });
    assert_eq!(err, stall);
    assert_eq!(
        events.events.last(),
        Some(&AppEvent::OperationFailed {
            kind: OperationKind::Restock,
            error: stall
        })
    );
    assert_eq!(status.lines.last().map(String::as_str), Some(IDLE_BANNER));
    assert_eq!(app.current_floor(), 5);
}

#[test]
fn calibrate_reports_homing_outcome() {
    let (mut app, mut hw, mut status, mut events) = make_app();
    hw.queue_magnet_after_settle(app.config().hall_settle_samples);

    app.handle_command(AppCommand::Calibrate, &mut hw, &mut status, &mut events)
        .unwrap();

    assert!(events
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::Homed { .. })));
    assert!(!events
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::HomingTimedOut { .. })));
}

#[test]
fn update_config_applies_between_operations() {
    let (mut app, mut hw, mut status, mut events) = make_app();

    let mut cfg = test_config();
    cfg.steps_per_floor = 200;
    app.handle_command(AppCommand::UpdateConfig(cfg), &mut hw, &mut status, &mut events)
        .unwrap();
    assert_eq!(app.config().steps_per_floor, 200);

    app.handle_command(AppCommand::Restock(loc("F02")), &mut hw, &mut status, &mut events)
        .unwrap();
    // 200 steps, pull-biased by 10.
    assert_eq!(hw.moves()[0], 190);
}

#[test]
fn invalid_config_is_rejected_and_old_one_kept() {
    let (mut app, mut hw, mut status, mut events) = make_app();

    let mut cfg = test_config();
    cfg.normal_speed = 0;
    let err = app
        .handle_command(AppCommand::UpdateConfig(cfg), &mut hw, &mut status, &mut events)
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(app.config(), &test_config());
    assert!(hw.calls.is_empty());
}

#[test]
fn manual_commands_do_not_move_the_floor_counter() {
    let (mut app, mut hw, mut status, mut events) = make_app();

    app.handle_command(
        AppCommand::ManualVertical {
            steps: 500,
            upward: true,
        },
        &mut hw,
        &mut status,
        &mut events,
    )
    .unwrap();
    app.handle_command(
        AppCommand::ManualHorizontal {
            duration_ms: 60,
            left: 0,
            right: 0,
        },
        &mut hw,
        &mut status,
        &mut events,
    )
    .unwrap();

    assert_eq!(hw.moves(), [500]);
    assert_eq!(app.current_floor(), 1);
    assert_eq!(app.operation_count(), 2);
}
