//! Integration tests for the shelf orchestrator against the mock machine.
//!
//! Step counts below use `test_config()`: 100 steps per floor, so a
//! two-floor move is 200 nominal steps and a 10-step bias.

use crate::mock_hw::{Call, MockMachine, StatusLog, test_config};

use vlm::app::ports::{LiftMotor, Travel};
use vlm::error::{Error, MotionError, RequestError};
use vlm::identifier::CapturedIds;
use vlm::location::{BayLocation, LOADING_BAY};
use vlm::motion::lift::HomingOutcome;
use vlm::orchestrator::{CycleRequest, ReorderRequest, ShelfOrchestrator};

const TO_FRONT: (u16, u16) = (180, 0);
const TO_BACK: (u16, u16) = (0, 180);
const STOP: (u16, u16) = (90, 90);

fn loc(s: &str) -> BayLocation {
    s.parse().unwrap()
}

fn setup() -> (ShelfOrchestrator, MockMachine, StatusLog) {
    (
        ShelfOrchestrator::new(test_config()),
        MockMachine::new(),
        StatusLog::new(),
    )
}

// ── Cycle ─────────────────────────────────────────────────────

#[test]
fn single_floor_cycle_retrieves_scans_and_returns() {
    let (mut orch, mut hw, mut status) = setup();
    hw.queue_scans(&["04a1b2", "04c3d4"]);

    let req = CycleRequest::new(&[loc("F03")], &[2]).unwrap().capturing(10);
    let mut ids = CapturedIds::new();
    orch.cycle(&req, Some(&mut ids), &mut hw, &mut status).unwrap();

    let got: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
    assert_eq!(got, ["04a1b2", "04c3d4"]);

    // Pull-biased climb, push-biased descent, push-biased climb back.
    assert_eq!(hw.moves(), [190, -190, 210]);
    assert_eq!(
        hw.drives(),
        [TO_BACK, STOP, TO_FRONT, STOP, TO_BACK, STOP, TO_FRONT, STOP]
    );

    let stats = orch.stats();
    assert_eq!(stats.retrieves, 1);
    assert_eq!(stats.returns, 1);
    assert_eq!(stats.preloads, 0);
    assert_eq!(stats.ids_captured, 2);
    assert_eq!(orch.current_floor(), 3);
    assert_eq!(orch.at_bay(), loc("F03"));

    assert!(status.contains("Retrieving F03"));
    assert!(status.contains("Scan items: 2"));
    assert!(status.contains("Returning F03"));
}

#[test]
fn multi_floor_cycle_double_buffers() {
    let (mut orch, mut hw, mut status) = setup();
    hw.queue_scans(&["01", "02", "03"]);

    let floors = [loc("F03"), loc("B05"), loc("F07")];
    let req = CycleRequest::new(&floors, &[1, 1, 1]).unwrap();
    orch.cycle::<10>(&req, None, &mut hw, &mut status).unwrap();

    let stats = orch.stats();
    assert_eq!(stats.preloads, 2);
    assert_eq!(stats.buffer_swaps, 2);
    assert_eq!(stats.prefetches, 1);
    // Two preloads, two swaps, one prefetch.
    assert_eq!(stats.retrieves, 5);
    assert_eq!(stats.returns, 3);
    assert_eq!(stats.ids_captured, 3);

    assert_eq!(orch.current_floor(), 7);
    assert_eq!(orch.at_bay(), loc("F07"));
    assert!(hw.scans.is_empty());

    // Every floor was presented, in request order.
    let returns: Vec<&String> = status
        .lines
        .iter()
        .filter(|l| l.starts_with("Returning"))
        .collect();
    assert_eq!(returns, ["Returning F03", "Returning B05", "Returning F07"]);

    // Preload F03 and B05, swap the buffer forward, prefetch F07, swap
    // again.  Each storage shelf leaves its bay exactly once.
    let retrieves: Vec<&String> = status
        .lines
        .iter()
        .filter(|l| l.starts_with("Retrieving"))
        .collect();
    assert_eq!(
        retrieves,
        [
            "Retrieving F03",
            "Retrieving B05",
            "Retrieving B01",
            "Retrieving F07",
            "Retrieving B01",
        ]
    );
}

#[test]
fn two_floor_cycle_swaps_once_without_prefetch() {
    let (mut orch, mut hw, mut status) = setup();
    hw.queue_scans(&["01", "02"]);

    let req = CycleRequest::new(&[loc("B02"), loc("F04")], &[1, 1]).unwrap();
    orch.cycle::<10>(&req, None, &mut hw, &mut status).unwrap();

    let stats = orch.stats();
    assert_eq!(stats.buffer_swaps, 1);
    assert_eq!(stats.prefetches, 0);
    assert_eq!(stats.returns, 2);
}

#[test]
fn capture_stops_at_max_ids() {
    let (mut orch, mut hw, mut status) = setup();
    hw.queue_scans(&["01", "02", "03", "04", "05"]);

    let req = CycleRequest::new(&[loc("F02")], &[5]).unwrap().capturing(2);
    let mut ids = CapturedIds::new();
    orch.cycle(&req, Some(&mut ids), &mut hw, &mut status).unwrap();

    assert_eq!(ids.len(), 2);
    assert_eq!(hw.scans.len(), 3);
}

#[test]
fn scan_window_closes_without_items() {
    let mut cfg = test_config();
    cfg.scan_limit_ms = 50;
    let mut orch = ShelfOrchestrator::new(cfg);
    let (mut hw, mut status) = (MockMachine::new(), StatusLog::new());

    let req = CycleRequest::new(&[loc("F02")], &[3]).unwrap();
    orch.cycle::<10>(&req, None, &mut hw, &mut status).unwrap();

    assert_eq!(orch.stats().ids_captured, 0);
    assert!(hw.scan_polls >= 1);
    assert_eq!(orch.stats().returns, 1);
}

#[test]
fn zero_orders_skips_scanning() {
    let (mut orch, mut hw, mut status) = setup();
    hw.queue_scans(&["01"]);

    let req = CycleRequest::new(&[loc("F02")], &[0]).unwrap();
    orch.cycle::<10>(&req, None, &mut hw, &mut status).unwrap();

    assert_eq!(hw.scan_polls, 0);
    assert_eq!(hw.scans.len(), 1);
}

// ── Validation ────────────────────────────────────────────────

#[test]
fn staging_bay_is_refused_before_any_motion() {
    let (mut orch, mut hw, mut status) = setup();

    let req = CycleRequest::new(&[loc("B01")], &[1]).unwrap();
    let err = orch.cycle::<10>(&req, None, &mut hw, &mut status).unwrap_err();

    assert_eq!(err, Error::Request(RequestError::ReservedBay));
    assert!(hw.calls.is_empty());
}

#[test]
fn floor_above_count_is_refused() {
    let (mut orch, mut hw, mut status) = setup();

    let err = orch.restock(loc("F11"), &mut hw, &mut status).unwrap_err();
    assert_eq!(err, Error::Request(RequestError::FloorOutOfRange(11)));
    assert!(hw.calls.is_empty());
}

#[test]
fn mismatched_orders_are_refused() {
    let (mut orch, mut hw, mut status) = setup();

    let req = CycleRequest::new(&[loc("F02"), loc("F03")], &[1]).unwrap();
    let err = orch.cycle::<10>(&req, None, &mut hw, &mut status).unwrap_err();
    assert_eq!(
        err,
        Error::Request(RequestError::LengthMismatch {
            expected: 2,
            actual: 1
        })
    );
}

// ── Reorder / restock ─────────────────────────────────────────

#[test]
fn reorder_parks_at_loading_level_after_every_pair() {
    let (mut orch, mut hw, mut status) = setup();

    let req = ReorderRequest::new(&[loc("B04"), loc("F02")], &[loc("F06"), loc("B03")]).unwrap();
    orch.reorder(&req, &mut hw, &mut status).unwrap();

    // 1→4 pull, 4→6 push, park 6→1, then 1→2 pull, 2→3 push, park 3→1.
    assert_eq!(hw.moves(), [285, 210, -500, 95, 105, -200]);
    // Pull out of a back bay moves toward the front; push into a front bay
    // too.  The second pair runs the other way.
    assert_eq!(
        hw.drives(),
        [TO_FRONT, STOP, TO_FRONT, STOP, TO_BACK, STOP, TO_BACK, STOP]
    );
    assert_eq!(orch.stats().relocations, 2);
    assert_eq!(orch.current_floor(), LOADING_BAY.level);
    assert!(status.contains("Moving B04 to F06"));
    assert!(status.contains("Moving F02 to B03"));
}

#[test]
fn restock_at_current_floor_skips_the_first_move() {
    let (mut orch, mut hw, mut status) = setup();

    orch.restock(loc("F03"), &mut hw, &mut status).unwrap();
    assert_eq!(hw.moves(), [190, -190, 210]);

    orch.restock(loc("F03"), &mut hw, &mut status).unwrap();
    assert_eq!(hw.moves(), [190, -190, 210, -190, 210]);

    let stats = orch.stats();
    assert_eq!(stats.retrieves, 2);
    assert_eq!(stats.returns, 2);
    assert_eq!(orch.at_bay(), loc("F03"));
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn stall_aborts_and_commits_target_floor() {
    let mut orch = ShelfOrchestrator::new(test_config());
    let (mut hw, mut status) = (MockMachine::jammed(), StatusLog::new());

    let err = orch.restock(loc("F03"), &mut hw, &mut status).unwrap_err();

    assert_eq!(err, Error::Motion(MotionError::Stall { target: 3 }));
    assert_eq!(hw.count(&Call::Stop), 1);
    assert_eq!(orch.current_floor(), 3);
    // Aborted before the bay moved.
    assert!(hw.drives().is_empty());
    assert_eq!(orch.stats().retrieves, 0);
    // The long move kept the housekeeping going.
    assert!(hw.services > 0);
}

// ── Calibration ───────────────────────────────────────────────

#[test]
fn calibrate_finds_magnet_and_sets_origin() {
    let (mut orch, mut hw, mut status) = setup();
    hw.queue_magnet_after_settle(orch.config().hall_settle_samples);

    let outcome = orch.calibrate(&mut hw, &mut status);

    assert!(matches!(outcome, HomingOutcome::Found { .. }));
    assert_eq!(hw.calls.first(), Some(&Call::SetSpeed(orch.config().homing_speed)));
    assert!(hw.calls.contains(&Call::Jog(Travel::Down)));
    assert_eq!(&hw.calls[hw.calls.len() - 2..], [Call::Stop, Call::SetOrigin]);
    assert_eq!(orch.current_floor(), 1);
    assert_eq!(orch.at_bay(), LOADING_BAY);
    assert!(status.contains("Homing"));
    assert!(!status.contains("Homing timed out"));
}

#[test]
fn calibrate_without_magnet_times_out_at_bound() {
    let (mut orch, mut hw, mut status) = setup();
    let bound = orch.config().homing_max_steps;

    let outcome = orch.calibrate(&mut hw, &mut status);

    assert_eq!(outcome, HomingOutcome::TimedOut { travelled: bound });
    assert_eq!(hw.position(), 0);
    assert_eq!(orch.current_floor(), 1);
    assert!(status.contains("Homing timed out"));
}

// ── Manual ────────────────────────────────────────────────────

#[test]
fn manual_moves_leave_floor_alone() {
    let (mut orch, mut hw, _) = setup();

    orch.manual_vertical(250, false, &mut hw).unwrap();
    orch.manual_horizontal(40, 120, 60, &mut hw);

    assert_eq!(hw.moves(), [-250]);
    assert_eq!(hw.drives(), [(120, 60), STOP]);
    assert_eq!(orch.current_floor(), 1);
}
